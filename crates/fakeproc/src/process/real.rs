// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real child processes for pass-through and unregistered launches.

use super::StreamData;
use crate::command::Invocation;
use crate::error::{FakeProcessError, Result};
use crate::options::{LaunchOptions, SharedWriter, Stdio};
use std::io::{Read, Write};
use std::process::{Child, ExitStatus};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Program and leading arguments for an invocation.
fn program_and_args(invocation: &Invocation) -> Result<(String, Vec<String>)> {
    if let Some(line) = invocation.shell_line() {
        return Ok(if cfg!(windows) {
            ("cmd".to_string(), vec!["/C".to_string(), line.to_string()])
        } else {
            ("sh".to_string(), vec!["-c".to_string(), line.to_string()])
        });
    }
    match invocation.args().split_first() {
        Some((program, args)) => Ok((program.clone(), args.to_vec())),
        None => Err(FakeProcessError::InvalidArgument(
            "cannot launch an empty command".to_string(),
        )),
    }
}

fn to_stdio(stdio: &Stdio, stream_is_output: bool) -> std::process::Stdio {
    match stdio {
        Stdio::Inherit => std::process::Stdio::inherit(),
        Stdio::Null => std::process::Stdio::null(),
        Stdio::Pipe | Stdio::Writer(_) => std::process::Stdio::piped(),
        Stdio::Stdout if stream_is_output => std::process::Stdio::piped(),
        Stdio::Stdout => std::process::Stdio::inherit(),
    }
}

/// Exit code, or the negated signal number when killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    status.code().unwrap_or(-1)
}

fn target(stdio: &Stdio) -> Option<SharedWriter> {
    match stdio {
        Stdio::Writer(writer) => Some(writer.clone()),
        _ => None,
    }
}

/// Route captured output: merge stderr, copy into writer targets.
struct OutputRouting {
    text_mode: bool,
    merge_stderr: bool,
    stdout_target: Option<SharedWriter>,
    stderr_target: Option<SharedWriter>,
}

impl OutputRouting {
    fn new(options: &LaunchOptions) -> Self {
        Self {
            text_mode: options.is_text_mode(),
            merge_stderr: matches!(options.stderr, Stdio::Stdout),
            stdout_target: target(&options.stdout),
            stderr_target: target(&options.stderr),
        }
    }

    fn route(
        &self,
        mut stdout: Option<Vec<u8>>,
        mut stderr: Option<Vec<u8>>,
    ) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>)> {
        // Ordering between the two streams is lost when merging.
        if self.merge_stderr {
            if let Some(err) = stderr.take() {
                stdout.get_or_insert_with(Vec::new).extend(err);
            }
        }
        if let Some(writer) = &self.stdout_target {
            if let Some(data) = stdout.take() {
                writer.lock().write_all(&data)?;
            }
        }
        if let Some(writer) = &self.stderr_target {
            if let Some(data) = stderr.take() {
                writer.lock().write_all(&data)?;
            }
        }
        Ok((stdout, stderr))
    }
}

/// A real child launched through `std::process`
#[derive(Debug)]
pub struct RealProcess {
    child: Child,
    invocation: Invocation,
    routing: OutputRouting,
}

impl std::fmt::Debug for OutputRouting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputRouting")
            .field("text_mode", &self.text_mode)
            .field("merge_stderr", &self.merge_stderr)
            .finish_non_exhaustive()
    }
}

impl RealProcess {
    pub(crate) fn spawn(invocation: Invocation, options: &LaunchOptions) -> Result<Self> {
        options.check_text_flags()?;
        let (program, args) = program_and_args(&invocation)?;
        let mut command = std::process::Command::new(&program);
        command
            .args(&args)
            .stdin(to_stdio(&options.stdin, false))
            .stdout(to_stdio(&options.stdout, true))
            .stderr(to_stdio(&options.stderr, true));
        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = &options.env {
            command.env_clear().envs(env);
        }
        let child = command.spawn()?;
        tracing::debug!(pid = child.id(), command = %invocation, "real process spawned");
        Ok(Self {
            child,
            invocation,
            routing: OutputRouting::new(options),
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn args(&self) -> &Invocation {
        &self.invocation
    }

    pub fn child(&mut self) -> &mut Child {
        &mut self.child
    }

    pub fn poll(&mut self) -> Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(exit_code))
    }

    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<i32> {
        let Some(timeout) = timeout else {
            return Ok(exit_code(self.child.wait()?));
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(exit_code(status));
            }
            if Instant::now() >= deadline {
                return Err(FakeProcessError::Timeout {
                    command: self.invocation.to_string(),
                    timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn communicate(
        &mut self,
        input: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<(Option<StreamData>, Option<StreamData>)> {
        let stdout = self.child.stdout.take().map(spawn_reader);
        let stderr = self.child.stderr.take().map(spawn_reader);
        let writer = self
            .child
            .stdin
            .take()
            .map(|stdin| spawn_writer(stdin, input.map(<[u8]>::to_vec)));
        self.wait(timeout)?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| FakeProcessError::internal("input writer thread panicked"))??;
        }
        let (stdout, stderr) = self
            .routing
            .route(join_reader(stdout)?, join_reader(stderr)?)?;
        let text_mode = self.routing.text_mode;
        Ok((
            stdout.map(|d| StreamData::from_bytes(d, text_mode)),
            stderr.map(|d| StreamData::from_bytes(d, text_mode)),
        ))
    }

    pub fn send_signal(&mut self, signal: i32) -> Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;
            let signal = Signal::try_from(signal).map_err(std::io::Error::from)?;
            kill(Pid::from_raw(self.child.id() as i32), signal).map_err(std::io::Error::from)?;
            Ok(())
        }
        #[cfg(not(unix))]
        {
            let _ = signal;
            self.child.kill()?;
            Ok(())
        }
    }

    pub fn terminate(&mut self) -> Result<()> {
        self.send_signal(super::signals::SIGTERM)
    }

    pub fn kill(&mut self) -> Result<()> {
        self.child.kill()?;
        Ok(())
    }
}

/// A child that exits without draining stdin is not an error.
fn ignore_broken_pipe(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Feeds `input` on its own thread; stdin closes when the thread ends.
fn spawn_writer(
    mut stdin: std::process::ChildStdin,
    input: Option<Vec<u8>>,
) -> JoinHandle<std::io::Result<()>> {
    std::thread::spawn(move || match input {
        Some(input) => ignore_broken_pipe(stdin.write_all(&input)),
        None => Ok(()),
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Option<Vec<u8>>> {
    match reader {
        None => Ok(None),
        Some(handle) => handle
            .join()
            .map_err(|_| FakeProcessError::internal("output reader thread panicked"))?
            .map(Some)
            .map_err(FakeProcessError::from),
    }
}

/// A real child launched through `tokio::process`
#[derive(Debug)]
pub struct AsyncRealProcess {
    child: tokio::process::Child,
    invocation: Invocation,
    routing: OutputRouting,
}

impl AsyncRealProcess {
    pub(crate) fn spawn(invocation: Invocation, options: &LaunchOptions) -> Result<Self> {
        let (program, args) = program_and_args(&invocation)?;
        let mut command = tokio::process::Command::new(&program);
        command
            .args(&args)
            .stdin(to_stdio(&options.stdin, false))
            .stdout(to_stdio(&options.stdout, true))
            .stderr(to_stdio(&options.stderr, true));
        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = &options.env {
            command.env_clear().envs(env);
        }
        let child = command.spawn()?;
        tracing::debug!(pid = ?child.id(), command = %invocation, "real async process spawned");
        Ok(Self {
            child,
            invocation,
            routing: OutputRouting::new(options),
        })
    }

    /// `None` once the child has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn args(&self) -> &Invocation {
        &self.invocation
    }

    pub fn child(&mut self) -> &mut tokio::process::Child {
        &mut self.child
    }

    pub fn returncode(&mut self) -> Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(exit_code))
    }

    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<i32> {
        let status = match timeout {
            None => self.child.wait().await?,
            Some(timeout) => tokio::time::timeout(timeout, self.child.wait())
                .await
                .map_err(|_| FakeProcessError::Timeout {
                    command: self.invocation.to_string(),
                    timeout,
                })??,
        };
        Ok(exit_code(status))
    }

    pub async fn communicate(
        &mut self,
        input: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>)> {
        let stdin = self.child.stdin.take();
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();
        let exchange = async {
            let ((), stdout, stderr) = tokio::try_join!(
                write_optional(stdin, input),
                read_optional(stdout),
                read_optional(stderr)
            )?;
            Ok::<_, std::io::Error>((stdout, stderr))
        };
        let (stdout, stderr) = match timeout {
            None => exchange.await?,
            Some(timeout) => tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| FakeProcessError::Timeout {
                    command: self.invocation.to_string(),
                    timeout,
                })??,
        };
        self.wait(timeout).await?;
        self.routing.route(stdout, stderr)
    }

    pub fn send_signal(&mut self, signal: i32) -> Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;
            let Some(pid) = self.child.id() else {
                return Ok(());
            };
            let signal = Signal::try_from(signal).map_err(std::io::Error::from)?;
            kill(Pid::from_raw(pid as i32), signal).map_err(std::io::Error::from)?;
            Ok(())
        }
        #[cfg(not(unix))]
        {
            let _ = signal;
            self.child.start_kill()?;
            Ok(())
        }
    }

    pub fn terminate(&mut self) -> Result<()> {
        self.send_signal(super::signals::SIGTERM)
    }

    pub fn kill(&mut self) -> Result<()> {
        self.child.start_kill()?;
        Ok(())
    }
}

async fn write_optional(
    stdin: Option<tokio::process::ChildStdin>,
    input: Option<&[u8]>,
) -> std::io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    if let Some(input) = input {
        ignore_broken_pipe(stdin.write_all(input).await)?;
    }
    ignore_broken_pipe(stdin.shutdown().await)
}

async fn read_optional<R>(source: Option<R>) -> std::io::Result<Option<Vec<u8>>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match source {
        None => Ok(None),
        Some(mut source) => {
            let mut buf = Vec::new();
            source.read_to_end(&mut buf).await?;
            Ok(Some(buf))
        }
    }
}
