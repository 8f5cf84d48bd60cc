// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The process-launch seam and the convenience calls built on it.
//!
//! All launches go through a [`LaunchSeam`]. Outside any scope the seam holds
//! a [`RealLauncher`]; entering a scope swaps in the dispatcher's hook.

use crate::command::Invocation;
use crate::error::{FakeProcessError, Result};
use crate::options::{LaunchOptions, Stdio};
use crate::process::{AsyncProcessHandle, AsyncRealProcess, ProcessHandle, RealProcess, StreamData};
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Boxed future returned by [`Launcher::spawn_async`].
pub type LaunchFuture<'a> = Pin<Box<dyn Future<Output = Result<AsyncProcessHandle>> + Send + 'a>>;

/// Something that can start processes
pub trait Launcher: Send + Sync {
    fn popen(&self, invocation: Invocation, options: LaunchOptions) -> Result<ProcessHandle>;

    fn spawn_async(&self, invocation: Invocation, options: LaunchOptions) -> LaunchFuture<'_>;
}

/// Launches real operating-system processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct RealLauncher;

impl Launcher for RealLauncher {
    fn popen(&self, invocation: Invocation, options: LaunchOptions) -> Result<ProcessHandle> {
        RealProcess::spawn(invocation, &options).map(ProcessHandle::Real)
    }

    fn spawn_async(&self, invocation: Invocation, options: LaunchOptions) -> LaunchFuture<'_> {
        Box::pin(async move { AsyncRealProcess::spawn(invocation, &options).map(AsyncProcessHandle::Real) })
    }
}

/// Options for [`LaunchSeam::run`]
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub launch: LaunchOptions,
    pub input: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
    /// Fail with `CalledProcess` on a non-zero exit code
    pub check: bool,
    /// Pipe stdout and stderr
    pub capture_output: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launch(mut self, launch: LaunchOptions) -> Self {
        self.launch = launch;
        self
    }

    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }
}

/// Result of a completed [`LaunchSeam::run`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedProcess {
    pub args: Invocation,
    pub exit_code: i32,
    pub stdout: Option<StreamData>,
    pub stderr: Option<StreamData>,
}

impl CompletedProcess {
    /// Fail with `CalledProcess` when the exit code is non-zero.
    pub fn check_returncode(self) -> Result<Self> {
        if self.exit_code == 0 {
            return Ok(self);
        }
        Err(FakeProcessError::CalledProcess {
            command: self.args.to_string(),
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
        })
    }
}

/// Swappable slot holding the active launcher
pub struct LaunchSeam {
    current: RwLock<Arc<dyn Launcher>>,
}

impl LaunchSeam {
    pub fn new(launcher: Arc<dyn Launcher>) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(launcher),
        })
    }

    /// A seam over the real launcher.
    pub fn real() -> Arc<Self> {
        Self::new(Arc::new(RealLauncher))
    }

    /// The seam used by the free launch functions.
    pub fn global() -> &'static Arc<LaunchSeam> {
        static GLOBAL: OnceLock<Arc<LaunchSeam>> = OnceLock::new();
        GLOBAL.get_or_init(LaunchSeam::real)
    }

    pub fn current(&self) -> Arc<dyn Launcher> {
        Arc::clone(&self.current.read())
    }

    /// Install `launcher`, returning the one it replaced.
    pub fn install(&self, launcher: Arc<dyn Launcher>) -> Arc<dyn Launcher> {
        std::mem::replace(&mut *self.current.write(), launcher)
    }

    pub fn popen(&self, invocation: impl Into<Invocation>, options: LaunchOptions) -> Result<ProcessHandle> {
        let launcher = self.current();
        launcher.popen(invocation.into(), options)
    }

    /// Async launch of a shell command line.
    pub async fn create_subprocess_shell(
        &self,
        command: impl AsRef<[u8]>,
        options: LaunchOptions,
    ) -> Result<AsyncProcessHandle> {
        let line = decode(command.as_ref(), "cmd")?;
        if line.is_empty() {
            return Err(FakeProcessError::InvalidArgument(
                "cmd must be a non-empty string".to_string(),
            ));
        }
        options.check_async()?;
        let invocation = Invocation::shell(line);
        let launcher = self.current();
        launcher.spawn_async(invocation, options).await
    }

    /// Async launch of a program with separate arguments.
    pub async fn create_subprocess_exec<I, A>(
        &self,
        program: impl AsRef<[u8]>,
        args: I,
        options: LaunchOptions,
    ) -> Result<AsyncProcessHandle>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        let program = decode(program.as_ref(), "program")?;
        if program.is_empty() {
            return Err(FakeProcessError::InvalidArgument(
                "program must be a non-empty string".to_string(),
            ));
        }
        let mut argv = vec![program];
        for arg in args {
            argv.push(decode(arg.as_ref(), "args")?);
        }
        options.check_async()?;
        let invocation = Invocation::exec(argv);
        let launcher = self.current();
        launcher.spawn_async(invocation, options).await
    }

    /// Launch, feed input, wait and collect output.
    pub fn run(&self, invocation: impl Into<Invocation>, options: RunOptions) -> Result<CompletedProcess> {
        let mut launch = options.launch;
        if options.capture_output {
            launch.stdout = Stdio::Pipe;
            launch.stderr = Stdio::Pipe;
        }
        if options.input.is_some() && matches!(launch.stdin, Stdio::Inherit) {
            launch.stdin = Stdio::Pipe;
        }
        let mut process = self.popen(invocation, launch)?;
        let (stdout, stderr) = match process.communicate(options.input.as_deref(), options.timeout) {
            Ok(output) => output,
            Err(err) => {
                if err.is_timeout() {
                    if let Err(kill_err) = process.kill() {
                        tracing::debug!(error = %kill_err, "kill after timeout failed");
                    }
                }
                return Err(err);
            }
        };
        let exit_code = process
            .poll()?
            .ok_or_else(|| FakeProcessError::internal("process has no exit code after communicate"))?;
        let completed = CompletedProcess {
            args: process.args().clone(),
            exit_code,
            stdout,
            stderr,
        };
        if options.check {
            completed.check_returncode()
        } else {
            Ok(completed)
        }
    }

    /// Run and return the exit code.
    pub fn call(&self, invocation: impl Into<Invocation>, options: LaunchOptions) -> Result<i32> {
        self.run(invocation, RunOptions::new().launch(options))
            .map(|completed| completed.exit_code)
    }

    /// Run with stdout piped, failing on a non-zero exit code.
    pub fn check_output(
        &self,
        invocation: impl Into<Invocation>,
        options: LaunchOptions,
    ) -> Result<Option<StreamData>> {
        let options = options.stdout(Stdio::Pipe);
        self.run(invocation, RunOptions::new().launch(options).check(true))
            .map(|completed| completed.stdout)
    }
}

impl fmt::Debug for LaunchSeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchSeam").finish_non_exhaustive()
    }
}

fn decode(bytes: &[u8], what: &str) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| FakeProcessError::InvalidArgument(format!("{what} must be valid UTF-8")))
}

/// [`LaunchSeam::popen`] on the global seam.
pub fn popen(invocation: impl Into<Invocation>, options: LaunchOptions) -> Result<ProcessHandle> {
    LaunchSeam::global().popen(invocation, options)
}

/// [`LaunchSeam::run`] on the global seam.
pub fn run(invocation: impl Into<Invocation>, options: RunOptions) -> Result<CompletedProcess> {
    LaunchSeam::global().run(invocation, options)
}

/// [`LaunchSeam::call`] on the global seam.
pub fn call(invocation: impl Into<Invocation>, options: LaunchOptions) -> Result<i32> {
    LaunchSeam::global().call(invocation, options)
}

/// [`LaunchSeam::check_output`] on the global seam.
pub fn check_output(invocation: impl Into<Invocation>, options: LaunchOptions) -> Result<Option<StreamData>> {
    LaunchSeam::global().check_output(invocation, options)
}

/// [`LaunchSeam::create_subprocess_shell`] on the global seam.
pub async fn create_subprocess_shell(
    command: impl AsRef<[u8]>,
    options: LaunchOptions,
) -> Result<AsyncProcessHandle> {
    LaunchSeam::global().create_subprocess_shell(command, options).await
}

/// [`LaunchSeam::create_subprocess_exec`] on the global seam.
pub async fn create_subprocess_exec<I, A>(
    program: impl AsRef<[u8]>,
    args: I,
    options: LaunchOptions,
) -> Result<AsyncProcessHandle>
where
    I: IntoIterator<Item = A>,
    A: AsRef<[u8]>,
{
    LaunchSeam::global()
        .create_subprocess_exec(program, args, options)
        .await
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
