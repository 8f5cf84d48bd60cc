// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The simulated process handed out in place of a real child.

use super::buffer::{normalize_newlines, Pipe, PipeReader, StreamReader, LINE_SEPARATOR};
use super::worker::Worker;
use super::{signals, StreamData};
use crate::command::{Command, Invocation};
use crate::definition::{OutputSpec, ProcessDefinition, QueuedDefinition};
use crate::error::{FakeProcessError, Result};
use crate::options::{LaunchOptions, SharedWriter, Stdio};
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Which launch surface created the process
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Flavor {
    #[default]
    Sync,
    Async,
}

impl Flavor {
    fn new_pipe(self) -> Pipe {
        match self {
            Self::Sync => Pipe::Memory(PipeReader::new()),
            Self::Async => Pipe::Stream(StreamReader::new()),
        }
    }
}

#[derive(Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Default)]
struct ProcessState {
    exit_code: Option<i32>,
    remaining_delay: Option<Duration>,
    text_mode: bool,
    universal_newlines: bool,
    stdout: Option<Pipe>,
    stderr: Option<Pipe>,
    sealed: bool,
    signals: Vec<i32>,
}

impl ProcessState {
    fn render(&self, spec: &OutputSpec) -> Vec<u8> {
        let data = spec.render(LINE_SEPARATOR.as_bytes());
        if self.universal_newlines {
            normalize_newlines(data)
        } else {
            data
        }
    }

    /// Append to a stream, creating its pipe when absent.
    fn append(&mut self, flavor: Flavor, kind: StreamKind, spec: &OutputSpec) -> Result<()> {
        let data = self.render(spec);
        let sealed = self.sealed;
        let slot = match kind {
            StreamKind::Stdout => &mut self.stdout,
            StreamKind::Stderr => &mut self.stderr,
        };
        let created = slot.is_none();
        let pipe = slot.get_or_insert_with(|| flavor.new_pipe());
        pipe.write(&data)?;
        if created && sealed {
            pipe.seal();
        }
        Ok(())
    }

    fn seal(&mut self) {
        if self.sealed {
            return;
        }
        for pipe in [&self.stdout, &self.stderr].into_iter().flatten() {
            pipe.seal();
        }
        self.sealed = true;
    }

    fn collect(&self, pipe: Option<&Pipe>) -> Result<Option<StreamData>> {
        match pipe {
            None => Ok(None),
            Some(Pipe::Memory(reader)) => Ok(Some(StreamData::from_bytes(
                reader.contents(),
                self.text_mode,
            ))),
            Some(Pipe::Stream(_)) => Err(FakeProcessError::internal(
                "async streams are read through AsyncSimulatedProcess::communicate",
            )),
        }
    }
}

struct Inner {
    invocation: Invocation,
    pattern: Command,
    pid: u32,
    flavor: Flavor,
    definition: Arc<ProcessDefinition>,
    state: Mutex<ProcessState>,
    worker: Mutex<Option<Arc<Worker>>>,
}

/// A process produced from a registered definition.
///
/// Clones share state, so a handle captured by a recorder observes the same
/// exit code, streams and signals as the one returned to the caller.
#[derive(Clone)]
pub struct SimulatedProcess {
    inner: Arc<Inner>,
}

impl SimulatedProcess {
    pub(crate) fn launch(
        invocation: Invocation,
        queued: &QueuedDefinition,
        pid: u32,
        options: &LaunchOptions,
        flavor: Flavor,
    ) -> Result<Self> {
        let process = Self {
            inner: Arc::new(Inner {
                invocation,
                pattern: queued.pattern.clone(),
                pid,
                flavor,
                definition: Arc::clone(&queued.definition),
                state: Mutex::new(ProcessState::default()),
                worker: Mutex::new(None),
            }),
        };
        process.configure(options)?;
        queued.recorder.record(process.clone());
        process.start()?;
        tracing::debug!(pid, command = %process.inner.invocation, "simulated process started");
        Ok(process)
    }

    fn configure(&self, options: &LaunchOptions) -> Result<()> {
        options.check_text_flags()?;
        let definition = &self.inner.definition;
        let flavor = self.inner.flavor;
        let mut state = self.inner.state.lock();
        state.text_mode = options.is_text_mode();
        state.universal_newlines = options.universal_newlines.unwrap_or(false);
        state.remaining_delay = definition.delay;

        match &options.stdout {
            Stdio::Pipe => {
                state.stdout = Some(flavor.new_pipe());
                if let Some(spec) = &definition.stdout {
                    state.append(flavor, StreamKind::Stdout, spec)?;
                }
            }
            Stdio::Writer(target) => {
                if let Some(spec) = &definition.stdout {
                    write_to_target(target, spec)?;
                }
            }
            _ => {}
        }

        match &options.stderr {
            Stdio::Stdout => {
                if let Some(spec) = definition.stderr.as_ref().filter(|s| !s.is_empty()) {
                    state.append(flavor, StreamKind::Stdout, spec)?;
                }
            }
            Stdio::Pipe => {
                state.stderr = Some(flavor.new_pipe());
                if let Some(spec) = &definition.stderr {
                    state.append(flavor, StreamKind::Stderr, spec)?;
                }
            }
            Stdio::Writer(target) => {
                if let Some(spec) = &definition.stderr {
                    write_to_target(target, spec)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn start(&self) -> Result<()> {
        let definition = &self.inner.definition;
        let name = format!("fakeproc-{}", self.inner.pid);
        if let Some(callback) = definition.callback.clone() {
            let process = self.clone();
            let worker = Worker::spawn(name, move || {
                let outcome = callback(&process, &process.inner.definition.callback_args);
                process.inner.state.lock().seal();
                outcome
            })?;
            *self.inner.worker.lock() = Some(Arc::new(worker));
        } else if let Some(delay) = definition.delay {
            let process = self.clone();
            let worker = Worker::spawn(name, move || {
                std::thread::sleep(delay);
                process.finish();
                Ok(())
            })?;
            *self.inner.worker.lock() = Some(Arc::new(worker));
        } else {
            self.finish();
        }
        Ok(())
    }

    /// Apply the registered exit code if none is set and seal the streams.
    fn finish(&self) {
        let mut state = self.inner.state.lock();
        if state.exit_code.is_none() {
            state.exit_code = Some(self.inner.definition.exit_code);
        }
        state.remaining_delay = None;
        state.seal();
    }

    fn finalize_worker(&self, timeout: Option<Duration>) -> Result<()> {
        let worker = self.inner.worker.lock().clone();
        let joined = match &worker {
            Some(worker) => worker.join(timeout),
            None => true,
        };
        if !joined && self.inner.definition.callback.is_some() {
            tracing::trace!(pid = self.inner.pid, "callback still running after join timeout");
            return Err(FakeProcessError::Timeout {
                command: self.inner.invocation.to_string(),
                timeout: timeout.unwrap_or_default(),
            });
        }
        self.finish();
        match worker.and_then(|w| w.failure()) {
            Some(err) => Err(FakeProcessError::Callback(err)),
            None => Ok(()),
        }
    }

    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    /// The invocation that produced this process.
    pub fn args(&self) -> &Invocation {
        &self.inner.invocation
    }

    /// The registered pattern the invocation matched.
    pub fn pattern(&self) -> &Command {
        &self.inner.pattern
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.inner.state.lock().exit_code
    }

    /// Set the exit code; meant for callbacks.
    pub fn set_exit_code(&self, code: i32) {
        self.inner.state.lock().exit_code = Some(code);
    }

    pub fn is_text_mode(&self) -> bool {
        self.inner.state.lock().text_mode
    }

    /// The current exit code, `None` while still running.
    pub fn poll(&self) -> Option<i32> {
        self.exit_code()
    }

    /// Wait for the process to finish.
    ///
    /// A non-zero `timeout` shorter than the outstanding delay fails with
    /// [`FakeProcessError::Timeout`] and shortens the delay by `timeout`.
    /// Otherwise the worker is joined, the registered exit code applied if
    /// still unset, and any callback failure re-raised. A callback that is
    /// still running when `timeout` elapses also fails with
    /// [`FakeProcessError::Timeout`]; its streams stay open until it returns.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<i32> {
        if let Some(timeout) = timeout.filter(|t| !t.is_zero()) {
            let mut state = self.inner.state.lock();
            if let Some(remaining) = state.remaining_delay {
                if timeout < remaining {
                    state.remaining_delay = Some(remaining - timeout);
                    return Err(FakeProcessError::Timeout {
                        command: self.inner.invocation.to_string(),
                        timeout,
                    });
                }
            }
        }
        self.finalize_worker(timeout)?;
        self.exit_code()
            .ok_or_else(|| FakeProcessError::internal("process finished without an exit code"))
    }

    /// Feed `input` to the stdin callback, wait, and return the full contents
    /// of the piped streams.
    pub fn communicate(
        &self,
        input: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<(Option<StreamData>, Option<StreamData>)> {
        self.handle_stdin(input)?;
        self.wait(timeout)?;
        let state = self.inner.state.lock();
        Ok((
            state.collect(state.stdout.as_ref())?,
            state.collect(state.stderr.as_ref())?,
        ))
    }

    pub(crate) fn handle_stdin(&self, input: Option<&[u8]>) -> Result<()> {
        let input = match input {
            Some(input) if !input.is_empty() => input,
            _ => return Ok(()),
        };
        let Some(callback) = self.inner.definition.stdin_callback.as_ref() else {
            return Ok(());
        };
        let reply = callback(input);
        let flavor = self.inner.flavor;
        let mut state = self.inner.state.lock();
        if let Some(spec) = reply.stdout.filter(|s| !s.is_empty()) {
            state.append(flavor, StreamKind::Stdout, &spec)?;
        }
        if let Some(spec) = reply.stderr.filter(|s| !s.is_empty()) {
            state.append(flavor, StreamKind::Stderr, &spec)?;
        }
        Ok(())
    }

    /// Record `signal` and hand it to the signal callback.
    pub fn send_signal(&self, signal: i32) {
        self.inner.state.lock().signals.push(signal);
        tracing::debug!(pid = self.inner.pid, signal, "signal sent to simulated process");
        if let Some(callback) = &self.inner.definition.signal_callback {
            callback(self, signal);
        }
    }

    pub fn terminate(&self) {
        self.send_signal(signals::SIGTERM);
    }

    /// SIGKILL, or terminate on Windows.
    pub fn kill(&self) {
        if cfg!(windows) {
            self.terminate();
        } else {
            self.send_signal(signals::SIGKILL);
        }
    }

    /// Signals received so far, in delivery order.
    pub fn received_signals(&self) -> Vec<i32> {
        self.inner.state.lock().signals.clone()
    }

    /// Reader over the piped stdout of a synchronous process.
    pub fn stdout(&self) -> Option<PipeReader> {
        match &self.inner.state.lock().stdout {
            Some(Pipe::Memory(reader)) => Some(reader.clone()),
            _ => None,
        }
    }

    pub fn stderr(&self) -> Option<PipeReader> {
        match &self.inner.state.lock().stderr {
            Some(Pipe::Memory(reader)) => Some(reader.clone()),
            _ => None,
        }
    }

    /// Append to stdout if it is piped; meant for callbacks.
    pub fn write_stdout(&self, output: impl Into<OutputSpec>) -> Result<()> {
        self.write_existing(StreamKind::Stdout, output.into())
    }

    pub fn write_stderr(&self, output: impl Into<OutputSpec>) -> Result<()> {
        self.write_existing(StreamKind::Stderr, output.into())
    }

    fn write_existing(&self, kind: StreamKind, output: OutputSpec) -> Result<()> {
        let state = self.inner.state.lock();
        let pipe = match kind {
            StreamKind::Stdout => &state.stdout,
            StreamKind::Stderr => &state.stderr,
        };
        match pipe {
            Some(pipe) => pipe.write(&state.render(&output)),
            None => Ok(()),
        }
    }

    /// Leave the process scope: re-raise a callback failure without waiting.
    pub fn close(&self) -> Result<()> {
        let worker = self.inner.worker.lock().clone();
        match worker.and_then(|w| w.failure()) {
            Some(err) => Err(FakeProcessError::Callback(err)),
            None => Ok(()),
        }
    }

    pub(crate) fn stream_readers(&self) -> (Option<StreamReader>, Option<StreamReader>) {
        let state = self.inner.state.lock();
        let stream = |pipe: &Option<Pipe>| match pipe {
            Some(Pipe::Stream(reader)) => Some(reader.clone()),
            _ => None,
        };
        (stream(&state.stdout), stream(&state.stderr))
    }

    /// Swap in fresh, unsealed streams.
    pub(crate) fn replace_streams(&self, stdout: Option<StreamReader>, stderr: Option<StreamReader>) {
        let mut state = self.inner.state.lock();
        state.stdout = stdout.map(Pipe::Stream);
        state.stderr = stderr.map(Pipe::Stream);
        state.sealed = false;
    }

    pub(crate) fn seal_streams(&self) {
        self.inner.state.lock().seal();
    }
}

impl fmt::Debug for SimulatedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SimulatedProcess")
            .field("pid", &self.inner.pid)
            .field("args", &self.inner.invocation)
            .field("exit_code", &state.exit_code)
            .field("signals", &state.signals)
            .finish()
    }
}

/// Write canned output into a caller-provided sink, one `\n` per line.
fn write_to_target(target: &SharedWriter, spec: &OutputSpec) -> Result<()> {
    let mut writer = target.lock();
    match spec {
        OutputSpec::Lines(lines) => {
            for line in lines {
                writer.write_all(line)?;
                writer.write_all(b"\n")?;
            }
        }
        OutputSpec::Text(text) => writer.write_all(text.as_bytes())?,
        OutputSpec::Bytes(bytes) => writer.write_all(bytes)?,
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "simulated_tests.rs"]
mod tests;
