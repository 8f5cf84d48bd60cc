// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Async facade over a simulated process with stream-backed pipes.

use super::buffer::StreamReader;
use super::SimulatedProcess;
use crate::command::Invocation;
use crate::error::{FakeProcessError, Result};
use std::time::Duration;

/// Simulated process returned from the async launch surface
#[derive(Clone, Debug)]
pub struct AsyncSimulatedProcess {
    process: SimulatedProcess,
}

impl AsyncSimulatedProcess {
    pub(crate) fn new(process: SimulatedProcess) -> Self {
        Self { process }
    }

    /// The shared process state, as seen by recorders and callbacks.
    pub fn process(&self) -> &SimulatedProcess {
        &self.process
    }

    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    pub fn args(&self) -> &Invocation {
        self.process.args()
    }

    pub fn returncode(&self) -> Option<i32> {
        self.process.exit_code()
    }

    pub fn stdout(&self) -> Option<StreamReader> {
        self.process.stream_readers().0
    }

    pub fn stderr(&self) -> Option<StreamReader> {
        self.process.stream_readers().1
    }

    pub fn send_signal(&self, signal: i32) {
        self.process.send_signal(signal);
    }

    pub fn terminate(&self) {
        self.process.terminate();
    }

    pub fn kill(&self) {
        self.process.kill();
    }

    pub fn received_signals(&self) -> Vec<i32> {
        self.process.received_signals()
    }

    /// Same semantics as [`SimulatedProcess::wait`] without blocking the runtime.
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<i32> {
        let process = self.process.clone();
        tokio::task::spawn_blocking(move || process.wait(timeout))
            .await
            .map_err(|err| FakeProcessError::internal(format!("wait task failed: {err}")))?
    }

    /// Feed `input` to the stdin callback, wait, and drain both streams.
    ///
    /// Streams already at end-of-stream are reopened with their unread
    /// content so stdin-driven output can be appended.
    pub async fn communicate(
        &self,
        input: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>)> {
        if let Some(input) = input.filter(|i| !i.is_empty()) {
            let (stdout, stderr) = self.process.stream_readers();
            let stdout = reopen(stdout).await?;
            let stderr = reopen(stderr).await?;
            self.process.replace_streams(stdout, stderr);
            self.process.handle_stdin(Some(input))?;
            self.process.seal_streams();
        }
        self.wait(timeout).await?;
        let (stdout, stderr) = self.process.stream_readers();
        Ok((drain(stdout).await, drain(stderr).await))
    }
}

async fn reopen(stream: Option<StreamReader>) -> Result<Option<StreamReader>> {
    let Some(stream) = stream else {
        return Ok(None);
    };
    let unread = stream.read().await;
    let fresh = StreamReader::new();
    fresh.feed_data(&unread)?;
    Ok(Some(fresh))
}

async fn drain(stream: Option<StreamReader>) -> Option<Vec<u8>> {
    match stream {
        Some(stream) => Some(stream.read().await),
        None => None,
    }
}

#[cfg(test)]
#[path = "async_simulated_tests.rs"]
mod tests;
