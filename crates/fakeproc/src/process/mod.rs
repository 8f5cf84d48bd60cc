// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated and real process handles.

mod async_simulated;
mod buffer;
mod real;
mod simulated;
mod worker;

pub use async_simulated::AsyncSimulatedProcess;
pub use buffer::{PipeReader, StreamReader, LINE_SEPARATOR};
pub use real::{AsyncRealProcess, RealProcess};
pub(crate) use simulated::Flavor;
pub use simulated::SimulatedProcess;

use crate::command::Invocation;
use crate::error::Result;
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// Signal numbers used by `terminate` / `kill`.
pub mod signals {
    #[cfg(unix)]
    pub use signal_hook::consts::{SIGINT, SIGKILL, SIGTERM};

    #[cfg(not(unix))]
    pub const SIGINT: i32 = 2;
    #[cfg(not(unix))]
    pub const SIGKILL: i32 = 9;
    #[cfg(not(unix))]
    pub const SIGTERM: i32 = 15;
}

/// Captured stream content: text in text mode, bytes otherwise
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamData {
    Text(String),
    Bytes(Vec<u8>),
}

impl StreamData {
    pub(crate) fn from_bytes(data: Vec<u8>, text_mode: bool) -> Self {
        if !text_mode {
            return Self::Bytes(data);
        }
        match String::from_utf8(data) {
            Ok(text) => Self::Text(text),
            Err(err) => Self::Text(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// The text, for streams captured in text mode.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl fmt::Display for StreamData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text_lossy())
    }
}

impl PartialEq<str> for StreamData {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for StreamData {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<[u8]> for StreamData {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for StreamData {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.as_bytes() == other.as_slice()
    }
}

/// Handle returned from the synchronous launch surface
#[derive(Debug)]
pub enum ProcessHandle {
    Simulated(SimulatedProcess),
    Real(RealProcess),
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        match self {
            Self::Simulated(p) => p.pid(),
            Self::Real(p) => p.pid(),
        }
    }

    pub fn args(&self) -> &Invocation {
        match self {
            Self::Simulated(p) => p.args(),
            Self::Real(p) => p.args(),
        }
    }

    pub fn poll(&mut self) -> Result<Option<i32>> {
        match self {
            Self::Simulated(p) => Ok(p.poll()),
            Self::Real(p) => p.poll(),
        }
    }

    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<i32> {
        match self {
            Self::Simulated(p) => p.wait(timeout),
            Self::Real(p) => p.wait(timeout),
        }
    }

    pub fn communicate(
        &mut self,
        input: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<(Option<StreamData>, Option<StreamData>)> {
        match self {
            Self::Simulated(p) => p.communicate(input, timeout),
            Self::Real(p) => p.communicate(input, timeout),
        }
    }

    pub fn send_signal(&mut self, signal: i32) -> Result<()> {
        match self {
            Self::Simulated(p) => {
                p.send_signal(signal);
                Ok(())
            }
            Self::Real(p) => p.send_signal(signal),
        }
    }

    pub fn terminate(&mut self) -> Result<()> {
        match self {
            Self::Simulated(p) => {
                p.terminate();
                Ok(())
            }
            Self::Real(p) => p.terminate(),
        }
    }

    pub fn kill(&mut self) -> Result<()> {
        match self {
            Self::Simulated(p) => {
                p.kill();
                Ok(())
            }
            Self::Real(p) => p.kill(),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }

    pub fn as_simulated(&self) -> Option<&SimulatedProcess> {
        match self {
            Self::Simulated(p) => Some(p),
            Self::Real(_) => None,
        }
    }
}

/// Handle returned from the async launch surface
#[derive(Debug)]
pub enum AsyncProcessHandle {
    Simulated(AsyncSimulatedProcess),
    Real(AsyncRealProcess),
}

impl AsyncProcessHandle {
    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::Simulated(p) => Some(p.pid()),
            Self::Real(p) => p.pid(),
        }
    }

    pub fn args(&self) -> &Invocation {
        match self {
            Self::Simulated(p) => p.args(),
            Self::Real(p) => p.args(),
        }
    }

    pub fn returncode(&mut self) -> Result<Option<i32>> {
        match self {
            Self::Simulated(p) => Ok(p.returncode()),
            Self::Real(p) => p.returncode(),
        }
    }

    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<i32> {
        match self {
            Self::Simulated(p) => p.wait(timeout).await,
            Self::Real(p) => p.wait(timeout).await,
        }
    }

    pub async fn communicate(
        &mut self,
        input: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>)> {
        match self {
            Self::Simulated(p) => p.communicate(input, timeout).await,
            Self::Real(p) => p.communicate(input, timeout).await,
        }
    }

    pub fn send_signal(&mut self, signal: i32) -> Result<()> {
        match self {
            Self::Simulated(p) => {
                p.send_signal(signal);
                Ok(())
            }
            Self::Real(p) => p.send_signal(signal),
        }
    }

    pub fn terminate(&mut self) -> Result<()> {
        self.send_signal(signals::SIGTERM)
    }

    pub fn kill(&mut self) -> Result<()> {
        match self {
            Self::Simulated(p) => {
                p.kill();
                Ok(())
            }
            Self::Real(p) => p.kill(),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }

    pub fn as_simulated(&self) -> Option<&AsyncSimulatedProcess> {
        match self {
            Self::Simulated(p) => Some(p),
            Self::Real(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
