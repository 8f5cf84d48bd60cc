// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the fake-process engine.

use crate::process::StreamData;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A failure raised inside a user callback.
///
/// Stored on the worker that ran the callback and handed back, as the same
/// `Arc`, from every later synchronization point on that process.
pub type CallbackError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Boxed error type user callbacks return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by registration, dispatch and simulated processes
#[derive(Debug, Error)]
pub enum FakeProcessError {
    /// No open scope has a definition for the invocation and unregistered
    /// processes are not allowed.
    #[error("The process '{command}' was not registered.")]
    NotRegistered { command: String },

    /// A definition was registered with conflicting options.
    #[error("{0}")]
    IncorrectDefinition(String),

    /// A command pattern could not be constructed.
    #[error("Invalid command pattern: {0}")]
    InvalidPattern(String),

    /// `wait` / `communicate` gave up before the process finished.
    #[error("Command '{command}' timed out after {} seconds", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },

    /// A checked run finished with a non-zero exit code.
    #[error("Command '{command}' returned non-zero exit status {exit_code}.")]
    CalledProcess {
        command: String,
        exit_code: i32,
        stdout: Option<StreamData>,
        stderr: Option<StreamData>,
    },

    /// A user callback failed on its worker thread.
    #[error("{0}")]
    Callback(CallbackError),

    /// A launch argument was rejected before dispatch.
    #[error("{0}")]
    InvalidArgument(String),

    /// Launch options contradict each other.
    #[error("{0}")]
    Subprocess(String),

    /// An invariant of the engine itself was violated.
    #[error("Internal error in fakeproc: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FakeProcessError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The captured callback failure, if this error re-raises one.
    pub fn callback_error(&self) -> Option<&CallbackError> {
        match self {
            Self::Callback(err) => Some(err),
            _ => None,
        }
    }

    /// Whether this is a `NotRegistered` dispatch failure.
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered { .. })
    }

    /// Whether this is a timeout from `wait` / `communicate`.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// A user callback panicked instead of returning an error.
#[derive(Debug, Error)]
#[error("callback panicked: {0}")]
pub struct CallbackPanic(pub String);

pub type Result<T, E = FakeProcessError> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
