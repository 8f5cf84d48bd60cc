// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process registry and dispatcher
//!
//! Intercepts process launches made through [`LaunchSeam`] and answers them
//! with simulated processes registered in advance, so tests can assert exact
//! invocation behavior without touching the operating system.
//!
#![doc = include_str!("../README.md")]

pub mod command;
pub mod config;
pub mod definition;
pub mod dispatcher;
pub mod env;
pub mod error;
pub mod launch;
pub mod logging;
pub mod options;
pub mod process;
pub mod recorder;
pub mod registry;
pub mod scenario;

/// Re-exported call log types from the fakeproc-capture crate.
pub mod capture {
    pub use fakeproc_capture::{CallLog, CapturedCall, CapturedOutcome};
}

pub use command::{Any, Command, IntoCommand, Invocation, Program, Token};
pub use config::{LogConfig, ScopeConfig};
pub use definition::{CallbackArgs, OutputSpec, ProcessDefinition, StdinReply};
pub use dispatcher::Dispatcher;
pub use error::{BoxError, CallbackError, CallbackPanic, FakeProcessError, Result};
pub use launch::{
    call, check_output, create_subprocess_exec, create_subprocess_shell, popen, run,
    CompletedProcess, LaunchFuture, LaunchSeam, Launcher, RealLauncher, RunOptions,
};
pub use options::{LaunchOptions, SharedWriter, Stdio};
pub use process::{
    signals, AsyncProcessHandle, AsyncRealProcess, AsyncSimulatedProcess, PipeReader,
    ProcessHandle, RealProcess, SimulatedProcess, StreamData, StreamReader,
};
pub use recorder::ProcessRecorder;
pub use registry::{FakeProcess, ScopeGuard, ScopeId};
pub use scenario::{Scenario, ScenarioConfig, ScenarioError};
