// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Captured invocation data types.

use super::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// One invocation answered by a registry scope
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapturedCall {
    /// Sequence number within the log
    pub seq: u64,

    /// Wall-clock timestamp
    pub timestamp: SystemTime,

    /// Elapsed time since the log was created
    #[serde(rename = "elapsed_ms", with = "duration_ms")]
    pub elapsed: Duration,

    /// Program and arguments exactly as the caller supplied them
    pub args: Vec<String>,

    /// Whether the call was launched through a shell-style entry point
    #[serde(default)]
    pub shell: bool,

    /// How the scope answered the invocation
    pub outcome: CapturedOutcome,
}

impl CapturedCall {
    /// The program name (first argument), if any.
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

/// How an invocation was answered
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapturedOutcome {
    /// A simulated process was produced
    Simulated { pid: u32 },
    /// The invocation was forwarded to the real launcher
    PassedThrough { pid: u32 },
}

impl CapturedOutcome {
    /// Process id assigned by the dispatcher.
    pub fn pid(&self) -> u32 {
        match self {
            Self::Simulated { pid } | Self::PassedThrough { pid } => *pid,
        }
    }
}

#[cfg(test)]
#[path = "interaction_tests.rs"]
mod tests;
