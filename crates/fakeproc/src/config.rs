// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scope and logging configuration.

use crate::env;
use std::path::PathBuf;

/// Default tracing directive when `FAKEPROC_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "fakeproc=warn";

/// Initial settings for a registry scope
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeConfig {
    /// Forward unmatched invocations to the real launcher instead of failing
    pub allow_unregistered: bool,

    /// Pin the final definition of each pattern so it matches indefinitely
    pub keep_last_process: bool,

    /// Mirror the scope's call log to this JSONL file
    pub capture_file: Option<PathBuf>,
}

impl ScopeConfig {
    /// Build a config from `FAKEPROC_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            allow_unregistered: env::allow_unregistered().unwrap_or(false),
            keep_last_process: env::keep_last_process().unwrap_or(false),
            capture_file: env::capture_file(),
        }
    }

    pub fn with_allow_unregistered(mut self, allow: bool) -> Self {
        self.allow_unregistered = allow;
        self
    }

    pub fn with_keep_last_process(mut self, keep: bool) -> Self {
        self.keep_last_process = keep;
        self
    }

    pub fn with_capture_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.capture_file = Some(path.into());
        self
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `fakeproc=debug`
    pub filter: String,

    /// Include timestamps in each line
    pub timestamps: bool,
}

impl LogConfig {
    /// Read `FAKEPROC_LOG` / `FAKEPROC_LOG_TIMESTAMPS`.
    pub fn from_env() -> Self {
        Self {
            filter: env::log_filter().unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            timestamps: env::log_timestamps().unwrap_or(false),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            timestamps: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
