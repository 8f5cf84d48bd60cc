// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All environment variables read by fakeproc are defined here.
//! Use these accessors instead of calling `std::env::var()` directly.

/// Generated env var name constants.
mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

// Re-export name constants for callers that need the raw name string.
pub use names::*;

use std::path::PathBuf;

/// `FAKEPROC_ALLOW_UNREGISTERED`: default for new scopes built with `FakeProcess::from_env`.
pub fn allow_unregistered() -> Option<bool> {
    var_bool(names::FAKEPROC_ALLOW_UNREGISTERED)
}

/// `FAKEPROC_KEEP_LAST_PROCESS`: default keep-last toggle for `FakeProcess::from_env`.
pub fn keep_last_process() -> Option<bool> {
    var_bool(names::FAKEPROC_KEEP_LAST_PROCESS)
}

/// `FAKEPROC_CAPTURE_FILE`: mirror each scope's call log to this JSONL file.
pub fn capture_file() -> Option<PathBuf> {
    std::env::var(names::FAKEPROC_CAPTURE_FILE)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// `FAKEPROC_LOG`: tracing filter directive.
pub fn log_filter() -> Option<String> {
    std::env::var(names::FAKEPROC_LOG)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// `FAKEPROC_LOG_TIMESTAMPS`: include timestamps in log lines.
pub fn log_timestamps() -> Option<bool> {
    var_bool(names::FAKEPROC_LOG_TIMESTAMPS)
}

/// `PATHEXT`: executable extensions consulted by program-name matching on Windows.
pub fn pathext() -> Vec<String> {
    std::env::var(names::PATHEXT)
        .map(|v| split_pathext(&v))
        .unwrap_or_default()
}

pub(crate) fn split_pathext(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(String::from)
        .collect()
}

fn var_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_bool(&v))
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
