// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Shared helpers for integration tests.

#![allow(dead_code)]

use fakeproc::{Dispatcher, LaunchSeam};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// A dispatcher over its own seam, isolated from other tests.
pub fn isolated() -> Arc<Dispatcher> {
    Dispatcher::new(LaunchSeam::real())
}

/// Create a temporary scenario file
/// Detects JSON vs TOML content and uses appropriate extension
pub fn write_scenario(content: &str) -> NamedTempFile {
    let is_json = content.trim().starts_with('{');

    let mut file = if is_json {
        tempfile::Builder::new().suffix(".json").tempfile().unwrap()
    } else {
        tempfile::Builder::new().suffix(".toml").tempfile().unwrap()
    };

    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
