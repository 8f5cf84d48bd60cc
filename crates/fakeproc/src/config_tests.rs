// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn scope_config_defaults_are_strict() {
    let config = ScopeConfig::default();
    assert!(!config.allow_unregistered);
    assert!(!config.keep_last_process);
    assert!(config.capture_file.is_none());
}

#[test]
fn scope_config_builders() {
    let config = ScopeConfig::default()
        .with_allow_unregistered(true)
        .with_keep_last_process(true)
        .with_capture_file("/tmp/calls.jsonl");

    assert!(config.allow_unregistered);
    assert!(config.keep_last_process);
    assert_eq!(
        config.capture_file,
        Some(PathBuf::from("/tmp/calls.jsonl"))
    );
}

#[test]
fn log_config_default_filter() {
    let config = LogConfig::default();
    assert_eq!(config.filter, "fakeproc=warn");
    assert!(!config.timestamps);
}
