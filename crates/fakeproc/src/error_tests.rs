// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn not_registered_message() {
    let err = FakeProcessError::NotRegistered {
        command: "git status".to_string(),
    };
    assert_eq!(err.to_string(), "The process 'git status' was not registered.");
    assert!(err.is_not_registered());
}

#[test]
fn timeout_message_includes_command_and_seconds() {
    let err = FakeProcessError::Timeout {
        command: "sleep 10".to_string(),
        timeout: Duration::from_millis(1500),
    };
    assert_eq!(err.to_string(), "Command 'sleep 10' timed out after 1.5 seconds");
    assert!(err.is_timeout());
}

#[test]
fn called_process_message() {
    let err = FakeProcessError::CalledProcess {
        command: "make".to_string(),
        exit_code: 2,
        stdout: None,
        stderr: None,
    };
    assert_eq!(
        err.to_string(),
        "Command 'make' returned non-zero exit status 2."
    );
}

#[test]
fn callback_error_keeps_identity() {
    let original: CallbackError = Arc::new(CallbackPanic("boom".to_string()));
    let err = FakeProcessError::Callback(Arc::clone(&original));

    assert_eq!(err.to_string(), "callback panicked: boom");
    let inner = err.callback_error().map(Arc::clone);
    assert!(inner.is_some_and(|e| Arc::ptr_eq(&e, &original)));
}
