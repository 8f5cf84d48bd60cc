// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Integration tests for the async launch surface.

mod common;

use fakeproc::{AsyncProcessHandle, FakeProcess, LaunchOptions, ProcessDefinition, StdinReply, Stdio};
use std::time::Duration;

#[tokio::test]
async fn stdout_lines_are_readable_as_they_arrive() {
    let dispatcher = common::isolated();
    let guard = FakeProcess::new().enter_with(&dispatcher);
    guard
        .register(
            "tail -f log",
            ProcessDefinition::new().stdout(vec!["one", "two"]),
        )
        .unwrap();

    let process = dispatcher
        .seam()
        .create_subprocess_shell("tail -f log", LaunchOptions::new().stdout(Stdio::Pipe))
        .await
        .unwrap();
    let AsyncProcessHandle::Simulated(process) = process else {
        panic!("expected a simulated process");
    };
    let stdout = process.stdout().unwrap();
    assert_eq!(stdout.readline().await, b"one\n");
    assert_eq!(stdout.readline().await, b"two\n");
    assert!(stdout.readline().await.is_empty());
    assert!(stdout.at_eof());
}

#[tokio::test]
async fn communicate_with_input_reaches_stdin_callback() {
    let dispatcher = common::isolated();
    let guard = FakeProcess::new().enter_with(&dispatcher);
    guard
        .register(
            ["sort"],
            ProcessDefinition::new()
                .stdout("sorted:")
                .stdin_callback(|input| {
                    let mut lines: Vec<&str> = std::str::from_utf8(input)
                        .unwrap_or_default()
                        .lines()
                        .collect();
                    lines.sort_unstable();
                    StdinReply::stdout(lines)
                }),
        )
        .unwrap();

    let mut process = dispatcher
        .seam()
        .create_subprocess_exec("sort", Vec::<&str>::new(), LaunchOptions::new().stdout(Stdio::Pipe))
        .await
        .unwrap();
    let (stdout, stderr) = process.communicate(Some(b"b\na\n"), None).await.unwrap();
    assert_eq!(stdout.unwrap(), b"sorted:a\nb\n");
    assert!(stderr.is_none());
    assert_eq!(process.returncode().unwrap(), Some(0));
}

#[tokio::test]
async fn delayed_async_process_times_out() {
    let dispatcher = common::isolated();
    let guard = FakeProcess::new().enter_with(&dispatcher);
    guard
        .register(
            "sleep 1",
            ProcessDefinition::new()
                .delay(Duration::from_millis(200))
                .exit_code(9),
        )
        .unwrap();

    let mut process = dispatcher
        .seam()
        .create_subprocess_shell("sleep 1", LaunchOptions::new())
        .await
        .unwrap();
    let err = process.wait(Some(Duration::from_millis(20))).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(process.wait(None).await.unwrap(), 9);
}

#[cfg(unix)]
#[tokio::test]
async fn pass_through_runs_real_process() {
    let dispatcher = common::isolated();
    let guard = FakeProcess::new().enter_with(&dispatcher);
    guard.pass_through(["echo", "async"], 1).unwrap();

    let mut process = dispatcher
        .seam()
        .create_subprocess_exec("echo", ["async"], LaunchOptions::new().stdout(Stdio::Pipe))
        .await
        .unwrap();
    assert!(!process.is_simulated());
    let (stdout, _) = process.communicate(None, None).await.unwrap();
    assert_eq!(stdout.unwrap(), b"async\n");
    assert_eq!(process.returncode().unwrap(), Some(0));
}
