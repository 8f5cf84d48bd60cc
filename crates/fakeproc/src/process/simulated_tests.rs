// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::definition::{OutputSpec, StdinReply};
use crate::recorder::ProcessRecorder;
use rstest::rstest;
use std::io::Read;

fn launch(definition: ProcessDefinition, options: LaunchOptions) -> Result<SimulatedProcess> {
    let queued = QueuedDefinition {
        pattern: Command::literal("tool run"),
        definition: Arc::new(definition),
        recorder: ProcessRecorder::new(),
    };
    SimulatedProcess::launch(Invocation::exec(["tool", "run"]), &queued, 7, &options, Flavor::Sync)
}

fn spawn(definition: ProcessDefinition, options: LaunchOptions) -> SimulatedProcess {
    launch(definition, options).unwrap()
}

fn lines(parts: &[&str]) -> String {
    parts.iter().map(|p| format!("{p}{LINE_SEPARATOR}")).collect()
}

#[derive(Debug, thiserror::Error)]
#[error("custom failure")]
struct CustomFailure;

// =========================================================================
// Streams
// =========================================================================

#[test]
fn communicate_returns_piped_lines() {
    let process = spawn(
        ProcessDefinition::new().stdout(["* main", "  dev"]),
        LaunchOptions::piped().text(true),
    );
    let (stdout, stderr) = process.communicate(None, None).unwrap();
    assert_eq!(stdout.unwrap(), lines(&["* main", "  dev"]).as_str());
    assert_eq!(stderr.unwrap(), "");
    assert_eq!(process.poll(), Some(0));
}

#[test]
fn byte_mode_returns_bytes() {
    let process = spawn(
        ProcessDefinition::new().stdout("raw"),
        LaunchOptions::new().stdout(Stdio::Pipe),
    );
    let (stdout, stderr) = process.communicate(None, None).unwrap();
    assert_eq!(stdout, Some(StreamData::Bytes(b"raw".to_vec())));
    assert_eq!(stderr, None);
}

#[rstest]
#[case::line_list(OutputSpec::from(vec!["line1", "line2"]))]
#[case::joined_text(OutputSpec::from(lines(&["line1", "line2"])))]
#[case::raw_bytes(OutputSpec::from(lines(&["line1", "line2"]).into_bytes()))]
fn text_mode_reads_back_the_same_lines(#[case] output: OutputSpec) {
    let process = spawn(
        ProcessDefinition::new().stdout(output),
        LaunchOptions::new().stdout(Stdio::Pipe).text(true),
    );
    let (stdout, _) = process.communicate(None, None).unwrap();
    assert_eq!(stdout, Some(StreamData::Text(lines(&["line1", "line2"]))));
}

#[test]
fn unpiped_streams_are_absent() {
    let process = spawn(ProcessDefinition::new().stdout("ignored"), LaunchOptions::new());
    assert_eq!(process.communicate(None, None).unwrap(), (None, None));
    assert!(process.stdout().is_none());
}

#[test]
fn stderr_merges_into_stdout() {
    let process = spawn(
        ProcessDefinition::new().stdout("out\n").stderr("err\n"),
        LaunchOptions::new().stdout(Stdio::Pipe).stderr(Stdio::Stdout).text(true),
    );
    let (stdout, stderr) = process.communicate(None, None).unwrap();
    assert_eq!(stdout.unwrap(), "out\nerr\n");
    assert_eq!(stderr, None);
}

#[test]
fn empty_stderr_does_not_touch_stdout() {
    let process = spawn(
        ProcessDefinition::new().stderr(""),
        LaunchOptions::new().stderr(Stdio::Stdout),
    );
    assert_eq!(process.communicate(None, None).unwrap(), (None, None));
}

#[test]
fn writer_target_receives_lines() {
    let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
    let target: SharedWriter = sink.clone();
    let process = spawn(
        ProcessDefinition::new().stdout(["a", "b"]),
        LaunchOptions::new().stdout(Stdio::Writer(target)),
    );
    assert_eq!(*sink.lock(), b"a\nb\n");
    assert_eq!(process.communicate(None, None).unwrap(), (None, None));
}

#[test]
fn universal_newlines_normalizes_line_endings() {
    let process = spawn(
        ProcessDefinition::new().stdout("a\r\nb\r\n"),
        LaunchOptions::new().stdout(Stdio::Pipe).universal_newlines(true),
    );
    assert!(process.is_text_mode());
    let (stdout, _) = process.communicate(None, None).unwrap();
    assert_eq!(stdout, Some(StreamData::Text("a\nb\n".to_string())));
}

#[test]
fn conflicting_text_flags_fail_launch() {
    let err = launch(
        ProcessDefinition::new(),
        LaunchOptions::new().text(true).universal_newlines(false),
    )
    .unwrap_err();
    assert!(matches!(err, FakeProcessError::Subprocess(_)));
}

#[test]
fn stdout_reader_sees_content_after_finish() {
    let process = spawn(
        ProcessDefinition::new().stdout("hello"),
        LaunchOptions::new().stdout(Stdio::Pipe),
    );
    let mut out = String::new();
    process.stdout().unwrap().read_to_string(&mut out).unwrap();
    assert_eq!(out, "hello");
}

// =========================================================================
// Stdin
// =========================================================================

#[test]
fn stdin_callback_appends_output() {
    let process = spawn(
        ProcessDefinition::new()
            .stdout("base\n")
            .stdin_callback(|input| StdinReply::stdout(format!("got {}", String::from_utf8_lossy(input)))),
        LaunchOptions::new().stdout(Stdio::Pipe).text(true),
    );
    let (stdout, _) = process.communicate(Some(b"abc"), None).unwrap();
    assert_eq!(stdout.unwrap(), "base\ngot abc");
}

#[test]
fn stdin_callback_can_create_missing_stream() {
    let process = spawn(
        ProcessDefinition::new().stdin_callback(|_| StdinReply::stderr("warn")),
        LaunchOptions::new().text(true),
    );
    let (stdout, stderr) = process.communicate(Some(b"x"), None).unwrap();
    assert_eq!(stdout, None);
    assert_eq!(stderr.unwrap(), "warn");
}

#[test]
fn empty_input_skips_stdin_callback() {
    let process = spawn(
        ProcessDefinition::new().stdin_callback(|_| panic!("must not run")),
        LaunchOptions::new(),
    );
    process.communicate(Some(b""), None).unwrap();
}

// =========================================================================
// Delay and wait
// =========================================================================

#[test]
fn finishes_synchronously_without_delay_or_callback() {
    let process = spawn(ProcessDefinition::new().exit_code(3), LaunchOptions::new());
    assert_eq!(process.poll(), Some(3));
    assert_eq!(process.wait(None).unwrap(), 3);
}

#[test]
fn short_wait_times_out_on_delay() {
    let process = spawn(
        ProcessDefinition::new().delay(Duration::from_secs(2)).exit_code(1),
        LaunchOptions::new(),
    );
    let err = process.wait(Some(Duration::from_millis(500))).unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "Command 'tool run' timed out after 0.5 seconds");
    assert_eq!(process.poll(), None);
}

#[test]
fn repeated_waits_accumulate_towards_delay() {
    let process = spawn(
        ProcessDefinition::new().delay(Duration::from_secs(3)).exit_code(4),
        LaunchOptions::new(),
    );
    let step = Some(Duration::from_secs(1));
    assert!(process.wait(step).unwrap_err().is_timeout());
    assert!(process.wait(step).unwrap_err().is_timeout());
    assert_eq!(process.wait(step).unwrap(), 4);
    assert_eq!(process.poll(), Some(4));
}

#[test]
fn unbounded_wait_runs_out_the_delay() {
    let process = spawn(
        ProcessDefinition::new()
            .delay(Duration::from_millis(30))
            .stdout("late"),
        LaunchOptions::new().stdout(Stdio::Pipe),
    );
    assert_eq!(process.wait(None).unwrap(), 0);
    let (stdout, _) = process.communicate(None, None).unwrap();
    assert_eq!(stdout.unwrap(), "late");
}

#[test]
fn zero_timeout_never_raises() {
    let process = spawn(
        ProcessDefinition::new().delay(Duration::from_secs(5)),
        LaunchOptions::new(),
    );
    assert_eq!(process.wait(Some(Duration::ZERO)).unwrap(), 0);
}

#[test]
fn communicate_applies_wait_timeout() {
    let process = spawn(
        ProcessDefinition::new().delay(Duration::from_secs(2)),
        LaunchOptions::piped(),
    );
    let err = process
        .communicate(None, Some(Duration::from_millis(100)))
        .unwrap_err();
    assert!(err.is_timeout());
}

// =========================================================================
// Callbacks
// =========================================================================

#[test]
fn callback_drives_exit_code_and_output() {
    let process = spawn(
        ProcessDefinition::new()
            .stdout("start ")
            .callback_arg("code", 5)
            .callback(|process, args| {
                let code = args["code"].as_i64().unwrap_or_default() as i32;
                process.write_stdout("from callback")?;
                process.set_exit_code(code);
                Ok(())
            }),
        LaunchOptions::new().stdout(Stdio::Pipe).text(true),
    );
    let (stdout, _) = process.communicate(None, None).unwrap();
    assert_eq!(stdout.unwrap(), "start from callback");
    assert_eq!(process.poll(), Some(5));
}

#[test]
fn timed_out_wait_leaves_callback_running() {
    let process = spawn(
        ProcessDefinition::new().exit_code(2).callback(|process, _| {
            std::thread::sleep(Duration::from_millis(200));
            process.write_stdout("late")?;
            Ok(())
        }),
        LaunchOptions::new().stdout(Stdio::Pipe),
    );
    let err = process.wait(Some(Duration::from_millis(10))).unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(process.poll(), None);

    let (stdout, _) = process.communicate(None, None).unwrap();
    assert_eq!(stdout.unwrap(), b"late");
    assert_eq!(process.poll(), Some(2));
}

#[test]
fn registered_exit_code_applies_after_callback() {
    let process = spawn(
        ProcessDefinition::new().exit_code(9).callback(|_, _| Ok(())),
        LaunchOptions::new(),
    );
    assert_eq!(process.poll(), None);
    assert_eq!(process.wait(None).unwrap(), 9);
}

#[test]
fn callback_error_is_reraised_with_same_identity() {
    let process = spawn(
        ProcessDefinition::new().callback(|_, _| Err(CustomFailure.into())),
        LaunchOptions::new(),
    );
    let first = process.wait(None).unwrap_err();
    let second = process.communicate(None, None).unwrap_err();
    let third = process.close().unwrap_err();

    let captured = first.callback_error().unwrap();
    assert!(captured.downcast_ref::<CustomFailure>().is_some());
    assert!(Arc::ptr_eq(captured, second.callback_error().unwrap()));
    assert!(Arc::ptr_eq(captured, third.callback_error().unwrap()));
    assert_eq!(first.to_string(), "custom failure");
}

#[test]
fn callback_panic_is_captured() {
    let process = spawn(
        ProcessDefinition::new().callback(|_, _| panic!("callback blew up")),
        LaunchOptions::new(),
    );
    let err = process.wait(None).unwrap_err();
    assert_eq!(err.to_string(), "callback panicked: callback blew up");
}

#[test]
fn close_without_failure_is_ok() {
    let process = spawn(ProcessDefinition::new(), LaunchOptions::new());
    process.close().unwrap();
}

// =========================================================================
// Signals
// =========================================================================

#[test]
fn signals_are_logged_in_order() {
    let process = spawn(ProcessDefinition::new(), LaunchOptions::new());
    process.send_signal(signals::SIGINT);
    process.terminate();
    assert_eq!(
        process.received_signals(),
        vec![signals::SIGINT, signals::SIGTERM]
    );
}

#[cfg(unix)]
#[test]
fn kill_sends_sigkill() {
    let process = spawn(ProcessDefinition::new(), LaunchOptions::new());
    process.kill();
    assert_eq!(process.received_signals(), vec![signals::SIGKILL]);
}

#[test]
fn signal_callback_can_change_exit_code() {
    let process = spawn(
        ProcessDefinition::new().signal_callback(|process, signal| process.set_exit_code(-signal)),
        LaunchOptions::new(),
    );
    process.terminate();
    assert_eq!(process.poll(), Some(-signals::SIGTERM));
}

// =========================================================================
// Identity
// =========================================================================

#[test]
fn accessors_and_recorder_binding() {
    let recorder = ProcessRecorder::new();
    let queued = QueuedDefinition {
        pattern: Command::literal("tool run"),
        definition: Arc::new(ProcessDefinition::new()),
        recorder: recorder.clone(),
    };
    let process = SimulatedProcess::launch(
        Invocation::exec(["tool", "run"]),
        &queued,
        42,
        &LaunchOptions::new(),
        Flavor::Sync,
    )
    .unwrap();

    assert_eq!(process.pid(), 42);
    assert_eq!(process.args().args(), ["tool", "run"]);
    assert_eq!(process.pattern(), &Command::literal("tool run"));
    assert_eq!(recorder.call_count(), 1);
    assert_eq!(recorder.last_call().unwrap().pid(), 42);
}
