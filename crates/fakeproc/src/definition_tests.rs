// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::command::{Any, Token};
use crate::process::LINE_SEPARATOR;
use rstest::rstest;

fn queued(pattern: &str) -> Entry {
    Entry::Simulated(Arc::new(QueuedDefinition {
        pattern: Command::literal(pattern),
        definition: Arc::new(ProcessDefinition::new()),
        recorder: ProcessRecorder::new(),
    }))
}

fn is_pass_through(entry: &Entry) -> bool {
    matches!(entry, Entry::PassThrough)
}

// =========================================================================
// OutputSpec
// =========================================================================

#[test]
fn lines_are_joined_and_terminated() {
    let rendered = OutputSpec::from(["line1", "line2"]).render(LINE_SEPARATOR.as_bytes());
    assert_eq!(rendered, format!("line1{LINE_SEPARATOR}line2{LINE_SEPARATOR}").into_bytes());
}

#[test]
fn empty_line_list_renders_nothing() {
    let spec = OutputSpec::lines(Vec::<String>::new());
    assert!(spec.is_empty());
    assert!(spec.render(b"\n").is_empty());
}

#[rstest]
#[case(OutputSpec::from("a\nb\n"))]
#[case(OutputSpec::from(b"a\nb\n".to_vec()))]
#[case(OutputSpec::from(vec!["a", "b"]))]
#[case(OutputSpec::Lines(vec![b"a".to_vec(), b"b".to_vec()]))]
fn representations_render_the_same(#[case] spec: OutputSpec) {
    assert_eq!(spec.render(b"\n"), b"a\nb\n");
}

#[rstest]
#[case(OutputSpec::from(""), true)]
#[case(OutputSpec::from(Vec::<u8>::new()), true)]
#[case(OutputSpec::from(vec![""]), false)]
#[case(OutputSpec::from("x"), false)]
fn emptiness(#[case] spec: OutputSpec, #[case] empty: bool) {
    assert_eq!(spec.is_empty(), empty);
}

// =========================================================================
// ProcessDefinition
// =========================================================================

#[test]
fn defaults() {
    let definition = ProcessDefinition::default();
    assert_eq!(definition.occurrence_count(), 1);
    assert_eq!(definition.configured_exit_code(), 0);
    assert_eq!(definition.configured_delay(), None);
    assert!(!definition.has_callback());
    definition.validate().unwrap();
}

#[test]
fn delay_and_callback_conflict() {
    let err = ProcessDefinition::new()
        .delay(Duration::from_millis(5))
        .callback(|_, _| Ok(()))
        .validate()
        .unwrap_err();
    assert!(matches!(err, FakeProcessError::IncorrectDefinition(_)));
    assert!(err.to_string().starts_with("The 'callback' and 'delay' arguments"));
}

#[test]
fn callback_args_accumulate() {
    let definition = ProcessDefinition::new()
        .callback_arg("code", 3)
        .callback_arg("label", "x");
    assert_eq!(definition.callback_args["code"], serde_json::json!(3));
    assert_eq!(definition.callback_args["label"], serde_json::json!("x"));
}

#[test]
fn debug_hides_closures() {
    let definition = ProcessDefinition::new().signal_callback(|_, _| {});
    let debug = format!("{definition:?}");
    assert!(debug.contains("signal_callback: true"));
    assert!(debug.contains("callback: false"));
}

// =========================================================================
// Queues
// =========================================================================

#[test]
fn queue_pops_in_order() {
    let mut queue = DefinitionQueue::default();
    queue.push(queued("a"), 2);
    queue.push(Entry::PassThrough, 1);
    assert_eq!(queue.len(), 3);

    assert!(!is_pass_through(&queue.pop(false).unwrap()));
    assert!(!is_pass_through(&queue.pop(false).unwrap()));
    assert!(is_pass_through(&queue.pop(false).unwrap()));
    assert!(queue.pop(false).is_none());
}

#[test]
fn keep_last_pins_final_entry() {
    let mut queue = DefinitionQueue::default();
    queue.push(queued("a"), 1);
    for _ in 0..5 {
        assert!(queue.pop(true).is_some());
    }
    assert_eq!(queue.len(), 1);
}

#[test]
fn map_removes_exhausted_patterns() {
    let mut map = DefinitionMap::default();
    map.queue_mut(Command::literal("ls")).push(queued("ls"), 2);
    let invocation = Invocation::exec(["ls"]);

    assert!(map.consume(&invocation, false).is_some());
    assert_eq!(map.pending(&Command::literal("ls")), 1);
    assert!(map.consume(&invocation, false).is_some());
    assert!(map.is_empty());
    assert!(map.consume(&invocation, false).is_none());
}

#[test]
fn map_keeps_pinned_pattern() {
    let mut map = DefinitionMap::default();
    map.queue_mut(Command::literal("ls")).push(queued("ls"), 1);
    let invocation = Invocation::exec(["ls"]);

    for _ in 0..3 {
        assert!(map.consume(&invocation, true).is_some());
    }
    assert_eq!(map.patterns(), vec![Command::literal("ls")]);
}

#[test]
fn first_registered_pattern_wins() {
    let mut map = DefinitionMap::default();
    let wildcard = Command::new(vec![Token::from("git"), Token::from(Any::new())]).unwrap();
    map.queue_mut(wildcard.clone()).push(Entry::PassThrough, 1);
    map.queue_mut(Command::literal("git status")).push(queued("git status"), 1);

    let invocation = Invocation::exec(["git", "status"]);
    assert!(is_pass_through(&map.consume(&invocation, false).unwrap()));
    assert!(!is_pass_through(&map.consume(&invocation, false).unwrap()));
    assert_eq!(map.pending(&wildcard), 0);
}

#[test]
fn registering_same_pattern_extends_queue() {
    let mut map = DefinitionMap::default();
    map.queue_mut(Command::literal("ls")).push(queued("ls"), 1);
    map.queue_mut(Command::literal("ls")).push(Entry::PassThrough, 2);
    assert_eq!(map.patterns().len(), 1);
    assert_eq!(map.pending(&Command::literal("ls")), 3);
}

#[test]
fn snapshot_is_independent_of_live_map() {
    let mut map = DefinitionMap::default();
    map.queue_mut(Command::literal("ls")).push(queued("ls"), 2);
    let snapshot = map.clone();

    map.consume(&Invocation::exec(["ls"]), false);
    map.consume(&Invocation::exec(["ls"]), false);
    assert!(map.is_empty());
    assert_eq!(snapshot.pending(&Command::literal("ls")), 2);
}
