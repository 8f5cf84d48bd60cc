// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Process definitions and the per-pattern queues that hold them.

use crate::command::{Command, Invocation};
use crate::error::{BoxError, FakeProcessError, Result};
use crate::process::SimulatedProcess;
use crate::recorder::ProcessRecorder;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Keyword arguments handed to a process callback.
pub type CallbackArgs = serde_json::Map<String, serde_json::Value>;

/// Runs in place of the process on a worker thread.
///
/// The callback is solely responsible for the exit code; if it leaves it unset
/// the registered `exit_code` is applied when the caller next waits.
pub type ProcessCallback =
    Arc<dyn Fn(&SimulatedProcess, &CallbackArgs) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Invoked for every signal delivered to a simulated process.
pub type SignalCallback = Arc<dyn Fn(&SimulatedProcess, i32) + Send + Sync>;

/// Receives the bytes passed to `communicate(input)`.
pub type StdinCallback = Arc<dyn Fn(&[u8]) -> StdinReply + Send + Sync>;

/// Output a stdin callback appends to the process streams
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StdinReply {
    pub stdout: Option<OutputSpec>,
    pub stderr: Option<OutputSpec>,
}

impl StdinReply {
    pub fn stdout(data: impl Into<OutputSpec>) -> Self {
        Self {
            stdout: Some(data.into()),
            stderr: None,
        }
    }

    pub fn stderr(data: impl Into<OutputSpec>) -> Self {
        Self {
            stdout: None,
            stderr: Some(data.into()),
        }
    }
}

/// Canned content for one output stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputSpec {
    /// Text written as-is
    Text(String),
    /// Raw bytes written as-is
    Bytes(Vec<u8>),
    /// Lines joined with the platform line separator, with a trailing separator
    Lines(Vec<Vec<u8>>),
}

impl OutputSpec {
    /// Build a line list from anything string- or byte-like.
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self::Lines(lines.into_iter().map(|l| l.as_ref().to_vec()).collect())
    }

    /// Whether this output renders to no bytes.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Lines(lines) => lines.is_empty(),
        }
    }

    /// Render to bytes, joining lines with `separator`.
    pub fn render(&self, separator: &[u8]) -> Vec<u8> {
        match self {
            Self::Text(text) => text.as_bytes().to_vec(),
            Self::Bytes(bytes) => bytes.clone(),
            Self::Lines(lines) => {
                let mut out = lines.join(separator);
                if !out.is_empty() {
                    out.extend_from_slice(separator);
                }
                out
            }
        }
    }
}

impl From<&str> for OutputSpec {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OutputSpec {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&[u8]> for OutputSpec {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for OutputSpec {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<&str>> for OutputSpec {
    fn from(value: Vec<&str>) -> Self {
        Self::lines(value)
    }
}

impl From<Vec<String>> for OutputSpec {
    fn from(value: Vec<String>) -> Self {
        Self::lines(value)
    }
}

impl From<Vec<Vec<u8>>> for OutputSpec {
    fn from(value: Vec<Vec<u8>>) -> Self {
        Self::Lines(value)
    }
}

impl<const N: usize> From<[&str; N]> for OutputSpec {
    fn from(value: [&str; N]) -> Self {
        Self::lines(value)
    }
}

/// Behavior of a simulated process.
///
/// ```
/// use fakeproc::ProcessDefinition;
/// use std::time::Duration;
///
/// let definition = ProcessDefinition::new()
///     .stdout(["* main", "  dev"])
///     .exit_code(0)
///     .delay(Duration::from_millis(50))
///     .occurrences(2);
/// assert_eq!(definition.occurrence_count(), 2);
/// ```
#[derive(Clone)]
pub struct ProcessDefinition {
    pub(crate) stdout: Option<OutputSpec>,
    pub(crate) stderr: Option<OutputSpec>,
    pub(crate) exit_code: i32,
    pub(crate) delay: Option<Duration>,
    pub(crate) callback: Option<ProcessCallback>,
    pub(crate) callback_args: CallbackArgs,
    pub(crate) signal_callback: Option<SignalCallback>,
    pub(crate) stdin_callback: Option<StdinCallback>,
    pub(crate) occurrences: usize,
}

impl ProcessDefinition {
    pub fn new() -> Self {
        Self {
            stdout: None,
            stderr: None,
            exit_code: 0,
            delay: None,
            callback: None,
            callback_args: CallbackArgs::new(),
            signal_callback: None,
            stdin_callback: None,
            occurrences: 1,
        }
    }

    pub fn stdout(mut self, output: impl Into<OutputSpec>) -> Self {
        self.stdout = Some(output.into());
        self
    }

    pub fn stderr(mut self, output: impl Into<OutputSpec>) -> Self {
        self.stderr = Some(output.into());
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Finish the process on a background timer after `delay`.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Run `callback` on a worker thread instead of finishing immediately.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SimulatedProcess, &CallbackArgs) -> std::result::Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn callback_args(mut self, args: CallbackArgs) -> Self {
        self.callback_args = args;
        self
    }

    pub fn callback_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.callback_args.insert(key.into(), value.into());
        self
    }

    pub fn signal_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SimulatedProcess, i32) + Send + Sync + 'static,
    {
        self.signal_callback = Some(Arc::new(callback));
        self
    }

    pub fn stdin_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[u8]) -> StdinReply + Send + Sync + 'static,
    {
        self.stdin_callback = Some(Arc::new(callback));
        self
    }

    /// Queue this many copies of the definition.
    pub fn occurrences(mut self, occurrences: usize) -> Self {
        self.occurrences = occurrences;
        self
    }

    pub fn occurrence_count(&self) -> usize {
        self.occurrences
    }

    pub fn configured_exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn configured_delay(&self) -> Option<Duration> {
        self.delay
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.delay.is_some() && self.callback.is_some() {
            return Err(FakeProcessError::IncorrectDefinition(
                "The 'callback' and 'delay' arguments cannot be used together. \
                 Add a sleep to your callback instead."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ProcessDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProcessDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessDefinition")
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("exit_code", &self.exit_code)
            .field("delay", &self.delay)
            .field("callback", &self.callback.is_some())
            .field("callback_args", &self.callback_args)
            .field("signal_callback", &self.signal_callback.is_some())
            .field("stdin_callback", &self.stdin_callback.is_some())
            .field("occurrences", &self.occurrences)
            .finish()
    }
}

/// A registered definition shared by all of its queued copies
#[derive(Debug)]
pub(crate) struct QueuedDefinition {
    pub(crate) pattern: Command,
    pub(crate) definition: Arc<ProcessDefinition>,
    pub(crate) recorder: ProcessRecorder,
}

/// One slot in a definition queue
#[derive(Clone, Debug)]
pub(crate) enum Entry {
    Simulated(Arc<QueuedDefinition>),
    PassThrough,
}

/// FIFO of entries registered for one pattern
#[derive(Clone, Debug, Default)]
pub(crate) struct DefinitionQueue {
    entries: VecDeque<Entry>,
}

impl DefinitionQueue {
    pub(crate) fn push(&mut self, entry: Entry, count: usize) {
        self.entries.extend(std::iter::repeat_n(entry, count));
    }

    /// Pop the head; with `keep_last` the final entry is put back.
    pub(crate) fn pop(&mut self, keep_last: bool) -> Option<Entry> {
        let entry = self.entries.pop_front()?;
        if self.entries.is_empty() && keep_last {
            self.entries.push_back(entry.clone());
        }
        Some(entry)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered pattern -> queue map of one scope.
///
/// Insertion order decides which pattern wins when several match.
#[derive(Clone, Debug, Default)]
pub(crate) struct DefinitionMap {
    entries: Vec<(Command, DefinitionQueue)>,
}

impl DefinitionMap {
    pub(crate) fn queue_mut(&mut self, pattern: Command) -> &mut DefinitionQueue {
        let idx = match self.entries.iter().position(|(p, _)| *p == pattern) {
            Some(idx) => idx,
            None => {
                self.entries.push((pattern, DefinitionQueue::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    /// Consume one entry from the first pattern matching `invocation`.
    ///
    /// An emptied queue is removed unless `keep_last` pinned its last entry.
    pub(crate) fn consume(&mut self, invocation: &Invocation, keep_last: bool) -> Option<Entry> {
        let idx = self
            .entries
            .iter()
            .position(|(pattern, queue)| !queue.is_empty() && pattern.matches_invocation(invocation))?;
        let entry = self.entries[idx].1.pop(keep_last);
        if self.entries[idx].1.is_empty() {
            let (pattern, _) = self.entries.remove(idx);
            tracing::trace!(%pattern, "definition queue exhausted");
        }
        entry
    }

    pub(crate) fn pending(&self, pattern: &Command) -> usize {
        self.entries
            .iter()
            .find(|(p, _)| p == pattern)
            .map_or(0, |(_, queue)| queue.len())
    }

    pub(crate) fn patterns(&self) -> Vec<Command> {
        self.entries.iter().map(|(p, _)| p.clone()).collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
