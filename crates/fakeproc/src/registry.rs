// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Registry scopes: the definitions one test registers and the calls they served.

use crate::command::{Command, IntoCommand, Invocation};
use crate::config::ScopeConfig;
use crate::definition::{DefinitionMap, Entry, ProcessDefinition, QueuedDefinition};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::recorder::ProcessRecorder;
use fakeproc_capture::{CallLog, CapturedCall, CapturedOutcome};
use parking_lot::Mutex;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a registry scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

struct ScopeState {
    definitions: DefinitionMap,
    allow_unregistered: bool,
    keep_last_process: bool,
}

struct ScopeInner {
    id: ScopeId,
    state: Mutex<ScopeState>,
    calls: CallLog,
}

/// A registry scope.
///
/// Holds ordered pattern -> definition queues and logs every invocation it
/// answers. Enter it with [`FakeProcess::enter`] to start intercepting.
///
/// ```
/// use fakeproc::{FakeProcess, ProcessDefinition};
///
/// let fp = FakeProcess::new();
/// let recorder = fp
///     .register(["git", "branch"], ProcessDefinition::new().stdout("* main"))
///     .unwrap();
/// assert!(!recorder.was_called());
/// ```
#[derive(Clone)]
pub struct FakeProcess {
    inner: Arc<ScopeInner>,
}

impl FakeProcess {
    pub fn new() -> Self {
        Self::build(&ScopeConfig::default(), CallLog::new())
    }

    /// Build a scope from `config`, opening its capture file if one is set.
    pub fn with_config(config: ScopeConfig) -> Result<Self> {
        let calls = match &config.capture_file {
            Some(path) => CallLog::with_file(path)?,
            None => CallLog::new(),
        };
        Ok(Self::build(&config, calls))
    }

    /// Build a scope from `FAKEPROC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ScopeConfig::from_env())
    }

    fn build(config: &ScopeConfig, calls: CallLog) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)),
                state: Mutex::new(ScopeState {
                    definitions: DefinitionMap::default(),
                    allow_unregistered: config.allow_unregistered,
                    keep_last_process: config.keep_last_process,
                }),
                calls,
            }),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Append `definition.occurrence_count()` copies of the definition to the
    /// queue for `command`.
    ///
    /// The returned recorder is shared by all copies.
    pub fn register(
        &self,
        command: impl IntoCommand,
        definition: ProcessDefinition,
    ) -> Result<ProcessRecorder> {
        let pattern = command.into_command()?;
        definition.validate()?;
        let occurrences = definition.occurrences;
        let recorder = ProcessRecorder::new();
        let entry = Entry::Simulated(Arc::new(QueuedDefinition {
            pattern: pattern.clone(),
            definition: Arc::new(definition),
            recorder: recorder.clone(),
        }));
        tracing::debug!(scope = %self.inner.id, %pattern, occurrences, "registered process");
        self.inner
            .state
            .lock()
            .definitions
            .queue_mut(pattern)
            .push(entry, occurrences);
        Ok(recorder)
    }

    /// Alias of [`FakeProcess::register`].
    pub fn register_subprocess(
        &self,
        command: impl IntoCommand,
        definition: ProcessDefinition,
    ) -> Result<ProcessRecorder> {
        self.register(command, definition)
    }

    /// Forward the next `occurrences` matching invocations to the real launcher.
    pub fn pass_through(&self, command: impl IntoCommand, occurrences: usize) -> Result<()> {
        let pattern = command.into_command()?;
        tracing::debug!(scope = %self.inner.id, %pattern, occurrences, "registered pass-through");
        self.inner
            .state
            .lock()
            .definitions
            .queue_mut(pattern)
            .push(Entry::PassThrough, occurrences);
        Ok(())
    }

    /// Let unmatched invocations reach the real launcher.
    pub fn allow_unregistered(&self, allow: bool) {
        self.inner.state.lock().allow_unregistered = allow;
    }

    /// Keep the last definition of each pattern matching indefinitely.
    pub fn keep_last_process(&self, keep: bool) {
        self.inner.state.lock().keep_last_process = keep;
    }

    pub fn allows_unregistered(&self) -> bool {
        self.inner.state.lock().allow_unregistered
    }

    pub fn keeps_last_process(&self) -> bool {
        self.inner.state.lock().keep_last_process
    }

    /// Number of logged invocations matching `command`.
    pub fn call_count(&self, command: impl IntoCommand) -> Result<usize> {
        let pattern = command.into_command()?;
        Ok(self.inner.calls.count(|call| pattern.matches(&call.args)))
    }

    /// Every invocation this scope answered, in order.
    pub fn calls(&self) -> Vec<CapturedCall> {
        self.inner.calls.calls()
    }

    /// Invocations this scope forwarded to the real launcher, in order.
    pub fn passed_through_calls(&self) -> Vec<CapturedCall> {
        self.inner.calls.passed_through()
    }

    pub fn call_log(&self) -> &CallLog {
        &self.inner.calls
    }

    /// Patterns that still have queued definitions, in registration order.
    pub fn registered_patterns(&self) -> Vec<Command> {
        self.inner.state.lock().definitions.patterns()
    }

    /// Number of queued entries left for `command`.
    pub fn pending(&self, command: impl IntoCommand) -> Result<usize> {
        let pattern = command.into_command()?;
        Ok(self.inner.state.lock().definitions.pending(&pattern))
    }

    /// Enter the scope on the process-wide dispatcher.
    pub fn enter(&self) -> ScopeGuard {
        self.enter_with(Dispatcher::global())
    }

    /// Enter the scope on `dispatcher`; leaving happens when the guard drops.
    pub fn enter_with(&self, dispatcher: &Arc<Dispatcher>) -> ScopeGuard {
        let token = dispatcher.register(self);
        ScopeGuard {
            scope: self.clone(),
            dispatcher: Arc::clone(dispatcher),
            token,
            closed: false,
        }
    }

    pub(crate) fn snapshot(&self) -> DefinitionMap {
        self.inner.state.lock().definitions.clone()
    }

    pub(crate) fn restore(&self, definitions: DefinitionMap) {
        self.inner.state.lock().definitions = definitions;
    }

    /// Consume the entry answering `invocation`, if this scope has one.
    pub(crate) fn take_entry(&self, invocation: &Invocation) -> Option<Entry> {
        let mut state = self.inner.state.lock();
        let keep_last = state.keep_last_process;
        state.definitions.consume(invocation, keep_last)
    }

    pub(crate) fn log_call(&self, invocation: &Invocation, outcome: CapturedOutcome) {
        let pid = outcome.pid();
        let seq = self
            .inner
            .calls
            .record(invocation.args().to_vec(), invocation.is_shell(), outcome);
        tracing::trace!(scope = %self.inner.id, seq, pid, "call logged");
    }
}

impl Default for FakeProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FakeProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("FakeProcess")
            .field("id", &self.inner.id)
            .field("patterns", &state.definitions.patterns())
            .field("allow_unregistered", &state.allow_unregistered)
            .field("keep_last_process", &state.keep_last_process)
            .field("calls", &self.inner.calls.len())
            .finish()
    }
}

/// An entered scope; leaves the dispatcher when dropped.
///
/// Dereferences to the [`FakeProcess`] so definitions can be registered
/// through the guard.
pub struct ScopeGuard {
    scope: FakeProcess,
    dispatcher: Arc<Dispatcher>,
    token: u64,
    closed: bool,
}

impl ScopeGuard {
    pub fn scope(&self) -> &FakeProcess {
        &self.scope
    }

    /// Leave the scope now, reporting deregistration failures.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.dispatcher.deregister(self.token)
    }
}

impl Deref for ScopeGuard {
    type Target = FakeProcess;

    fn deref(&self) -> &FakeProcess {
        &self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.dispatcher.deregister(self.token) {
            tracing::warn!(scope = %self.scope.id(), error = %err, "failed to leave scope");
        }
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("scope", &self.scope.id())
            .field("token", &self.token)
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
