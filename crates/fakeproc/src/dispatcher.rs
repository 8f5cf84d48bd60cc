// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Routes launch requests through the stack of open scopes.
//!
//! While at least one scope is open the dispatcher's hook is installed on its
//! [`LaunchSeam`]; the launcher it replaced is kept and reinstalled when the
//! last scope leaves. Entering a scope snapshots the definitions of every
//! scope already open, and leaving it restores them.

use crate::command::Invocation;
use crate::definition::{DefinitionMap, Entry, QueuedDefinition};
use crate::error::{FakeProcessError, Result};
use crate::launch::{LaunchFuture, LaunchSeam, Launcher};
use crate::options::LaunchOptions;
use crate::process::{AsyncProcessHandle, AsyncSimulatedProcess, Flavor, ProcessHandle, SimulatedProcess};
use crate::registry::FakeProcess;
use fakeproc_capture::CapturedOutcome;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, Weak};

struct OpenScope {
    token: u64,
    scope: FakeProcess,
}

#[derive(Default)]
struct DispatcherState {
    stack: Vec<OpenScope>,
    snapshots: HashMap<u64, Vec<(FakeProcess, DefinitionMap)>>,
    original: Option<Arc<dyn Launcher>>,
    next_token: u64,
}

impl DispatcherState {
    fn original(&self) -> Result<Arc<dyn Launcher>> {
        self.original
            .clone()
            .ok_or_else(|| FakeProcessError::internal("no original launcher recorded"))
    }
}

/// What an invocation resolved to
enum Selection {
    Simulated { queued: Arc<QueuedDefinition>, pid: u32 },
    Real(Arc<dyn Launcher>),
}

/// Process-wide dispatcher over a stack of registry scopes
pub struct Dispatcher {
    seam: Arc<LaunchSeam>,
    this: Weak<Dispatcher>,
    state: Mutex<DispatcherState>,
    last_pid: AtomicU32,
}

impl Dispatcher {
    pub fn new(seam: Arc<LaunchSeam>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            seam,
            this: this.clone(),
            state: Mutex::new(DispatcherState::default()),
            last_pid: AtomicU32::new(0),
        })
    }

    /// The dispatcher bound to [`LaunchSeam::global`].
    pub fn global() -> &'static Arc<Dispatcher> {
        static GLOBAL: OnceLock<Arc<Dispatcher>> = OnceLock::new();
        GLOBAL.get_or_init(|| Dispatcher::new(Arc::clone(LaunchSeam::global())))
    }

    pub fn seam(&self) -> &Arc<LaunchSeam> {
        &self.seam
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.state.lock().stack.len()
    }

    pub fn is_installed(&self) -> bool {
        self.state.lock().original.is_some()
    }

    pub(crate) fn register(&self, scope: &FakeProcess) -> u64 {
        let mut state = self.state.lock();
        if state.stack.is_empty() {
            let hook: Arc<dyn Launcher> = Arc::new(DispatchHook {
                dispatcher: self.this.clone(),
            });
            state.original = Some(self.seam.install(hook));
            tracing::debug!("dispatch hook installed");
        }
        state.next_token += 1;
        let token = state.next_token;
        let snapshot = state
            .stack
            .iter()
            .map(|open| (open.scope.clone(), open.scope.snapshot()))
            .collect();
        state.snapshots.insert(token, snapshot);
        state.stack.push(OpenScope {
            token,
            scope: scope.clone(),
        });
        tracing::debug!(scope = %scope.id(), depth = state.stack.len(), "scope entered");
        token
    }

    pub(crate) fn deregister(&self, token: u64) -> Result<()> {
        let mut state = self.state.lock();
        let position = state
            .stack
            .iter()
            .position(|open| open.token == token)
            .ok_or_else(|| FakeProcessError::internal(format!("scope entry {token} is not open")))?;
        let open = state.stack.remove(position);
        if let Some(snapshot) = state.snapshots.remove(&token) {
            for (scope, definitions) in snapshot {
                scope.restore(definitions);
            }
        }
        tracing::debug!(scope = %open.scope.id(), depth = state.stack.len(), "scope left");
        if state.stack.is_empty() {
            let original = state
                .original
                .take()
                .ok_or_else(|| FakeProcessError::internal("no original launcher to restore"))?;
            self.seam.install(original);
            tracing::debug!("dispatch hook removed");
        }
        Ok(())
    }

    /// Resolve `invocation` against the open scopes, innermost first.
    fn select(&self, invocation: &Invocation) -> Result<Selection> {
        let state = self.state.lock();
        let innermost = state
            .stack
            .last()
            .ok_or_else(|| FakeProcessError::internal("dispatch with no open scope"))?;

        for open in state.stack.iter().rev() {
            let Some(entry) = open.scope.take_entry(invocation) else {
                continue;
            };
            let pid = self.last_pid.fetch_add(1, Ordering::SeqCst) + 1;
            return match entry {
                Entry::PassThrough => {
                    open.scope
                        .log_call(invocation, CapturedOutcome::PassedThrough { pid });
                    tracing::debug!(command = %invocation, "passing through to real launcher");
                    Ok(Selection::Real(state.original()?))
                }
                Entry::Simulated(queued) => {
                    open.scope
                        .log_call(invocation, CapturedOutcome::Simulated { pid });
                    Ok(Selection::Simulated { queued, pid })
                }
            };
        }

        if innermost.scope.allows_unregistered() {
            tracing::debug!(command = %invocation, "unregistered command allowed");
            return Ok(Selection::Real(state.original()?));
        }
        tracing::debug!(command = %invocation, "unregistered command rejected");
        Err(FakeProcessError::NotRegistered {
            command: invocation.to_string(),
        })
    }

    /// Answer a synchronous launch.
    pub fn dispatch(&self, invocation: Invocation, options: LaunchOptions) -> Result<ProcessHandle> {
        match self.select(&invocation)? {
            Selection::Real(launcher) => launcher.popen(invocation, options),
            Selection::Simulated { queued, pid } => {
                SimulatedProcess::launch(invocation, &queued, pid, &options, Flavor::Sync)
                    .map(ProcessHandle::Simulated)
            }
        }
    }

    /// Answer an async launch.
    pub async fn dispatch_async(
        &self,
        invocation: Invocation,
        options: LaunchOptions,
    ) -> Result<AsyncProcessHandle> {
        match self.select(&invocation)? {
            Selection::Real(launcher) => launcher.spawn_async(invocation, options).await,
            Selection::Simulated { queued, pid } => {
                SimulatedProcess::launch(invocation, &queued, pid, &options, Flavor::Async)
                    .map(|p| AsyncProcessHandle::Simulated(AsyncSimulatedProcess::new(p)))
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Dispatcher")
            .field("depth", &state.stack.len())
            .field("installed", &state.original.is_some())
            .field("last_pid", &self.last_pid.load(Ordering::SeqCst))
            .finish()
    }
}

/// Launcher installed on the seam while scopes are open
struct DispatchHook {
    dispatcher: Weak<Dispatcher>,
}

impl DispatchHook {
    fn dispatcher(&self) -> Result<Arc<Dispatcher>> {
        self.dispatcher
            .upgrade()
            .ok_or_else(|| FakeProcessError::internal("dispatcher dropped while installed"))
    }
}

impl Launcher for DispatchHook {
    fn popen(&self, invocation: Invocation, options: LaunchOptions) -> Result<ProcessHandle> {
        self.dispatcher()?.dispatch(invocation, options)
    }

    fn spawn_async(&self, invocation: Invocation, options: LaunchOptions) -> LaunchFuture<'_> {
        Box::pin(async move {
            let dispatcher = self.dispatcher()?;
            dispatcher.dispatch_async(invocation, options).await
        })
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
