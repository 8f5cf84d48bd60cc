// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background thread that finishes a delayed or callback-driven process.

use crate::error::{BoxError, CallbackError, CallbackPanic, Result};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Completion {
    finished: bool,
    failure: Option<CallbackError>,
}

#[derive(Default)]
struct Shared {
    completion: Mutex<Completion>,
    done: Condvar,
}

/// Handle to one worker thread.
///
/// The outcome of the task is kept after the thread exits so it can be
/// re-raised from every later synchronization point.
pub(crate) struct Worker {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    pub(crate) fn spawn<F>(name: String, task: F) -> Result<Self>
    where
        F: FnOnce() -> std::result::Result<(), BoxError> + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new().name(name).spawn(move || {
            let failure = match std::panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(CallbackError::from(err)),
                Err(payload) => {
                    let panic: CallbackError = Arc::new(CallbackPanic(panic_message(&*payload)));
                    Some(panic)
                }
            };
            if let Some(err) = &failure {
                tracing::debug!(error = %err, "process worker failed");
            }
            let mut completion = thread_shared.completion.lock();
            completion.finished = true;
            completion.failure = failure;
            thread_shared.done.notify_all();
        })?;
        Ok(Self {
            shared,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Block until the task completes or `timeout` elapses.
    ///
    /// Returns whether the task has completed.
    pub(crate) fn join(&self, timeout: Option<Duration>) -> bool {
        let finished = {
            let mut completion = self.shared.completion.lock();
            match timeout {
                None => {
                    while !completion.finished {
                        self.shared.done.wait(&mut completion);
                    }
                }
                Some(timeout) => {
                    let deadline = Instant::now() + timeout;
                    while !completion.finished {
                        if self
                            .shared
                            .done
                            .wait_until(&mut completion, deadline)
                            .timed_out()
                        {
                            break;
                        }
                    }
                }
            }
            completion.finished
        };
        if finished {
            if let Some(handle) = self.handle.lock().take() {
                let _ = handle.join();
            }
        }
        finished
    }

    pub(crate) fn failure(&self) -> Option<CallbackError> {
        self.shared.completion.lock().failure.clone()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
