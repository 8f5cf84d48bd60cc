// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-registration record of the processes a definition produced.

use crate::command::IntoCommand;
use crate::error::Result;
use crate::process::SimulatedProcess;
use parking_lot::Mutex;
use std::sync::Arc;

/// Processes produced by one `register` call, in creation order.
///
/// Clones share the same list; the handle returned from `register` keeps
/// observing processes launched after it was taken.
#[derive(Clone, Debug, Default)]
pub struct ProcessRecorder {
    calls: Arc<Mutex<Vec<SimulatedProcess>>>,
}

impl ProcessRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, process: SimulatedProcess) {
        self.calls.lock().push(process);
    }

    pub fn calls(&self) -> Vec<SimulatedProcess> {
        self.calls.lock().clone()
    }

    pub fn first_call(&self) -> Option<SimulatedProcess> {
        self.calls.lock().first().cloned()
    }

    pub fn last_call(&self) -> Option<SimulatedProcess> {
        self.calls.lock().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn was_called(&self) -> bool {
        !self.calls.lock().is_empty()
    }

    /// Processes whose invocation matches `pattern`.
    pub fn matching_calls(&self, pattern: impl IntoCommand) -> Result<Vec<SimulatedProcess>> {
        let pattern = pattern.into_command()?;
        Ok(self
            .calls
            .lock()
            .iter()
            .filter(|p| pattern.matches_invocation(p.args()))
            .cloned()
            .collect())
    }

    pub fn call_count_matching(&self, pattern: impl IntoCommand) -> Result<usize> {
        Ok(self.matching_calls(pattern)?.len())
    }

    pub fn was_called_with(&self, pattern: impl IntoCommand) -> Result<bool> {
        Ok(self.call_count_matching(pattern)? > 0)
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
