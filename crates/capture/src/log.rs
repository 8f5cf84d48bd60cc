// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-scope call log with an optional JSONL mirror.

use crate::interaction::{CapturedCall, CapturedOutcome};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Append-only JSONL sink. Several logs may point at the same file.
struct JsonlMirror {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlMirror {
    fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    fn append(&mut self, call: &CapturedCall) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, call)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

struct LogInner {
    start: Instant,
    calls: Mutex<Vec<CapturedCall>>,
    mirror: Option<Mutex<JsonlMirror>>,
}

/// Ordered log of invocations answered by one registry scope.
///
/// Clones share the same underlying log.
#[derive(Clone)]
pub struct CallLog {
    inner: Arc<LogInner>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::from_parts(None)
    }

    /// Log that also appends every record to the JSONL file at `path`.
    ///
    /// The file is created if missing and never truncated.
    pub fn with_file(path: &Path) -> io::Result<Self> {
        Ok(Self::from_parts(Some(JsonlMirror::open(path)?)))
    }

    fn from_parts(mirror: Option<JsonlMirror>) -> Self {
        Self {
            inner: Arc::new(LogInner {
                start: Instant::now(),
                calls: Mutex::new(Vec::new()),
                mirror: mirror.map(Mutex::new),
            }),
        }
    }

    /// Append an invocation and return its sequence number.
    ///
    /// A failed mirror write is reported through `tracing`; the in-memory
    /// record is kept either way.
    pub fn record(&self, args: Vec<String>, shell: bool, outcome: CapturedOutcome) -> u64 {
        let mut calls = self.inner.calls.lock();
        let seq = calls.len() as u64;
        calls.push(CapturedCall {
            seq,
            timestamp: SystemTime::now(),
            elapsed: self.inner.start.elapsed(),
            args,
            shell,
            outcome,
        });

        if let (Some(mirror), Some(call)) = (&self.inner.mirror, calls.last()) {
            let mut mirror = mirror.lock();
            if let Err(err) = mirror.append(call) {
                tracing::warn!(
                    path = %mirror.path.display(),
                    seq,
                    error = %err,
                    "failed to mirror call"
                );
            }
        }
        seq
    }

    pub fn calls(&self) -> Vec<CapturedCall> {
        self.inner.calls.lock().clone()
    }

    /// Number of calls accepted by `pred`.
    pub fn count(&self, pred: impl Fn(&CapturedCall) -> bool) -> usize {
        self.inner.calls.lock().iter().filter(|c| pred(c)).count()
    }

    /// Calls that were forwarded to the real launcher, in order.
    pub fn passed_through(&self) -> Vec<CapturedCall> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|c| matches!(c.outcome, CapturedOutcome::PassedThrough { .. }))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.calls.lock().is_empty()
    }
}

impl Default for CallLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("CallLog");
        out.field("len", &self.len());
        if let Some(mirror) = &self.inner.mirror {
            out.field("mirror", &mirror.lock().path);
        }
        out.finish()
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
