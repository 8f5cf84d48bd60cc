// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Launch options shared by real and simulated processes.

use crate::error::{FakeProcessError, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// A caller-owned sink for process output.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Where a standard stream goes
#[derive(Clone, Default)]
pub enum Stdio {
    /// Inherit the parent's stream
    #[default]
    Inherit,
    /// Capture into a pipe readable from the process handle
    Pipe,
    /// Discard
    Null,
    /// stderr only: merge into stdout
    Stdout,
    /// Write into a caller-provided sink
    Writer(SharedWriter),
}

impl Stdio {
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::Writer(Arc::new(Mutex::new(writer)))
    }

    pub fn is_pipe(&self) -> bool {
        matches!(self, Self::Pipe)
    }
}

impl fmt::Debug for Stdio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => f.write_str("Inherit"),
            Self::Pipe => f.write_str("Pipe"),
            Self::Null => f.write_str("Null"),
            Self::Stdout => f.write_str("Stdout"),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Options accepted by every launch entry point
#[derive(Clone, Debug, Default)]
pub struct LaunchOptions {
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
    pub text: Option<bool>,
    pub universal_newlines: Option<bool>,
    pub encoding: Option<String>,
    pub errors: Option<String>,
    pub cwd: Option<PathBuf>,
    /// Replaces the child environment entirely when set
    pub env: Option<BTreeMap<String, String>>,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipe both stdout and stderr.
    pub fn piped() -> Self {
        Self::new().stdout(Stdio::Pipe).stderr(Stdio::Pipe)
    }

    pub fn stdin(mut self, stdin: Stdio) -> Self {
        self.stdin = stdin;
        self
    }

    pub fn stdout(mut self, stdout: Stdio) -> Self {
        self.stdout = stdout;
        self
    }

    pub fn stderr(mut self, stderr: Stdio) -> Self {
        self.stderr = stderr;
        self
    }

    pub fn text(mut self, text: bool) -> Self {
        self.text = Some(text);
        self
    }

    pub fn universal_newlines(mut self, enabled: bool) -> Self {
        self.universal_newlines = Some(enabled);
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn errors(mut self, errors: impl Into<String>) -> Self {
        self.errors = Some(errors.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Streams carry text when any text-related option is set.
    pub fn is_text_mode(&self) -> bool {
        self.text.unwrap_or(false)
            || self.universal_newlines.unwrap_or(false)
            || self.encoding.is_some()
            || self.errors.is_some()
    }

    pub(crate) fn check_text_flags(&self) -> Result<()> {
        if let (Some(text), Some(universal)) = (self.text, self.universal_newlines) {
            if text != universal {
                return Err(FakeProcessError::Subprocess(
                    "Cannot disambiguate when both text and universal_newlines are supplied \
                     but different. Pass one or the other."
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Async launches only deal in bytes.
    pub(crate) fn check_async(&self) -> Result<()> {
        let rejected = [
            ("text", self.text.is_some()),
            ("universal_newlines", self.universal_newlines.is_some()),
            ("encoding", self.encoding.is_some()),
            ("errors", self.errors.is_some()),
        ];
        match rejected.iter().find(|(_, set)| *set) {
            Some((name, _)) => Err(FakeProcessError::InvalidArgument(format!(
                "{name} must not be set for async processes"
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
