// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Invocation logging for fake-process registry scopes.
//!
//! Every invocation that a scope answers (either with a simulated process or by
//! forwarding it to the real launcher) is appended to that scope's [`CallLog`].
//! The log can optionally be mirrored to a JSONL file for post-mortem debugging.

mod duration_ms;
mod interaction;
mod log;

pub use interaction::{CapturedCall, CapturedOutcome};
pub use log::CallLog;
