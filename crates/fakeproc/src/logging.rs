// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the embedding test binary. [`init_logging`] is a convenience for that.

use crate::config::LogConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr subscriber filtered by `config.filter`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if config.timestamps {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.without_time())
            .try_init()
            .is_ok()
    }
}

/// Initialize logging from the environment.
pub fn init_default_logging() -> bool {
    init_logging(&LogConfig::from_env())
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
