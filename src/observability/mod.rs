// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Message types follow a struct-based pattern with `Display` to keep log
//! strings out of engine code and give every event consistent fields.
//!
//! # Architecture
//!
//! * `messages::engine` - Planning and run lifecycle events
//! * `messages::validation` - Recipe validation warnings and errors
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use tracing_subscriber::EnvFilter;

use crate::config::consts::{DEFAULT_LOG_FILTER, LOG_ENV_VAR};

pub mod messages;

/// Build the log filter: an explicit directive wins, then the
/// `RECIPE_DAG_LOG` environment variable, then the default.
pub fn log_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_env(LOG_ENV_VAR).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing(directive: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_directive_is_used() {
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing(Some("warn"));
        init_tracing(Some("debug"));
    }
}
