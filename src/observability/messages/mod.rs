// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] to emit itself with typed fields at its own level.
//!
//! # Organization
//!
//! * `engine` - Planning and plan execution events
//! * `validation` - Recipe validation warnings and errors
//!
//! # Usage Pattern
//!
//! ```rust
//! use recipe_dag::observability::messages::engine::StageStarted;
//! use recipe_dag::observability::messages::StructuredLog;
//!
//! let msg = StageStarted {
//!     stage: 0,
//!     task_count: 5,
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod engine;
pub mod validation;

/// A message that knows its log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
