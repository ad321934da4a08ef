// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Task executor backends.
//!
//! The engine never runs a wrapped tool itself. It hands a bound
//! [`TaskRequest`](crate::traits::TaskRequest) to a
//! [`TaskExecutor`](crate::traits::TaskExecutor) and records the completion.
//! Real executors (local processes, containers, remote workers) live outside
//! this crate.
//!
//! # Stub Backend
//! In-process executors for dry runs and tests:
//! - **StubExecutor**: Reports every declared output at its expected location
//! - **FailingExecutor**: Fails selected tasks to exercise failure handling
//! - **NoOutputExecutor**: Succeeds without reporting outputs
//! - **RecordingExecutor**: Keeps every request and the peak concurrency
//!
//! ```rust
//! use recipe_dag::backends::stub::StubExecutor;
//! use recipe_dag::traits::TaskExecutor;
//!
//! let executor = StubExecutor::new();
//! assert_eq!(executor.name(), "stub");
//! ```

pub mod stub;
