// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod executor;
pub mod registry;

pub use executor::{TaskCompletion, TaskExecutor, TaskRequest};
pub use registry::TemplateRegistry;
