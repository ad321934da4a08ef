// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod binding;
mod config;
mod execution;
mod loader;

pub use binding::BindingError;
pub use config::ValidationError;
pub use execution::{ExecutionError, FailureStrategy, PlanError};
pub use loader::RecipeError;
