// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors and policies for planning and running a recipe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::BindingError;

/// How the runner reacts when a task fails.
///
/// ```yaml
/// failure_strategy: best_effort
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    /// Finish the stage that saw the failure, then start nothing else.
    #[default]
    FailFast,
    /// Keep running every task that does not depend on a failed one.
    BestEffort,
}

/// Planner failures. Validation rejects every graph that could trigger
/// these, so they indicate an internal inconsistency.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(
        "Internal consistency error: tasks [{}] in '{scope}' never became ready (dependency graph contains cycles)",
        .remaining.join(", ")
    )]
    Inconsistent {
        scope: String,
        remaining: Vec<String>,
    },

    #[error("Internal consistency error: task '{task}' has no resolved template")]
    MissingTemplate { task: String },
}

/// Errors surfaced while running a plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("run inputs are invalid: {}", join_errors(.0))]
    InvalidInputs(Vec<BindingError>),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("task '{task}' failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("task '{task}' could not be bound: {source}")]
    Binding {
        task: String,
        #[source]
        source: BindingError,
    },

    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl ExecutionError {
    /// The task this error is about, if it is about one.
    pub fn task(&self) -> Option<&str> {
        match self {
            ExecutionError::TaskFailed { task, .. } | ExecutionError::Binding { task, .. } => {
                Some(task)
            }
            _ => None,
        }
    }
}

fn join_errors(errors: &[BindingError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
