// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while turning parameter sources into concrete values.

use thiserror::Error;

/// A parameter (or run input) that could not be given a value at run time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("task '{task}' parameter '{parameter}' has no source and no default")]
    Unbound { task: String, parameter: String },

    #[error("task '{task}' parameter '{parameter}' reads input '{input}' which has no value")]
    InputUnavailable {
        task: String,
        parameter: String,
        input: String,
    },

    #[error(
        "task '{task}' parameter '{parameter}' reads '{source_task}.{output}' which is unavailable ({reason})"
    )]
    UpstreamUnavailable {
        task: String,
        parameter: String,
        source_task: String,
        output: String,
        reason: String,
    },

    #[error("task '{task}' parameter '{parameter}' rejects its input: {reason}")]
    ConstraintViolation {
        task: String,
        parameter: String,
        reason: String,
    },

    #[error("task '{task}' parameter '{parameter}' has invalid sub-path '{sub_path}'")]
    InvalidSubPath {
        task: String,
        parameter: String,
        sub_path: String,
    },

    #[error("required input '{input}' was not provided")]
    MissingInput { input: String },

    #[error("input '{input}' is not declared by the recipe")]
    UnknownInput { input: String },

    #[error("input '{input}' is invalid: {reason}")]
    InvalidInput { input: String, reason: String },
}

impl BindingError {
    /// Whether the binding failed only because an upstream task did not
    /// produce its output.
    pub fn is_upstream(&self) -> bool {
        matches!(self, BindingError::UpstreamUnavailable { .. })
    }
}
