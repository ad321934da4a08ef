// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::config::ValueKind;

/// Errors that can occur during recipe validation.
///
/// Every variant names the offending task node or output route so an author
/// can fix a definition in one pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two declared inputs share a name
    DuplicateInput { name: String },
    /// Two task nodes share a name
    DuplicateTask { task: String },
    /// Two output routes share a name
    DuplicateOutput { name: String },
    /// The registry has no template for this reference
    UnknownTemplate { task: String, template: String },
    /// A recipe embeds itself, directly or through another recipe
    RecursiveTemplate { task: String, template: String },
    /// A task binds a parameter its template does not declare
    UnknownParameter { task: String, parameter: String },
    /// A required template parameter is left unbound
    MissingParameter { task: String, parameter: String },
    /// A parameter reads a graph input that is not declared
    UnresolvedInput {
        task: String,
        parameter: String,
        input: String,
    },
    /// A parameter (or `needs` entry) names a task that does not exist
    UnresolvedTask {
        task: String,
        parameter: String,
        referenced_task: String,
    },
    /// A parameter reads an output the referenced task's template does not declare
    UnresolvedTaskOutput {
        task: String,
        parameter: String,
        referenced_task: String,
        output: String,
    },
    /// A circular dependency among task nodes
    CyclicDependency {
        /// The cycle path, first node repeated at the end
        cycle: Vec<String>,
    },
    /// An output route that does not land on any task output
    UnresolvedOutputRoute { output: String, source: String },
    /// A path route covered by more than one task return
    AmbiguousOutputRoute {
        output: String,
        path: String,
        candidates: Vec<String>,
    },
    /// A parameter fed a value of the wrong kind
    TypeMismatch {
        task: String,
        parameter: String,
        expected: ValueKind,
        found: ValueKind,
    },
    /// A file parameter fed a file whose extension it does not allow
    ExtensionMismatch {
        task: String,
        parameter: String,
        path: String,
        allowed: Vec<String>,
    },
    /// A literal or default outside the descriptor's constraints
    ConstraintViolation {
        owner: String,
        parameter: String,
        reason: String,
    },
    /// A sub-path that escapes its folder or narrows into a file
    InvalidSubPath {
        owner: String,
        parameter: String,
        sub_path: String,
        reason: String,
    },
    /// A `returns` entry that names an unknown output or escapes the result root
    InvalidReturn {
        task: String,
        output: String,
        reason: String,
    },
    /// A violation inside the recipe a composite task embeds
    Nested {
        task: String,
        error: Box<ValidationError>,
    },
}

impl ValidationError {
    /// The task node or output route the violation is about.
    pub fn subject(&self) -> &str {
        match self {
            ValidationError::DuplicateInput { name } => name,
            ValidationError::DuplicateTask { task } => task,
            ValidationError::DuplicateOutput { name } => name,
            ValidationError::UnknownTemplate { task, .. } => task,
            ValidationError::RecursiveTemplate { task, .. } => task,
            ValidationError::UnknownParameter { task, .. } => task,
            ValidationError::MissingParameter { task, .. } => task,
            ValidationError::UnresolvedInput { task, .. } => task,
            ValidationError::UnresolvedTask { task, .. } => task,
            ValidationError::UnresolvedTaskOutput { task, .. } => task,
            ValidationError::CyclicDependency { cycle } => {
                cycle.first().map(String::as_str).unwrap_or_default()
            }
            ValidationError::UnresolvedOutputRoute { output, .. } => output,
            ValidationError::AmbiguousOutputRoute { output, .. } => output,
            ValidationError::TypeMismatch { task, .. } => task,
            ValidationError::ExtensionMismatch { task, .. } => task,
            ValidationError::ConstraintViolation { owner, .. } => owner,
            ValidationError::InvalidSubPath { owner, .. } => owner,
            ValidationError::InvalidReturn { task, .. } => task,
            ValidationError::Nested { task, .. } => task,
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, ValidationError::CyclicDependency { .. })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateInput { name } => {
                write!(f, "Duplicate input name: '{}'", name)
            }
            ValidationError::DuplicateTask { task } => {
                write!(f, "Duplicate task name: '{}'", task)
            }
            ValidationError::DuplicateOutput { name } => {
                write!(f, "Duplicate output name: '{}'", name)
            }
            ValidationError::UnknownTemplate { task, template } => {
                write!(f, "Task '{}' uses unknown template '{}'", task, template)
            }
            ValidationError::RecursiveTemplate { task, template } => {
                write!(
                    f,
                    "Task '{}' embeds recipe '{}' which is already being expanded",
                    task, template
                )
            }
            ValidationError::UnknownParameter { task, parameter } => {
                write!(
                    f,
                    "Task '{}' binds parameter '{}' which its template does not declare",
                    task, parameter
                )
            }
            ValidationError::MissingParameter { task, parameter } => {
                write!(
                    f,
                    "Task '{}' leaves required parameter '{}' unbound",
                    task, parameter
                )
            }
            ValidationError::UnresolvedInput {
                task,
                parameter,
                input,
            } => {
                write!(
                    f,
                    "Task '{}' parameter '{}' reads input '{}' which does not exist",
                    task, parameter, input
                )
            }
            ValidationError::UnresolvedTask {
                task,
                parameter,
                referenced_task,
            } => {
                write!(
                    f,
                    "Task '{}' parameter '{}' depends on '{}' which does not exist",
                    task, parameter, referenced_task
                )
            }
            ValidationError::UnresolvedTaskOutput {
                task,
                parameter,
                referenced_task,
                output,
            } => {
                write!(
                    f,
                    "Task '{}' parameter '{}' reads output '{}.{}' which does not exist",
                    task, parameter, referenced_task, output
                )
            }
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedOutputRoute { output, source } => {
                write!(
                    f,
                    "Output '{}' routes to '{}' which does not resolve to any task output",
                    output, source
                )
            }
            ValidationError::AmbiguousOutputRoute {
                output,
                path,
                candidates,
            } => {
                write!(
                    f,
                    "Output '{}' path '{}' is returned by more than one task: {}",
                    output,
                    path,
                    candidates.join(", ")
                )
            }
            ValidationError::TypeMismatch {
                task,
                parameter,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Task '{}' parameter '{}' expects a {} but is bound to a {}",
                    task, parameter, expected, found
                )
            }
            ValidationError::ExtensionMismatch {
                task,
                parameter,
                path,
                allowed,
            } => {
                write!(
                    f,
                    "Task '{}' parameter '{}' is bound to '{}' but only allows [{}]",
                    task,
                    parameter,
                    path,
                    allowed.join(", ")
                )
            }
            ValidationError::ConstraintViolation {
                owner,
                parameter,
                reason,
            } => {
                write!(f, "'{}' value for '{}' is invalid: {}", owner, parameter, reason)
            }
            ValidationError::InvalidSubPath {
                owner,
                parameter,
                sub_path,
                reason,
            } => {
                write!(
                    f,
                    "'{}' sub-path '{}' for '{}' is invalid: {}",
                    owner, sub_path, parameter, reason
                )
            }
            ValidationError::InvalidReturn {
                task,
                output,
                reason,
            } => {
                write!(f, "Task '{}' cannot return '{}': {}", task, output, reason)
            }
            ValidationError::Nested { task, error } => {
                write!(f, "In recipe embedded by task '{}': {}", task, error)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
