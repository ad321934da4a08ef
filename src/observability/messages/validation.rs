// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for recipe validation warnings and errors.
//!
//! This module contains message types for logging events related to:
//! * Recipe validation lifecycle
//! * Cyclic dependency detection
//! * Composite template expansion
//! * Shared alias warnings

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Cyclic dependency detected in a recipe.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use recipe_dag::observability::messages::validation::CyclicDependencyDetected;
///
/// let cycle = vec!["a", "b", "a"];
/// let msg = CyclicDependencyDetected {
///     recipe: "annual-daylight",
///     cycle: &cycle,
/// };
///
/// assert_eq!(msg.to_string(), "Cyclic dependency detected in 'annual-daylight': a -> b -> a");
/// ```
pub struct CyclicDependencyDetected<'a> {
    pub recipe: &'a str,
    pub cycle: &'a [&'a str],
}

impl Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cyclic dependency detected in '{}': {}",
            self.recipe,
            self.cycle.join(" -> ")
        )
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(
            recipe = self.recipe,
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            recipe = self.recipe,
            cycle = self.cycle.join(" -> "),
        )
    }
}

/// Two or more outputs in one recipe carry the same alias name.
///
/// Aliases are independent views, so this is only a warning.
///
/// # Log Level
/// `warn!` - Potential issue
pub struct SharedAliasDetected<'a> {
    pub recipe: &'a str,
    pub alias: &'a str,
    pub outputs: &'a [&'a str],
}

impl Display for SharedAliasDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Alias '{}' in '{}' is shared by outputs: {}",
            self.alias,
            self.recipe,
            self.outputs.join(", ")
        )
    }
}

impl StructuredLog for SharedAliasDetected<'_> {
    fn log(&self) {
        tracing::warn!(
            recipe = self.recipe,
            alias = self.alias,
            output_count = self.outputs.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            recipe = self.recipe,
            alias = self.alias,
        )
    }
}

/// A composite template is being validated as part of its parent.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct CompositeExpanded<'a> {
    pub task: &'a str,
    pub recipe: &'a str,
    pub depth: usize,
}

impl Display for CompositeExpanded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Validating composite '{}' for task '{}' at depth {}",
            self.recipe, self.task, self.depth
        )
    }
}

impl StructuredLog for CompositeExpanded<'_> {
    fn log(&self) {
        tracing::debug!(
            task = self.task,
            recipe = self.recipe,
            depth = self.depth,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::DEBUG,
            "span_name",
            name = name,
            task = self.task,
            recipe = self.recipe,
            depth = self.depth,
        )
    }
}

/// Recipe validation started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use recipe_dag::observability::messages::validation::ValidationStarted;
///
/// let msg = ValidationStarted {
///     recipe: "annual-daylight",
///     task_count: 5,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ValidationStarted<'a> {
    pub recipe: &'a str,
    pub task_count: usize,
}

impl Display for ValidationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting validation of recipe '{}' with {} tasks",
            self.recipe, self.task_count
        )
    }
}

impl StructuredLog for ValidationStarted<'_> {
    fn log(&self) {
        tracing::info!(
            recipe = self.recipe,
            task_count = self.task_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            recipe = self.recipe,
            task_count = self.task_count,
        )
    }
}

/// Recipe validation completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationCompleted<'a> {
    pub recipe: &'a str,
    pub task_count: usize,
    pub warning_count: usize,
}

impl Display for ValidationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.warning_count > 0 {
            write!(
                f,
                "Recipe '{}' validated with {} tasks and {} warnings",
                self.recipe, self.task_count, self.warning_count
            )
        } else {
            write!(
                f,
                "Recipe '{}' validated successfully with {} tasks",
                self.recipe, self.task_count
            )
        }
    }
}

impl StructuredLog for ValidationCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            recipe = self.recipe,
            task_count = self.task_count,
            warning_count = self.warning_count,
            has_warnings = self.warning_count > 0,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            recipe = self.recipe,
            task_count = self.task_count,
        )
    }
}

/// Recipe validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use recipe_dag::observability::messages::validation::ValidationFailed;
///
/// let msg = ValidationFailed {
///     recipe: "annual-daylight",
///     error_count: 3,
/// };
///
/// assert_eq!(msg.to_string(), "Recipe 'annual-daylight' failed validation with 3 errors");
/// ```
pub struct ValidationFailed<'a> {
    pub recipe: &'a str,
    pub error_count: usize,
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Recipe '{}' failed validation with {} errors",
            self.recipe, self.error_count
        )
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            recipe = self.recipe,
            error_count = self.error_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            recipe = self.recipe,
            error_count = self.error_count,
        )
    }
}
