// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for planning and plan execution events.
//!
//! This module contains message types for logging events related to:
//! * Plan computation (stages, composite splicing)
//! * Run lifecycle (start, completion, halt)
//! * Per-task outcomes (success, failure, skip)
//! * Composite scope lifecycle

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use recipe_dag::observability::messages::engine::ExecutionStarted;
///
/// let msg = ExecutionStarted {
///     recipe: "annual-daylight",
///     failure_strategy: "fail_fast",
///     stage_count: 3,
///     task_count: 5,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ExecutionStarted<'a> {
    pub recipe: &'a str,
    pub failure_strategy: &'a str,
    pub stage_count: usize,
    pub task_count: usize,
    pub max_concurrency: usize,
}

impl Display for ExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting run of '{}' ({}): {} tasks in {} stages, max_concurrency={}",
            self.recipe, self.failure_strategy, self.task_count, self.stage_count, self.max_concurrency
        )
    }
}

impl StructuredLog for ExecutionStarted<'_> {
    fn log(&self) {
        tracing::info!(
            recipe = self.recipe,
            failure_strategy = self.failure_strategy,
            stage_count = self.stage_count,
            task_count = self.task_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution",
            span_name = name,
            recipe = self.recipe,
            failure_strategy = self.failure_strategy,
            task_count = self.task_count,
        )
    }
}

/// Run finished. Emitted whether or not every task succeeded.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use recipe_dag::observability::messages::engine::ExecutionCompleted;
/// use std::time::Duration;
///
/// let msg = ExecutionCompleted {
///     recipe: "annual-daylight",
///     succeeded: 4,
///     failed: 1,
///     skipped: 2,
///     duration: Duration::from_millis(250),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ExecutionCompleted<'a> {
    pub recipe: &'a str,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: std::time::Duration,
}

impl Display for ExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run of '{}' completed in {:?}: {} succeeded, {} failed, {} skipped",
            self.recipe, self.duration, self.succeeded, self.failed, self.skipped
        )
    }
}

impl StructuredLog for ExecutionCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            recipe = self.recipe,
            succeeded = self.succeeded,
            failed = self.failed,
            skipped = self.skipped,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution_completed",
            span_name = name,
            recipe = self.recipe,
            duration = ?self.duration,
        )
    }
}

/// Run aborted before any task was attempted.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ExecutionFailed<'a> {
    pub recipe: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Run of '{}' failed: {}", self.recipe, self.error)
    }
}

impl StructuredLog for ExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            recipe = self.recipe,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "execution_failed",
            span_name = name,
            recipe = self.recipe,
            error = %self.error,
        )
    }
}

/// A failure under fail-fast stops the run after the current stage.
///
/// # Log Level
/// `warn!` - Potential issue
pub struct ExecutionHalted {
    pub stage: usize,
    pub remaining_stages: usize,
}

impl Display for ExecutionHalted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Halting after stage {}: {} remaining stages will be skipped",
            self.stage, self.remaining_stages
        )
    }
}

impl StructuredLog for ExecutionHalted {
    fn log(&self) {
        tracing::warn!(
            stage = self.stage,
            remaining_stages = self.remaining_stages,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "execution_halted",
            span_name = name,
            stage = self.stage,
        )
    }
}

/// Stage computation completed for a recipe.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use recipe_dag::observability::messages::engine::PlanComputed;
///
/// let msg = PlanComputed {
///     recipe: "annual-daylight",
///     stage_count: 3,
///     task_count: 7,
///     composite_count: 1,
/// };
///
/// assert_eq!(msg.to_string(), "Planned 'annual-daylight': 7 tasks in 3 stages (1 composites spliced)");
/// ```
pub struct PlanComputed<'a> {
    pub recipe: &'a str,
    pub stage_count: usize,
    pub task_count: usize,
    pub composite_count: usize,
}

impl Display for PlanComputed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Planned '{}': {} tasks in {} stages ({} composites spliced)",
            self.recipe, self.task_count, self.stage_count, self.composite_count
        )
    }
}

impl StructuredLog for PlanComputed<'_> {
    fn log(&self) {
        tracing::info!(
            recipe = self.recipe,
            stage_count = self.stage_count,
            task_count = self.task_count,
            composite_count = self.composite_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "plan_computed",
            span_name = name,
            recipe = self.recipe,
            stage_count = self.stage_count,
        )
    }
}

/// Planner found tasks that never became ready.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct TopologicalSortFailed<'a> {
    pub scope: &'a str,
    pub reason: &'a str,
}

impl Display for TopologicalSortFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Topological sort of '{}' failed: {}", self.scope, self.reason)
    }
}

impl StructuredLog for TopologicalSortFailed<'_> {
    fn log(&self) {
        tracing::error!(
            scope = self.scope,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "topological_sort_failed",
            span_name = name,
            scope = self.scope,
            reason = self.reason,
        )
    }
}

/// Stage started.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct StageStarted {
    pub stage: usize,
    pub task_count: usize,
}

impl Display for StageStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Starting stage {} with {} tasks", self.stage, self.task_count)
    }
}

impl StructuredLog for StageStarted {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            task_count = self.task_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage",
            span_name = name,
            stage = self.stage,
            task_count = self.task_count,
        )
    }
}

/// Task handed to the executor.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct TaskDispatched<'a> {
    pub task: &'a str,
    pub template: &'a str,
    pub executor: &'a str,
}

impl Display for TaskDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatching task '{}' ({}) to {}",
            self.task, self.template, self.executor
        )
    }
}

impl StructuredLog for TaskDispatched<'_> {
    fn log(&self) {
        tracing::debug!(
            task = self.task,
            template = self.template,
            executor = self.executor,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task",
            span_name = name,
            task = self.task,
            template = self.template,
        )
    }
}

/// Task completed successfully.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct TaskSucceeded<'a> {
    pub task: &'a str,
    pub output_count: usize,
}

impl Display for TaskSucceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' succeeded with {} outputs",
            self.task, self.output_count
        )
    }
}

impl StructuredLog for TaskSucceeded<'_> {
    fn log(&self) {
        tracing::debug!(
            task = self.task,
            output_count = self.output_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task_succeeded",
            span_name = name,
            task = self.task,
        )
    }
}

/// Task failed during binding or execution.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use recipe_dag::observability::messages::engine::TaskFailed;
///
/// let msg = TaskFailed {
///     task: "annual_daylight/run_raytracing",
///     reason: "exit status 1",
/// };
///
/// assert_eq!(msg.to_string(), "Task 'annual_daylight/run_raytracing' failed: exit status 1");
/// ```
pub struct TaskFailed<'a> {
    pub task: &'a str,
    pub reason: &'a str,
}

impl Display for TaskFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Task '{}' failed: {}", self.task, self.reason)
    }
}

impl StructuredLog for TaskFailed<'_> {
    fn log(&self) {
        tracing::error!(
            task = self.task,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "task_failed",
            span_name = name,
            task = self.task,
            reason = self.reason,
        )
    }
}

/// Task not attempted.
///
/// # Log Level
/// `warn!` - Potential issue
pub struct TaskSkipped<'a> {
    pub task: &'a str,
    pub reason: &'a str,
}

impl Display for TaskSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping task '{}': {}", self.task, self.reason)
    }
}

impl StructuredLog for TaskSkipped<'_> {
    fn log(&self) {
        tracing::warn!(
            task = self.task,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "task_skipped",
            span_name = name,
            task = self.task,
        )
    }
}

/// A composite task's scope was opened (its inputs bound) or closed (its
/// outputs routed).
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct CompositeScope<'a> {
    pub task: &'a str,
    pub recipe: &'a str,
    pub opened: bool,
}

impl Display for CompositeScope<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let action = if self.opened { "Opened" } else { "Closed" };
        write!(
            f,
            "{} composite '{}' running recipe '{}'",
            action, self.task, self.recipe
        )
    }
}

impl StructuredLog for CompositeScope<'_> {
    fn log(&self) {
        tracing::debug!(
            task = self.task,
            recipe = self.recipe,
            opened = self.opened,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "composite",
            span_name = name,
            task = self.task,
            recipe = self.recipe,
        )
    }
}
