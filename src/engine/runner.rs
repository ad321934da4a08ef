// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::config::consts::FALLBACK_MAX_CONCURRENCY;
use crate::config::{LiteralValue, ValidatedGraph};
use crate::engine::binding::{bind, bind_inputs};
use crate::engine::planner::{CompositeSpan, ExecutionPlan, PlannedStep};
use crate::engine::router::{resolve_outputs, OutputResolution};
use crate::engine::{RunContext, TaskPath, TaskRecord, TaskStatus};
use crate::errors::{ExecutionError, FailureStrategy};
use crate::observability::messages::engine::{
    CompositeScope, ExecutionCompleted, ExecutionFailed, ExecutionHalted, ExecutionStarted,
    StageStarted, TaskDispatched, TaskFailed, TaskSkipped, TaskSucceeded,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{TaskCompletion, TaskExecutor, TaskRequest};

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub recipe: String,
    /// Every task and composite that was reached, by qualified path
    pub records: BTreeMap<TaskPath, TaskRecord>,
    /// The root recipe's output routes
    pub outputs: OutputResolution,
    /// Task failures in the order they were observed
    pub failures: Vec<ExecutionError>,
}

impl RunReport {
    /// Every task succeeded and every output route resolved.
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() && self.outputs.is_complete()
    }

    pub fn status(&self, task: &str) -> Option<TaskStatus> {
        self.records
            .iter()
            .find(|(path, _)| path.to_string() == task)
            .map(|(_, record)| record.status)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.records
            .values()
            .filter(|record| record.status == status)
            .count()
    }
}

/// Stage-by-stage runner for execution plans.
///
/// All steps of a stage are bound against the results of earlier stages,
/// then dispatched concurrently (bounded by a semaphore) and awaited before
/// the next stage starts.
///
/// ## Failure Handling
/// - A step whose upstream task failed or was skipped is skipped
/// - Under [`FailureStrategy::FailFast`] the stage that saw a failure is
///   allowed to finish, then every later stage is skipped
/// - Under [`FailureStrategy::BestEffort`] every step that does not depend
///   on a failure still runs
pub struct PlanRunner {
    max_concurrency: usize,
    failure_strategy: FailureStrategy,
    run_root: PathBuf,
}

impl PlanRunner {
    pub fn new(max_concurrency: usize, failure_strategy: FailureStrategy) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            failure_strategy,
            run_root: PathBuf::from("."),
        }
    }

    /// Folder that task work directories and output destinations hang off.
    pub fn with_run_root(mut self, run_root: impl Into<PathBuf>) -> Self {
        self.run_root = run_root.into();
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn failure_strategy(&self) -> FailureStrategy {
        self.failure_strategy
    }

    /// Run a plan against an executor.
    ///
    /// # Errors
    /// * [`ExecutionError::InvalidInputs`] if the run inputs do not satisfy
    ///   the recipe; nothing runs
    /// * [`ExecutionError::InternalError`] if a spawned task panicked
    ///
    /// Task failures do not produce an `Err`; they are in the report.
    pub async fn run(
        &self,
        validated: &ValidatedGraph,
        plan: &ExecutionPlan,
        inputs: &BTreeMap<String, LiteralValue>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Result<RunReport, ExecutionError> {
        let started = Instant::now();
        let recipe = validated.name();

        let bound = bind_inputs(&validated.graph().inputs, inputs).map_err(|errors| {
            let error = ExecutionError::InvalidInputs(errors);
            ExecutionFailed {
                recipe,
                error: &error,
            }
            .log();
            error
        })?;

        ExecutionStarted {
            recipe,
            failure_strategy: strategy_name(self.failure_strategy),
            stage_count: plan.stage_count(),
            task_count: plan.step_count(),
            max_concurrency: self.max_concurrency,
        }
        .log();

        let mut context = RunContext::new(self.run_root.clone());
        context.open_scope(TaskPath::root(), bound);
        let mut failures = Vec::new();
        let mut halted = false;

        for (index, stage) in plan.stages.iter().enumerate() {
            StageStarted {
                stage: index,
                task_count: stage.steps.len(),
            }
            .log();

            let mut stage_failed = false;

            for span in plan.composites_opening_at(index) {
                if halted {
                    skip(&mut context, span.path.clone(), "run halted after an earlier failure");
                    continue;
                }
                if let Err(error) = self.open_composite(span, &mut context) {
                    failures.push(error);
                    stage_failed = true;
                }
            }

            let mut dispatched = Vec::new();
            for step in &stage.steps {
                if halted {
                    skip(&mut context, step.path.clone(), "run halted after an earlier failure");
                    continue;
                }
                match self.prepare(step, &mut context) {
                    Ok(Some(request)) => dispatched.push(request),
                    Ok(None) => {}
                    Err(error) => {
                        failures.push(error);
                        stage_failed = true;
                    }
                }
            }

            for (path, completion) in self.execute_stage(dispatched, &executor).await? {
                let task = path.to_string();
                match completion {
                    TaskCompletion::Succeeded { outputs } => {
                        TaskSucceeded {
                            task: &task,
                            output_count: outputs.len(),
                        }
                        .log();
                        context.record(path, TaskRecord::succeeded(outputs));
                    }
                    TaskCompletion::Failed { reason } => {
                        TaskFailed {
                            task: &task,
                            reason: &reason,
                        }
                        .log();
                        context.record(path, TaskRecord::failed(reason.clone()));
                        failures.push(ExecutionError::TaskFailed { task, reason });
                        stage_failed = true;
                    }
                }
            }

            for span in plan.composites_closing_at(index) {
                self.close_composite(span, &mut context);
            }

            if stage_failed && !halted && self.failure_strategy == FailureStrategy::FailFast {
                ExecutionHalted {
                    stage: index,
                    remaining_stages: plan.stage_count() - index - 1,
                }
                .log();
                halted = true;
            }
        }

        let outputs = resolve_outputs(
            validated.graph(),
            &context.scope_records(&TaskPath::root()),
            &self.run_root,
        );

        ExecutionCompleted {
            recipe,
            succeeded: context.count(TaskStatus::Succeeded),
            failed: context.count(TaskStatus::Failed),
            skipped: context.count(TaskStatus::Skipped),
            duration: started.elapsed(),
        }
        .log();

        Ok(RunReport {
            recipe: recipe.to_string(),
            records: context.records(),
            outputs,
            failures,
        })
    }

    /// Decide whether a step can run and bind its parameters.
    ///
    /// Returns `Ok(None)` when the step was skipped and `Err` when binding
    /// failed for a reason other than a missing upstream result.
    fn prepare(
        &self,
        step: &PlannedStep,
        context: &mut RunContext,
    ) -> Result<Option<TaskRequest>, ExecutionError> {
        let scope = step.path.parent().unwrap_or_default();

        if let Some(reason) = blocked(&scope, &step.node.needs, context) {
            skip(context, step.path.clone(), &reason);
            return Ok(None);
        }

        match bind(&step.node, &step.contract.parameters, &scope, context) {
            Ok(parameters) => Ok(Some(TaskRequest {
                task: step.path.clone(),
                template: step.node.template.clone(),
                work_dir: context.run_root().join(&step.work_dir),
                parameters,
                outputs: step.contract.outputs.clone(),
            })),
            Err(error) if error.is_upstream() => {
                skip(context, step.path.clone(), &error.to_string());
                Ok(None)
            }
            Err(error) => {
                let task = step.path.to_string();
                TaskFailed {
                    task: &task,
                    reason: &error.to_string(),
                }
                .log();
                context.record(step.path.clone(), TaskRecord::failed(error.to_string()));
                Err(ExecutionError::Binding {
                    task,
                    source: error,
                })
            }
        }
    }

    /// Dispatch every prepared request of a stage and wait for all of them.
    ///
    /// Completions come back in dispatch order.
    async fn execute_stage(
        &self,
        requests: Vec<TaskRequest>,
        executor: &Arc<dyn TaskExecutor>,
    ) -> Result<Vec<(TaskPath, TaskCompletion)>, ExecutionError> {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.max_concurrency));
        let mut tasks = Vec::new();

        for request in requests {
            let path = request.task.clone();
            let executor = executor.clone();
            let semaphore = semaphore.clone();
            let span = TaskDispatched {
                task: &path.to_string(),
                template: request.template.as_str(),
                executor: executor.name(),
            }
            .span("execute");

            let task = tokio::spawn(
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| ExecutionError::InternalError {
                            message: format!(
                                "Failed to acquire semaphore permit for task '{}': {}",
                                request.task, e
                            ),
                        })?;

                    let task = request.task.to_string();
                    TaskDispatched {
                        task: &task,
                        template: request.template.as_str(),
                        executor: executor.name(),
                    }
                    .log();

                    Ok::<_, ExecutionError>(executor.execute(request).await)
                }
                .instrument(span),
            );
            tasks.push((path, task));
        }

        let mut completions = Vec::new();
        for (path, task) in tasks {
            match task.await {
                Ok(Ok(completion)) => completions.push((path, completion)),
                Ok(Err(e)) => return Err(e),
                Err(join_error) => {
                    return Err(ExecutionError::InternalError {
                        message: format!("Task join error: {}", join_error),
                    });
                }
            }
        }

        Ok(completions)
    }

    /// Bind a composite's parameters as the inputs of its inner scope.
    fn open_composite(
        &self,
        span: &CompositeSpan,
        context: &mut RunContext,
    ) -> Result<(), ExecutionError> {
        let scope = span.path.parent().unwrap_or_default();

        if let Some(reason) = blocked(&scope, &span.node.needs, context) {
            skip(context, span.path.clone(), &reason);
            return Ok(());
        }

        match bind(&span.node, &span.graph.inputs, &scope, context) {
            Ok(inputs) => {
                CompositeScope {
                    task: &span.path.to_string(),
                    recipe: &span.graph.name,
                    opened: true,
                }
                .log();
                context.open_scope(span.path.clone(), inputs);
                Ok(())
            }
            Err(error) if error.is_upstream() => {
                skip(context, span.path.clone(), &error.to_string());
                Ok(())
            }
            Err(error) => {
                let task = span.path.to_string();
                TaskFailed {
                    task: &task,
                    reason: &error.to_string(),
                }
                .log();
                context.record(span.path.clone(), TaskRecord::failed(error.to_string()));
                Err(ExecutionError::Binding {
                    task,
                    source: error,
                })
            }
        }
    }

    /// Route a composite's inner results to its own outputs.
    ///
    /// The composite's outputs point at the locations its inner tasks
    /// materialized; nothing is copied.
    fn close_composite(&self, span: &CompositeSpan, context: &mut RunContext) {
        // Skipped or failed while opening
        if context.record_of(&span.path).is_some() {
            return;
        }

        let inner = context.scope_records(&span.path);
        let failed: Vec<&str> = inner
            .iter()
            .filter(|(_, record)| record.status == TaskStatus::Failed)
            .map(|(name, _)| name.as_str())
            .collect();
        let skipped = inner
            .values()
            .any(|record| record.status == TaskStatus::Skipped);

        let destination_root = context.run_root().join(&span.work_dir);
        let resolution = resolve_outputs(&span.graph, &inner, &destination_root);
        let outputs: BTreeMap<String, PathBuf> = resolution
            .resolved
            .into_iter()
            .map(|(name, output)| (name, output.materialized))
            .collect();

        let record = if !failed.is_empty() {
            TaskRecord {
                outputs,
                ..TaskRecord::failed(format!("inner tasks failed: {}", failed.join(", ")))
            }
        } else if skipped {
            TaskRecord {
                outputs,
                ..TaskRecord::skipped("inner tasks were skipped")
            }
        } else if let Some((name, missing)) = resolution.unavailable.iter().next() {
            TaskRecord {
                outputs,
                ..TaskRecord::failed(format!("output '{}' unavailable: {}", name, missing.reason))
            }
        } else {
            TaskRecord::succeeded(outputs)
        };

        CompositeScope {
            task: &span.path.to_string(),
            recipe: &span.graph.name,
            opened: false,
        }
        .log();
        context.record(span.path.clone(), record);
    }
}

impl Default for PlanRunner {
    fn default() -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_MAX_CONCURRENCY);
        Self::new(concurrency, FailureStrategy::default())
    }
}

/// Why a task in `scope` with these `needs` cannot start, if it cannot.
fn blocked(scope: &TaskPath, needs: &[String], context: &RunContext) -> Option<String> {
    if !context.is_open(scope) {
        return Some(format!("enclosing composite '{}' did not run", scope));
    }
    needs
        .iter()
        .find(|need| context.status_of(&scope.child(need.as_str())) != Some(TaskStatus::Succeeded))
        .map(|need| format!("needed task '{}' did not succeed", need))
}

fn skip(context: &mut RunContext, path: TaskPath, reason: &str) {
    TaskSkipped {
        task: &path.to_string(),
        reason,
    }
    .log();
    context.record(path, TaskRecord::skipped(reason));
}

fn strategy_name(strategy: FailureStrategy) -> &'static str {
    match strategy {
        FailureStrategy::FailFast => "fail_fast",
        FailureStrategy::BestEffort => "best_effort",
    }
}
