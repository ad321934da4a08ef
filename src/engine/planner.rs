// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Turning a validated recipe into an ordered list of stages.
//!
//! ## Stage Computation
//!
//! Each scope (the root recipe or an embedded composite) is levelled with
//! Kahn's algorithm over its dependency edges:
//! - Level 0 holds the tasks with no dependencies
//! - Level N holds the tasks whose dependencies all sit in levels 0..N-1
//! - Within a level, tasks keep their declaration order
//!
//! ## Composite Splicing
//!
//! A composite task is replaced by the stages of its inner recipe. A level
//! that holds a composite with `k` inner stages widens to `k` stages: the
//! level's atomic tasks run in the first of them, inner stage `j` runs in
//! the `j`-th. Everything in the next level starts after the widest
//! composite of this one has finished, so every dependency of a step sits
//! in an earlier stage.
//!
//! The plan is a pure function of the validated recipe: the same recipe
//! always yields the same stages.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{AtomicContract, DagGraph, DependencyGraph, ResolvedTemplate, TaskNode, ValidatedGraph};
use crate::engine::TaskPath;
use crate::errors::PlanError;
use crate::observability::messages::engine::{PlanComputed, TopologicalSortFailed};
use crate::observability::messages::StructuredLog;

/// One atomic task placed in a stage.
#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub path: TaskPath,
    /// Folder, relative to the run root, where the task leaves its outputs
    pub work_dir: PathBuf,
    pub contract: Arc<AtomicContract>,
    pub node: TaskNode,
}

/// Tasks that may run concurrently.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    pub steps: Vec<PlannedStep>,
}

/// Where a composite task's inner stages begin and end.
///
/// The runner binds the composite's inputs before `first_stage` and routes
/// its outputs after `last_stage`.
#[derive(Debug, Clone)]
pub struct CompositeSpan {
    pub path: TaskPath,
    pub work_dir: PathBuf,
    pub first_stage: usize,
    pub last_stage: usize,
    pub graph: Arc<DagGraph>,
    pub node: TaskNode,
}

/// Ordered stages for one recipe.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub recipe: String,
    pub stages: Vec<Stage>,
    /// Every spliced composite, innermost before outermost
    pub composites: Vec<CompositeSpan>,
}

impl ExecutionPlan {
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Number of atomic tasks across every stage.
    pub fn step_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.steps.len()).sum()
    }

    pub fn steps(&self) -> impl Iterator<Item = &PlannedStep> {
        self.stages.iter().flat_map(|stage| stage.steps.iter())
    }

    /// Stage index of an atomic task, or the first stage of a composite.
    pub fn stage_of(&self, path: &TaskPath) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.steps.iter().any(|step| &step.path == path))
            .or_else(|| {
                self.composites
                    .iter()
                    .find(|span| &span.path == path)
                    .map(|span| span.first_stage)
            })
    }

    /// Composites whose inputs are bound before `stage` runs, outermost first.
    pub fn composites_opening_at(&self, stage: usize) -> Vec<&CompositeSpan> {
        let mut spans: Vec<&CompositeSpan> = self
            .composites
            .iter()
            .filter(|span| span.first_stage == stage)
            .collect();
        spans.sort_by_key(|span| span.path.depth());
        spans
    }

    /// Composites whose outputs are routed after `stage` runs, innermost first.
    pub fn composites_closing_at(&self, stage: usize) -> Vec<&CompositeSpan> {
        let mut spans: Vec<&CompositeSpan> = self
            .composites
            .iter()
            .filter(|span| span.last_stage == stage)
            .collect();
        spans.sort_by_key(|span| std::cmp::Reverse(span.path.depth()));
        spans
    }

    /// Serializable view of the plan.
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            recipe: self.recipe.clone(),
            stages: self
                .stages
                .iter()
                .map(|stage| stage.steps.iter().map(|step| step.path.to_string()).collect())
                .collect(),
            composites: self
                .composites
                .iter()
                .map(|span| CompositeSummary {
                    task: span.path.to_string(),
                    recipe: span.graph.name.clone(),
                    first_stage: span.first_stage,
                    last_stage: span.last_stage,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub recipe: String,
    pub stages: Vec<Vec<String>>,
    pub composites: Vec<CompositeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeSummary {
    pub task: String,
    pub recipe: String,
    pub first_stage: usize,
    pub last_stage: usize,
}

/// Compute the execution plan for a validated recipe.
///
/// # Errors
/// Only on internal inconsistency; a validated recipe is always plannable.
pub fn plan(validated: &ValidatedGraph) -> Result<ExecutionPlan, PlanError> {
    let mut plan = ExecutionPlan {
        recipe: validated.name().to_string(),
        ..ExecutionPlan::default()
    };
    plan_scope(validated, &TaskPath::root(), Path::new(""), 0, &mut plan)?;

    PlanComputed {
        recipe: &plan.recipe,
        stage_count: plan.stage_count(),
        task_count: plan.step_count(),
        composite_count: plan.composites.len(),
    }
    .log();

    Ok(plan)
}

/// Splice one scope into the plan starting at `first_stage`. Returns the
/// number of stages the scope occupies.
fn plan_scope(
    validated: &ValidatedGraph,
    scope: &TaskPath,
    base_dir: &Path,
    first_stage: usize,
    plan: &mut ExecutionPlan,
) -> Result<usize, PlanError> {
    let scope_name = if scope.is_root() {
        validated.name().to_string()
    } else {
        scope.to_string()
    };
    let levels = compute_topological_levels(validated.dependencies(), &scope_name)?;

    let mut cursor = first_stage;
    for level in levels {
        let mut width = 1;
        for name in level {
            let node = validated
                .graph()
                .task(&name)
                .ok_or_else(|| PlanError::MissingTemplate { task: name.clone() })?;
            let path = scope.child(name.as_str());
            let work_dir = base_dir.join(node.sub_folder());

            match validated.template(&name) {
                Some(ResolvedTemplate::Atomic(contract)) => {
                    push_step(
                        plan,
                        cursor,
                        PlannedStep {
                            path,
                            work_dir,
                            contract: contract.clone(),
                            node: node.clone(),
                        },
                    );
                }
                Some(ResolvedTemplate::Composite(inner)) => {
                    let used = plan_scope(inner, &path, &work_dir, cursor, plan)?.max(1);
                    ensure_stage(plan, cursor + used - 1);
                    plan.composites.push(CompositeSpan {
                        path,
                        work_dir,
                        first_stage: cursor,
                        last_stage: cursor + used - 1,
                        graph: inner.graph().clone(),
                        node: node.clone(),
                    });
                    width = width.max(used);
                }
                None => {
                    return Err(PlanError::MissingTemplate {
                        task: path.to_string(),
                    })
                }
            }
        }
        cursor += width;
    }

    Ok(cursor - first_stage)
}

fn ensure_stage(plan: &mut ExecutionPlan, index: usize) {
    while plan.stages.len() <= index {
        plan.stages.push(Stage::default());
    }
}

fn push_step(plan: &mut ExecutionPlan, index: usize, step: PlannedStep) {
    ensure_stage(plan, index);
    plan.stages[index].steps.push(step);
}

/// Level the tasks of one scope with Kahn's algorithm.
///
/// Returns one vector per level, each in declaration order.
pub fn compute_topological_levels(
    graph: &DependencyGraph,
    scope: &str,
) -> Result<Vec<Vec<String>>, PlanError> {
    let position: HashMap<&str, usize> = graph
        .tasks()
        .enumerate()
        .map(|(index, task)| (task.as_str(), index))
        .collect();

    let mut in_degree: HashMap<&str, usize> = graph
        .tasks()
        .map(|task| (task.as_str(), graph.dependencies_of(task).len()))
        .collect();

    let mut levels = Vec::new();
    let mut current: Vec<&str> = graph
        .entry_points()
        .iter()
        .filter_map(|task| position.get_key_value(task.as_str()).map(|(name, _)| *name))
        .collect();
    let mut placed = 0;

    while !current.is_empty() {
        let mut next = Vec::new();
        for task in &current {
            for dependent in graph.dependents_of(task) {
                let degree = in_degree.get_mut(dependent.as_str()).ok_or_else(|| {
                    PlanError::Inconsistent {
                        scope: scope.to_string(),
                        remaining: vec![dependent.clone()],
                    }
                })?;
                *degree -= 1;
                if *degree == 0 {
                    next.push(dependent.as_str());
                }
            }
        }
        next.sort_by_key(|task| position.get(task).copied().unwrap_or(usize::MAX));

        placed += current.len();
        levels.push(current.iter().map(|task| task.to_string()).collect());
        current = next;
    }

    if placed != graph.len() {
        let remaining: Vec<String> = graph
            .tasks()
            .filter(|task| in_degree.get(task.as_str()).copied().unwrap_or(0) > 0)
            .cloned()
            .collect();
        TopologicalSortFailed {
            scope,
            reason: "dependency graph contains cycles",
        }
        .log();
        return Err(PlanError::Inconsistent {
            scope: scope.to_string(),
            remaining,
        });
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        validate, OutputDescriptor, OutputRoute, RouteSource, Source, TemplateMap,
        ValueDescriptor, ValueKind,
    };

    fn registry() -> TemplateMap {
        let mut templates = TemplateMap::new();
        templates.insert_atomic(
            AtomicContract::new("step")
                .with_parameter(ValueDescriptor::new("input", ValueKind::Folder).optional())
                .with_output(OutputDescriptor::new("out", ValueKind::Folder)),
        );
        templates
    }

    fn names(plan: &ExecutionPlan) -> Vec<Vec<String>> {
        plan.summary().stages
    }

    #[test]
    fn test_diamond_levels() {
        let graph = DagGraph::new("diamond")
            .with_task(TaskNode::new("a", "step"))
            .with_task(TaskNode::new("c", "step").with_parameter("input", Source::output("a", "out")))
            .with_task(TaskNode::new("b", "step").with_parameter("input", Source::output("a", "out")))
            .with_task(
                TaskNode::new("d", "step")
                    .with_parameter("input", Source::output("b", "out"))
                    .with_need("c"),
            );
        let validated = validate(&graph, &registry()).unwrap();
        let plan = plan(&validated).unwrap();

        assert_eq!(names(&plan), vec![vec!["a"], vec!["c", "b"], vec!["d"]]);
        assert_eq!(plan.stage_of(&TaskPath::top("d")), Some(2));
        assert_eq!(plan.steps().next().map(|step| step.work_dir.clone()), Some(PathBuf::from("a")));
    }

    #[test]
    fn test_independent_tasks_share_a_stage_in_declaration_order() {
        let graph = DagGraph::new("flat")
            .with_task(TaskNode::new("z", "step"))
            .with_task(TaskNode::new("y", "step"))
            .with_task(TaskNode::new("x", "step"));
        let validated = validate(&graph, &registry()).unwrap();
        assert_eq!(names(&plan(&validated).unwrap()), vec![vec!["z", "y", "x"]]);
    }

    #[test]
    fn test_composite_is_spliced() {
        let mut templates = registry();
        templates.insert_recipe(
            DagGraph::new("inner")
                .with_task(TaskNode::new("first", "step"))
                .with_task(
                    TaskNode::new("second", "step")
                        .with_parameter("input", Source::output("first", "out")),
                )
                .with_output(OutputRoute::new(
                    "out",
                    ValueKind::Folder,
                    RouteSource::task_output("second", "out"),
                )),
        );
        let graph = DagGraph::new("outer")
            .with_task(TaskNode::new("prepare", "step"))
            .with_task(TaskNode::new("nested", "inner").with_sub_folder("sub"))
            .with_task(
                TaskNode::new("finish", "step").with_parameter("input", Source::output("nested", "out")),
            );

        let validated = validate(&graph, &templates).unwrap();
        let plan = plan(&validated).unwrap();

        assert_eq!(
            names(&plan),
            vec![
                vec!["prepare", "nested/first"],
                vec!["nested/second"],
                vec!["finish"],
            ]
        );
        assert_eq!(plan.composites.len(), 1);
        let span = &plan.composites[0];
        assert_eq!((span.first_stage, span.last_stage), (0, 1));
        assert_eq!(span.work_dir, PathBuf::from("sub"));
        assert_eq!(plan.composites_opening_at(0).len(), 1);
        assert_eq!(plan.composites_closing_at(1).len(), 1);

        let second = plan
            .steps()
            .find(|step| step.path.to_string() == "nested/second")
            .unwrap();
        assert_eq!(second.work_dir, PathBuf::from("sub/second"));
    }

    #[test]
    fn test_empty_composite_occupies_one_stage() {
        let mut templates = registry();
        templates.insert_recipe(DagGraph::new("nothing"));
        let graph = DagGraph::new("outer")
            .with_task(TaskNode::new("noop", "nothing"))
            .with_task(TaskNode::new("after", "step").with_need("noop"));

        let plan = plan(&validate(&graph, &templates).unwrap()).unwrap();
        assert_eq!(plan.stage_count(), 2);
        assert!(plan.stages[0].steps.is_empty());
        assert_eq!(plan.stage_of(&TaskPath::top("after")), Some(1));
    }

    #[test]
    fn test_empty_recipe_has_no_stages() {
        let plan = plan(&validate(&DagGraph::new("empty"), &registry()).unwrap()).unwrap();
        assert_eq!(plan.stage_count(), 0);
        assert_eq!(plan.step_count(), 0);
    }

    #[test]
    fn test_cycle_is_an_internal_inconsistency() {
        let tasks = vec![
            TaskNode::new("a", "step").with_need("b"),
            TaskNode::new("b", "step").with_need("a"),
            TaskNode::new("c", "step"),
        ];
        let error = compute_topological_levels(&DependencyGraph::from_tasks(&tasks), "broken")
            .unwrap_err();
        assert_eq!(
            error,
            PlanError::Inconsistent {
                scope: "broken".into(),
                remaining: vec!["a".into(), "b".into()],
            }
        );
    }
}
