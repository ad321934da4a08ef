// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Recipe validation for graph integrity and type correctness.
//!
//! Validation turns a parsed [`DagGraph`] into a [`ValidatedGraph`], the only
//! form the planner and runner accept. Every check runs and every violation
//! is collected, so an author sees all problems with a definition at once.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness**: input, task and output names are unique within a graph
//! 2. **Templates**: every task's template resolves through the registry;
//!    composite templates are validated recursively and their errors are
//!    wrapped in [`ValidationError::Nested`]
//! 3. **Bindings**: every bound parameter is declared by the template, every
//!    source resolves, kinds agree, literals satisfy their constraints, and
//!    every required parameter is bound
//! 4. **Returns**: every `returns` entry names a declared output and stays
//!    under the result root
//! 5. **Cycle Detection**: DFS over dependency edges, reporting every cycle
//! 6. **Output Routes**: every route lands on exactly one task output
//!
//! Cycle detection runs over the edges that do resolve even when reference
//! errors exist, so a broken recipe reports its cycles in the same pass.
//!
//! # Algorithms
//!
//! ## Cycle Detection
//! Uses **DFS with a recursion stack** ("three colors") over dependency →
//! dependent edges. Roots and neighbours are visited in declaration order so
//! the reported cycles are deterministic. A task that reads its own output is
//! reported as the two-element cycle `[a, a]`.
//!
//! # Examples
//!
//! ```rust
//! use recipe_dag::config::{
//!     validate, AtomicContract, DagGraph, OutputDescriptor, Source, TaskNode, TemplateMap,
//!     ValueDescriptor, ValueKind,
//! };
//! use recipe_dag::errors::ValidationError;
//!
//! let mut templates = TemplateMap::new();
//! templates.insert_atomic(
//!     AtomicContract::new("echo")
//!         .with_parameter(ValueDescriptor::new("text", ValueKind::String))
//!         .with_output(OutputDescriptor::new("out", ValueKind::File)),
//! );
//!
//! let graph = DagGraph::new("cyclic")
//!     .with_task(TaskNode::new("a", "echo").with_parameter("text", Source::output("b", "out")))
//!     .with_task(TaskNode::new("b", "echo").with_parameter("text", Source::output("a", "out")));
//!
//! let errors = validate(&graph, &templates).unwrap_err();
//! assert!(errors.iter().any(ValidationError::is_cycle));
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::routes::{locate_route, return_destination, RouteLookupError};
use crate::config::{
    AtomicContract, DagGraph, DependencyGraph, Source, TaskNode, Template, ValueDescriptor,
    ValueKind,
};
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    CompositeExpanded, CyclicDependencyDetected, SharedAliasDetected, ValidationCompleted,
    ValidationFailed, ValidationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::TemplateRegistry;
use crate::utils::normalize_relative;

/// A recipe that passed validation, together with everything resolved while
/// checking it.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    graph: Arc<DagGraph>,
    dependencies: DependencyGraph,
    templates: HashMap<String, ResolvedTemplate>,
}

/// The template a task node resolved to.
#[derive(Debug, Clone)]
pub enum ResolvedTemplate {
    Atomic(Arc<AtomicContract>),
    Composite(Box<ValidatedGraph>),
}

impl ResolvedTemplate {
    /// Location of a named output, relative to the task's sub-folder for an
    /// atomic template and to the inner result root for a composite.
    pub fn output_location(&self, output: &str) -> Option<PathBuf> {
        match self {
            ResolvedTemplate::Atomic(contract) => contract
                .output(output)
                .map(|declared| PathBuf::from(declared.location())),
            ResolvedTemplate::Composite(inner) => inner.output_location(output),
        }
    }
}

impl ValidatedGraph {
    pub fn graph(&self) -> &Arc<DagGraph> {
        &self.graph
    }

    pub fn name(&self) -> &str {
        &self.graph.name
    }

    pub fn dependencies(&self) -> &DependencyGraph {
        &self.dependencies
    }

    pub fn template(&self, task: &str) -> Option<&ResolvedTemplate> {
        self.templates.get(task)
    }

    /// Where a declared output lands inside this graph's result root, traced
    /// through nested composites down to the atomic output that produces it.
    pub fn output_location(&self, output: &str) -> Option<PathBuf> {
        let route = self.graph.output(output)?;
        let target = locate_route(&self.graph, route).ok()?;
        let location = self.templates.get(&target.task)?.output_location(&target.output)?;
        Some(match target.sub_path {
            Some(sub_path) => location.join(sub_path),
            None => location,
        })
    }

    /// Total atomic tasks once every composite is expanded.
    pub fn atomic_task_count(&self) -> usize {
        self.templates
            .values()
            .map(|template| match template {
                ResolvedTemplate::Atomic(_) => 1,
                ResolvedTemplate::Composite(inner) => inner.atomic_task_count(),
            })
            .sum()
    }
}

/// Validate a recipe against a template registry.
///
/// Convenience wrapper around [`validate_graph`] for callers holding a
/// borrowed graph.
pub fn validate(
    graph: &DagGraph,
    registry: &dyn TemplateRegistry,
) -> Result<ValidatedGraph, Vec<ValidationError>> {
    validate_graph(Arc::new(graph.clone()), registry)
}

/// Validate a recipe against a template registry.
///
/// # Returns
///
/// * `Ok(ValidatedGraph)` - The recipe is safe to plan and run
/// * `Err(Vec<ValidationError>)` - Every violation found, in pipeline order
pub fn validate_graph(
    graph: Arc<DagGraph>,
    registry: &dyn TemplateRegistry,
) -> Result<ValidatedGraph, Vec<ValidationError>> {
    ValidationStarted {
        recipe: &graph.name,
        task_count: graph.tasks.len(),
    }
    .log();

    let mut validator = Validator {
        registry,
        expanding: vec![graph.name.clone()],
        warnings: 0,
    };
    let result = validator.validate(graph.clone());

    match &result {
        Ok(validated) => ValidationCompleted {
            recipe: &graph.name,
            task_count: validated.atomic_task_count(),
            warning_count: validator.warnings,
        }
        .log(),
        Err(errors) => ValidationFailed {
            recipe: &graph.name,
            error_count: errors.len(),
        }
        .log(),
    }

    result
}

struct Validator<'r> {
    registry: &'r dyn TemplateRegistry,
    /// Recipes currently being expanded, outermost first.
    expanding: Vec<String>,
    warnings: usize,
}

impl Validator<'_> {
    fn validate(&mut self, graph: Arc<DagGraph>) -> Result<ValidatedGraph, Vec<ValidationError>> {
        let mut errors = Vec::new();

        errors.extend(validate_unique_names(&graph));
        errors.extend(validate_input_defaults(&graph));

        let (templates, resolved, template_errors) = self.resolve_templates(&graph);
        errors.extend(template_errors);

        for task in &graph.tasks {
            if let Some(template) = templates.get(task.name.as_str()) {
                errors.extend(validate_bindings(&graph, task, template, &templates, &resolved));
                errors.extend(validate_returns(task, template));
            }
            errors.extend(validate_needs(&graph, task));
        }

        let dependencies = DependencyGraph::from_tasks(&graph.tasks);
        let cycles = detect_cycles(&dependencies);
        for cycle in &cycles {
            let names: Vec<&str> = cycle.iter().map(String::as_str).collect();
            CyclicDependencyDetected {
                recipe: &graph.name,
                cycle: &names,
            }
            .log();
        }
        errors.extend(
            cycles
                .into_iter()
                .map(|cycle| ValidationError::CyclicDependency { cycle }),
        );

        errors.extend(validate_output_routes(&graph, &templates));
        self.warn_shared_aliases(&graph);

        if errors.is_empty() {
            Ok(ValidatedGraph {
                graph,
                dependencies,
                templates: resolved,
            })
        } else {
            Err(errors)
        }
    }

    /// Resolve each task's template, recursing into composites.
    ///
    /// Returns the raw templates (used for binding checks even when a
    /// composite's own contents are broken), the fully resolved templates,
    /// and any errors.
    #[allow(clippy::type_complexity)]
    fn resolve_templates<'g>(
        &mut self,
        graph: &'g DagGraph,
    ) -> (
        HashMap<&'g str, Template>,
        HashMap<String, ResolvedTemplate>,
        Vec<ValidationError>,
    ) {
        let mut templates = HashMap::new();
        let mut resolved = HashMap::new();
        let mut errors = Vec::new();

        for task in &graph.tasks {
            if templates.contains_key(task.name.as_str()) {
                continue;
            }
            let Some(template) = self.registry.resolve(&task.template) else {
                errors.push(ValidationError::UnknownTemplate {
                    task: task.name.clone(),
                    template: task.template.to_string(),
                });
                continue;
            };

            match &template {
                Template::Atomic(contract) => {
                    resolved.insert(task.name.clone(), ResolvedTemplate::Atomic(contract.clone()));
                }
                Template::Composite(inner) => {
                    if self.expanding.contains(&inner.name) {
                        errors.push(ValidationError::RecursiveTemplate {
                            task: task.name.clone(),
                            template: inner.name.clone(),
                        });
                    } else {
                        CompositeExpanded {
                            task: &task.name,
                            recipe: &inner.name,
                            depth: self.expanding.len(),
                        }
                        .log();

                        self.expanding.push(inner.name.clone());
                        let outcome = self.validate(inner.clone());
                        self.expanding.pop();

                        match outcome {
                            Ok(validated) => {
                                resolved.insert(
                                    task.name.clone(),
                                    ResolvedTemplate::Composite(Box::new(validated)),
                                );
                            }
                            Err(inner_errors) => {
                                errors.extend(inner_errors.into_iter().map(|error| {
                                    ValidationError::Nested {
                                        task: task.name.clone(),
                                        error: Box::new(error),
                                    }
                                }));
                            }
                        }
                    }
                }
            }
            templates.insert(task.name.as_str(), template);
        }

        (templates, resolved, errors)
    }

    fn warn_shared_aliases(&mut self, graph: &DagGraph) {
        let mut by_alias: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for route in &graph.outputs {
            for alias in &route.alias {
                by_alias
                    .entry(alias.name.as_str())
                    .or_default()
                    .push(route.name.as_str());
            }
        }
        for (alias, outputs) in by_alias {
            if outputs.len() > 1 {
                SharedAliasDetected {
                    recipe: &graph.name,
                    alias,
                    outputs: &outputs,
                }
                .log();
                self.warnings += 1;
            }
        }
    }
}

/// Inputs, tasks and outputs each need unique names.
fn validate_unique_names(graph: &DagGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for input in &graph.inputs {
        if !seen.insert(input.name.as_str()) {
            errors.push(ValidationError::DuplicateInput {
                name: input.name.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    for task in &graph.tasks {
        if !seen.insert(task.name.as_str()) {
            errors.push(ValidationError::DuplicateTask {
                task: task.name.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    for output in &graph.outputs {
        if !seen.insert(output.name.as_str()) {
            errors.push(ValidationError::DuplicateOutput {
                name: output.name.clone(),
            });
        }
    }

    errors
}

fn validate_input_defaults(graph: &DagGraph) -> Vec<ValidationError> {
    graph
        .inputs
        .iter()
        .filter_map(|input| {
            let default = input.default.as_ref()?;
            input
                .check_literal(default)
                .err()
                .map(|reason| ValidationError::ConstraintViolation {
                    owner: "inputs".to_string(),
                    parameter: input.name.clone(),
                    reason,
                })
        })
        .collect()
}

fn validate_bindings(
    graph: &DagGraph,
    task: &TaskNode,
    template: &Template,
    templates: &HashMap<&str, Template>,
    resolved: &HashMap<String, ResolvedTemplate>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (parameter, source) in &task.parameters {
        let Some(descriptor) = template.parameter(parameter) else {
            errors.push(ValidationError::UnknownParameter {
                task: task.name.clone(),
                parameter: parameter.clone(),
            });
            continue;
        };

        match source {
            Source::Literal { value } => {
                if let Err(reason) = descriptor.check_literal(value) {
                    errors.push(ValidationError::ConstraintViolation {
                        owner: task.name.clone(),
                        parameter: parameter.clone(),
                        reason,
                    });
                }
            }
            Source::Input { input } => match graph.input(input) {
                None => errors.push(ValidationError::UnresolvedInput {
                    task: task.name.clone(),
                    parameter: parameter.clone(),
                    input: input.clone(),
                }),
                Some(declared) => {
                    errors.extend(check_input_feed(task, parameter, descriptor, declared));
                }
            },
            Source::Output {
                task: referenced,
                output,
                sub_path,
            } => {
                if graph.task(referenced).is_none() {
                    errors.push(ValidationError::UnresolvedTask {
                        task: task.name.clone(),
                        parameter: parameter.clone(),
                        referenced_task: referenced.clone(),
                    });
                    continue;
                }
                // Unknown templates were already reported
                let Some(upstream) = templates.get(referenced.as_str()) else {
                    continue;
                };
                let Some(found) = upstream.output_kind(output) else {
                    errors.push(ValidationError::UnresolvedTaskOutput {
                        task: task.name.clone(),
                        parameter: parameter.clone(),
                        referenced_task: referenced.clone(),
                        output: output.clone(),
                    });
                    continue;
                };
                // A composite that failed its own validation has no location
                let location = resolved
                    .get(referenced.as_str())
                    .and_then(|upstream| upstream.output_location(output));
                errors.extend(check_output_feed(
                    task,
                    parameter,
                    descriptor,
                    location.as_deref(),
                    found,
                    sub_path.as_deref(),
                ));
            }
        }
    }

    for descriptor in template.parameters() {
        if descriptor.is_required() && !task.parameters.contains_key(&descriptor.name) {
            errors.push(ValidationError::MissingParameter {
                task: task.name.clone(),
                parameter: descriptor.name.clone(),
            });
        }
    }

    errors
}

/// A graph input feeding a parameter.
fn check_input_feed(
    task: &TaskNode,
    parameter: &str,
    descriptor: &ValueDescriptor,
    declared: &ValueDescriptor,
) -> Option<ValidationError> {
    if !descriptor.kind.accepts(declared.kind) {
        return Some(ValidationError::TypeMismatch {
            task: task.name.clone(),
            parameter: parameter.to_string(),
            expected: descriptor.kind,
            found: declared.kind,
        });
    }
    // An unrestricted input is checked against the parameter when bound
    if descriptor.kind == ValueKind::File
        && !declared.extensions.is_empty()
        && !descriptor.extensions_cover(declared)
    {
        return Some(ValidationError::ExtensionMismatch {
            task: task.name.clone(),
            parameter: parameter.to_string(),
            path: format!("inputs.{}", declared.name),
            allowed: descriptor.extensions.clone(),
        });
    }
    // An open bound is checked against the parameter when bound
    if !descriptor.range_covers(declared) {
        return Some(ValidationError::ConstraintViolation {
            owner: task.name.clone(),
            parameter: parameter.to_string(),
            reason: format!(
                "input '{}' allows [{}, {}] but the parameter allows [{}, {}]",
                declared.name,
                bound_text(declared.minimum),
                bound_text(declared.maximum),
                bound_text(descriptor.minimum),
                bound_text(descriptor.maximum)
            ),
        });
    }
    None
}

fn bound_text(bound: Option<f64>) -> String {
    bound.map_or_else(|| "..".to_string(), |value| value.to_string())
}

/// An upstream task output feeding a parameter. `location` is where the
/// upstream output lands, for atomic and composite tasks alike.
fn check_output_feed(
    task: &TaskNode,
    parameter: &str,
    descriptor: &ValueDescriptor,
    location: Option<&Path>,
    found: ValueKind,
    sub_path: Option<&str>,
) -> Option<ValidationError> {
    let Some(sub_path) = sub_path else {
        if !descriptor.kind.accepts(found) {
            return Some(ValidationError::TypeMismatch {
                task: task.name.clone(),
                parameter: parameter.to_string(),
                expected: descriptor.kind,
                found,
            });
        }
        if descriptor.kind == ValueKind::File {
            if let Some(location) = location.map(|path| path.to_string_lossy()) {
                if !descriptor.allows_extension(&location) {
                    return Some(ValidationError::ExtensionMismatch {
                        task: task.name.clone(),
                        parameter: parameter.to_string(),
                        path: location.to_string(),
                        allowed: descriptor.extensions.clone(),
                    });
                }
            }
        }
        return None;
    };

    let invalid = |reason: &str| ValidationError::InvalidSubPath {
        owner: task.name.clone(),
        parameter: parameter.to_string(),
        sub_path: sub_path.to_string(),
        reason: reason.to_string(),
    };

    if normalize_relative(Path::new(sub_path)).is_none() {
        return Some(invalid("sub-path must stay inside the referenced output"));
    }
    if found == ValueKind::File || !found.is_path_like() {
        return Some(invalid("only folder outputs can be narrowed with a sub-path"));
    }
    if !descriptor.kind.is_path_like() {
        return Some(ValidationError::TypeMismatch {
            task: task.name.clone(),
            parameter: parameter.to_string(),
            expected: descriptor.kind,
            found,
        });
    }
    if descriptor.kind == ValueKind::File && !descriptor.allows_extension(sub_path) {
        return Some(ValidationError::ExtensionMismatch {
            task: task.name.clone(),
            parameter: parameter.to_string(),
            path: sub_path.to_string(),
            allowed: descriptor.extensions.clone(),
        });
    }
    None
}

fn validate_needs(graph: &DagGraph, task: &TaskNode) -> Vec<ValidationError> {
    task.needs
        .iter()
        .filter(|need| graph.task(need).is_none())
        .map(|need| ValidationError::UnresolvedTask {
            task: task.name.clone(),
            parameter: "needs".to_string(),
            referenced_task: need.clone(),
        })
        .collect()
}

fn validate_returns(task: &TaskNode, template: &Template) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for ret in &task.returns {
        if template.output_kind(&ret.from).is_none() {
            errors.push(ValidationError::InvalidReturn {
                task: task.name.clone(),
                output: ret.from.clone(),
                reason: "the template declares no such output".to_string(),
            });
        } else if return_destination(task, &ret.to).is_none() {
            errors.push(ValidationError::InvalidReturn {
                task: task.name.clone(),
                output: ret.from.clone(),
                reason: format!("'{}' does not name a path under the result root", ret.to),
            });
        }
    }
    errors
}

/// Find every cycle in the dependency edges.
///
/// Walks dependency → dependent edges depth-first from each unvisited task
/// in declaration order. A back edge to a node on the current path closes a
/// cycle, reported from that node around to itself. Rotations of a cycle
/// already reported are skipped.
pub fn detect_cycles(dependencies: &DependencyGraph) -> Vec<Vec<String>> {
    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    let mut path = Vec::new();
    let mut cycles = Vec::new();

    for task in dependencies.tasks() {
        if !visited.contains(task.as_str()) {
            dfs_cycle_detection(
                task,
                dependencies,
                &mut visited,
                &mut on_path,
                &mut path,
                &mut cycles,
            );
        }
    }

    let mut seen = HashSet::new();
    cycles.retain(|cycle: &Vec<String>| {
        let mut members: Vec<&String> = cycle[..cycle.len() - 1].iter().collect();
        members.sort();
        members.dedup();
        seen.insert(members.into_iter().cloned().collect::<Vec<_>>())
    });
    cycles
}

fn dfs_cycle_detection<'a>(
    node: &'a str,
    dependencies: &'a DependencyGraph,
    visited: &mut HashSet<&'a str>,
    on_path: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    visited.insert(node);
    on_path.insert(node);
    path.push(node);

    for neighbor in dependencies.dependents_of(node) {
        if on_path.contains(neighbor.as_str()) {
            if let Some(start) = path.iter().position(|entry| *entry == neighbor) {
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(neighbor.clone());
                cycles.push(cycle);
            }
        } else if !visited.contains(neighbor.as_str()) {
            dfs_cycle_detection(neighbor, dependencies, visited, on_path, path, cycles);
        }
    }

    on_path.remove(node);
    path.pop();
}

fn validate_output_routes(
    graph: &DagGraph,
    templates: &HashMap<&str, Template>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for route in &graph.outputs {
        let target = match locate_route(graph, route) {
            Ok(target) => target,
            Err(RouteLookupError::Unresolved) => {
                errors.push(ValidationError::UnresolvedOutputRoute {
                    output: route.name.clone(),
                    source: route.source.to_string(),
                });
                continue;
            }
            Err(RouteLookupError::Ambiguous { candidates }) => {
                errors.push(ValidationError::AmbiguousOutputRoute {
                    output: route.name.clone(),
                    path: route.source.to_string(),
                    candidates,
                });
                continue;
            }
            Err(RouteLookupError::InvalidPath { path }) => {
                errors.push(ValidationError::InvalidSubPath {
                    owner: route.name.clone(),
                    parameter: "source".to_string(),
                    sub_path: path,
                    reason: "route paths must stay under the result root".to_string(),
                });
                continue;
            }
        };

        let Some(template) = templates.get(target.task.as_str()) else {
            continue;
        };
        let Some(found) = template.output_kind(&target.output) else {
            errors.push(ValidationError::UnresolvedOutputRoute {
                output: route.name.clone(),
                source: route.source.to_string(),
            });
            continue;
        };

        match &target.sub_path {
            Some(sub_path) if found == ValueKind::File || !found.is_path_like() => {
                errors.push(ValidationError::InvalidSubPath {
                    owner: route.name.clone(),
                    parameter: "source".to_string(),
                    sub_path: sub_path.display().to_string(),
                    reason: "only folder outputs can be narrowed with a sub-path".to_string(),
                });
            }
            Some(_) => {
                if !route.kind.is_path_like() {
                    errors.push(ValidationError::TypeMismatch {
                        task: route.name.clone(),
                        parameter: "source".to_string(),
                        expected: route.kind,
                        found,
                    });
                }
            }
            None => {
                if !route.kind.accepts(found) {
                    errors.push(ValidationError::TypeMismatch {
                        task: route.name.clone(),
                        parameter: "source".to_string(),
                        expected: route.kind,
                        found,
                    });
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Alias, LiteralValue, OutputDescriptor, OutputRoute, RouteSource, TemplateMap,
    };

    fn registry() -> TemplateMap {
        let mut templates = TemplateMap::new();
        templates.insert_atomic(
            AtomicContract::new("convert")
                .with_parameter(ValueDescriptor::new("epw", ValueKind::File).with_extensions(&["epw"]))
                .with_output(OutputDescriptor::new("wea", ValueKind::File).at("weather.wea")),
        );
        templates.insert_atomic(
            AtomicContract::new("simulate")
                .with_parameter(ValueDescriptor::new("wea", ValueKind::File).with_extensions(&["wea"]))
                .with_parameter(
                    ValueDescriptor::new("grids", ValueKind::Integer)
                        .with_default(LiteralValue::Integer(1))
                        .with_range(Some(1.0), None),
                )
                .with_output(OutputDescriptor::new("results", ValueKind::Folder)),
        );
        templates
    }

    fn pipeline() -> DagGraph {
        DagGraph::new("pipeline")
            .with_input(ValueDescriptor::new("epw", ValueKind::File).with_extensions(&["epw"]))
            .with_task(TaskNode::new("convert", "convert").with_parameter("epw", Source::input("epw")))
            .with_task(
                TaskNode::new("simulate", "simulate")
                    .with_parameter("wea", Source::output("convert", "wea"))
                    .with_return("results", "../results"),
            )
            .with_output(OutputRoute::new(
                "results",
                ValueKind::Folder,
                RouteSource::path("results"),
            ))
    }

    #[test]
    fn test_valid_pipeline() {
        let validated = validate(&pipeline(), &registry()).unwrap();
        assert_eq!(validated.name(), "pipeline");
        assert_eq!(validated.dependencies().dependencies_of("simulate"), ["convert"]);
        assert!(matches!(
            validated.template("convert"),
            Some(ResolvedTemplate::Atomic(_))
        ));
        assert_eq!(validated.atomic_task_count(), 2);
    }

    #[test]
    fn test_empty_graph_is_valid() {
        assert!(validate(&DagGraph::new("empty"), &registry()).is_ok());
    }

    #[test]
    fn test_duplicate_names() {
        let graph = pipeline()
            .with_input(ValueDescriptor::new("epw", ValueKind::File))
            .with_task(TaskNode::new("convert", "convert").with_parameter("epw", Source::input("epw")))
            .with_output(OutputRoute::new(
                "results",
                ValueKind::Folder,
                RouteSource::task_output("simulate", "results"),
            ));

        let errors = validate(&graph, &registry()).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateInput { name: "epw".into() }));
        assert!(errors.contains(&ValidationError::DuplicateTask { task: "convert".into() }));
        assert!(errors.contains(&ValidationError::DuplicateOutput { name: "results".into() }));
    }

    #[test]
    fn test_unknown_template_and_parameter() {
        let graph = DagGraph::new("g")
            .with_task(TaskNode::new("a", "missing"))
            .with_task(
                TaskNode::new("b", "convert")
                    .with_parameter("epw", Source::literal(LiteralValue::Text("w.epw".into())))
                    .with_parameter("colour", Source::literal(LiteralValue::Boolean(true))),
            );

        let errors = validate(&graph, &registry()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownTemplate {
                    task: "a".into(),
                    template: "missing".into()
                },
                ValidationError::UnknownParameter {
                    task: "b".into(),
                    parameter: "colour".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_required_parameter() {
        let graph = DagGraph::new("g").with_task(TaskNode::new("convert", "convert"));
        let errors = validate(&graph, &registry()).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::MissingParameter {
                task: "convert".into(),
                parameter: "epw".into()
            }]
        );
    }

    #[test]
    fn test_unresolved_references() {
        let graph = DagGraph::new("g")
            .with_task(TaskNode::new("convert", "convert").with_parameter("epw", Source::input("nope")))
            .with_task(
                TaskNode::new("simulate", "simulate")
                    .with_parameter("wea", Source::output("convert", "nothing"))
                    .with_need("ghost"),
            )
            .with_task(
                TaskNode::new("again", "simulate").with_parameter("wea", Source::output("ghost", "wea")),
            );

        let errors = validate(&graph, &registry()).unwrap_err();
        assert!(errors.contains(&ValidationError::UnresolvedInput {
            task: "convert".into(),
            parameter: "epw".into(),
            input: "nope".into(),
        }));
        assert!(errors.contains(&ValidationError::UnresolvedTaskOutput {
            task: "simulate".into(),
            parameter: "wea".into(),
            referenced_task: "convert".into(),
            output: "nothing".into(),
        }));
        assert!(errors.contains(&ValidationError::UnresolvedTask {
            task: "simulate".into(),
            parameter: "needs".into(),
            referenced_task: "ghost".into(),
        }));
        assert!(errors.contains(&ValidationError::UnresolvedTask {
            task: "again".into(),
            parameter: "wea".into(),
            referenced_task: "ghost".into(),
        }));
    }

    #[test]
    fn test_type_and_constraint_checks() {
        let graph = DagGraph::new("g")
            .with_input(ValueDescriptor::new("weather", ValueKind::Folder))
            .with_input(ValueDescriptor::new("csv", ValueKind::File).with_extensions(&["csv"]))
            .with_task(
                TaskNode::new("convert", "convert").with_parameter("epw", Source::input("weather")),
            )
            .with_task(TaskNode::new("other", "convert").with_parameter("epw", Source::input("csv")))
            .with_task(
                TaskNode::new("simulate", "simulate")
                    .with_parameter("wea", Source::output("convert", "wea"))
                    .with_parameter("grids", Source::literal(LiteralValue::Integer(0))),
            );

        let errors = validate(&graph, &registry()).unwrap_err();
        assert!(errors.contains(&ValidationError::TypeMismatch {
            task: "convert".into(),
            parameter: "epw".into(),
            expected: ValueKind::File,
            found: ValueKind::Folder,
        }));
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::ExtensionMismatch { task, .. } if task == "other"
        )));
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::ConstraintViolation { owner, parameter, .. }
                if owner == "simulate" && parameter == "grids"
        )));
    }

    #[test]
    fn test_file_output_cannot_take_sub_path() {
        let graph = DagGraph::new("g")
            .with_task(
                TaskNode::new("convert", "convert")
                    .with_parameter("epw", Source::literal(LiteralValue::Text("a.epw".into()))),
            )
            .with_task(
                TaskNode::new("simulate", "simulate")
                    .with_parameter("wea", Source::output_at("convert", "wea", "inner.wea")),
            );

        let errors = validate(&graph, &registry()).unwrap_err();
        assert!(matches!(&errors[..], [ValidationError::InvalidSubPath { owner, .. }] if owner == "simulate"));
    }

    #[test]
    fn test_two_task_cycle_names_both() {
        let graph = DagGraph::new("g")
            .with_task(
                TaskNode::new("a", "simulate").with_parameter("wea", Source::output_at("b", "results", "x.wea")),
            )
            .with_task(
                TaskNode::new("b", "simulate").with_parameter("wea", Source::output_at("a", "results", "x.wea")),
            );

        let errors = validate(&graph, &registry()).unwrap_err();
        let cycles: Vec<&Vec<String>> = errors
            .iter()
            .filter_map(|error| match error {
                ValidationError::CyclicDependency { cycle } => Some(cycle),
                _ => None,
            })
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], &vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        assert_eq!(errors[0].to_string(), "Cyclic dependency detected: a -> b -> a");
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let tasks = vec![TaskNode::new("a", "t").with_need("a")];
        let cycles = detect_cycles(&DependencyGraph::from_tasks(&tasks));
        assert_eq!(cycles, vec![vec!["a".to_string(), "a".to_string()]]);
    }

    #[test]
    fn test_all_cycles_are_reported() {
        let tasks = vec![
            TaskNode::new("a", "t").with_need("b"),
            TaskNode::new("b", "t").with_need("a"),
            TaskNode::new("c", "t").with_need("d"),
            TaskNode::new("d", "t").with_need("c"),
            TaskNode::new("e", "t").with_need("a"),
        ];
        let cycles = detect_cycles(&DependencyGraph::from_tasks(&tasks));
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0], vec!["a", "b", "a"]);
        assert_eq!(cycles[1], vec!["c", "d", "c"]);
    }

    #[test]
    fn test_invalid_returns() {
        let graph = DagGraph::new("g").with_task(
            TaskNode::new("convert", "convert")
                .with_parameter("epw", Source::literal(LiteralValue::Text("a.epw".into())))
                .with_return("nothing", "x")
                .with_return("wea", "../../outside"),
        );
        let errors = validate(&graph, &registry()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|error| matches!(error, ValidationError::InvalidReturn { .. })));
    }

    #[test]
    fn test_output_route_failures() {
        let graph = pipeline()
            .with_task(
                TaskNode::new("copy", "simulate")
                    .with_parameter("wea", Source::output("convert", "wea"))
                    .with_return("results", "../results"),
            )
            .with_output(OutputRoute::new(
                "ghost",
                ValueKind::Folder,
                RouteSource::task_output("nobody", "results"),
            ))
            .with_output(OutputRoute::new(
                "weather",
                ValueKind::Folder,
                RouteSource::task_output("convert", "wea"),
            ));

        let errors = validate(&graph, &registry()).unwrap_err();
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::AmbiguousOutputRoute { output, candidates, .. }
                if output == "results" && candidates.len() == 2
        )));
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::UnresolvedOutputRoute { output, .. } if output == "ghost"
        )));
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::TypeMismatch { task, .. } if task == "weather"
        )));
    }

    #[test]
    fn test_composite_errors_are_nested() {
        let mut templates = registry();
        templates.insert_recipe(
            DagGraph::new("broken").with_task(TaskNode::new("inner", "missing")),
        );
        let graph = DagGraph::new("outer").with_task(TaskNode::new("wrap", "broken"));

        let errors = validate(&graph, &templates).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::Nested {
                task: "wrap".into(),
                error: Box::new(ValidationError::UnknownTemplate {
                    task: "inner".into(),
                    template: "missing".into()
                }),
            }]
        );
    }

    #[test]
    fn test_recursive_composite_is_rejected() {
        let mut templates = registry();
        templates.insert_recipe(DagGraph::new("loop").with_task(TaskNode::new("again", "loop")));
        let graph = DagGraph::new("outer").with_task(TaskNode::new("wrap", "loop"));

        let errors = validate(&graph, &templates).unwrap_err();
        assert!(matches!(
            &errors[..],
            [ValidationError::Nested { error, .. }]
                if matches!(**error, ValidationError::RecursiveTemplate { .. })
        ));
    }

    #[test]
    fn test_shared_alias_is_not_an_error() {
        let mut first = OutputRoute::new("results", ValueKind::Folder, RouteSource::path("results"));
        first.alias.push(Alias {
            name: "grid".into(),
            description: None,
        });
        let mut second = OutputRoute::new(
            "raw",
            ValueKind::Folder,
            RouteSource::task_output("simulate", "results"),
        );
        second.alias.push(Alias {
            name: "grid".into(),
            description: None,
        });

        let mut graph = pipeline();
        graph.outputs = vec![first, second];
        assert!(validate(&graph, &registry()).is_ok());
    }

    #[test]
    fn test_composite_file_output_is_checked_like_an_atomic_one() {
        let mut templates = registry();
        templates.insert_recipe(
            DagGraph::new("weather")
                .with_input(ValueDescriptor::new("epw", ValueKind::File).with_extensions(&["epw"]))
                .with_task(TaskNode::new("convert", "convert").with_parameter("epw", Source::input("epw")))
                .with_output(OutputRoute::new(
                    "wea",
                    ValueKind::File,
                    RouteSource::task_output("convert", "wea"),
                )),
        );
        let graph = DagGraph::new("g")
            .with_input(ValueDescriptor::new("epw", ValueKind::File).with_extensions(&["epw"]))
            .with_task(TaskNode::new("weather", "weather").with_parameter("epw", Source::input("epw")))
            .with_task(
                TaskNode::new("reconvert", "convert").with_parameter("epw", Source::output("weather", "wea")),
            )
            .with_task(
                TaskNode::new("simulate", "simulate").with_parameter("wea", Source::output("weather", "wea")),
            );

        let errors = validate(&graph, &templates).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ExtensionMismatch {
                task: "reconvert".into(),
                parameter: "epw".into(),
                path: "weather.wea".into(),
                allowed: vec!["epw".into()],
            }]
        );

        let mut valid = graph.clone();
        valid.tasks.retain(|task| task.name != "reconvert");
        let validated = validate(&valid, &templates).unwrap();
        assert_eq!(
            validated
                .template("weather")
                .and_then(|template| template.output_location("wea")),
            Some(PathBuf::from("weather.wea"))
        );
    }

    #[test]
    fn test_input_range_must_fit_the_parameter() {
        let graph = |maximum: Option<f64>| {
            DagGraph::new("g")
                .with_input(
                    ValueDescriptor::new("grids", ValueKind::Integer).with_range(Some(1.0), maximum),
                )
                .with_input(ValueDescriptor::new("count", ValueKind::Integer).with_range(Some(0.0), None))
                .with_task(
                    TaskNode::new("simulate", "simulate")
                        .with_parameter("wea", Source::literal(LiteralValue::Text("w.wea".into())))
                        .with_parameter("grids", Source::input("grids")),
                )
                .with_task(
                    TaskNode::new("again", "simulate")
                        .with_parameter("wea", Source::literal(LiteralValue::Text("w.wea".into())))
                        .with_parameter("grids", Source::input("count")),
                )
        };

        let errors = validate(&graph(Some(8.0)), &registry()).unwrap_err();
        assert!(matches!(
            &errors[..],
            [ValidationError::ConstraintViolation { owner, parameter, reason }]
                if owner == "again" && parameter == "grids" && reason.contains("input 'count'")
        ));

        // An unbounded input is left to the run-time check
        let mut open = graph(None);
        open.tasks.retain(|task| task.name == "simulate");
        assert!(validate(&open, &registry()).is_ok());
    }

    #[test]
    fn test_invalid_input_default() {
        let graph = DagGraph::new("g").with_input(
            ValueDescriptor::new("north", ValueKind::Number)
                .with_range(Some(0.0), Some(360.0))
                .with_default(LiteralValue::Integer(400)),
        );
        let errors = validate(&graph, &registry()).unwrap_err();
        assert!(matches!(
            &errors[..],
            [ValidationError::ConstraintViolation { owner, parameter, .. }]
                if owner == "inputs" && parameter == "north"
        ));
    }
}
