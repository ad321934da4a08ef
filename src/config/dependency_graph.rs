// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::config::{EntryPoints, TaskNode};

/// Dependency edges inferred from task parameter sources and `needs` hints.
///
/// Edges are computed once from the task list and kept apart from the nodes,
/// so the recipe itself stays an immutable value. Both directions are
/// stored: `dependencies` (task → tasks it reads from) and `dependents`
/// (task → tasks that read from it). Lists follow declaration order and hold
/// no duplicates. References to unknown tasks are dropped; validation
/// reports those separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    order: Vec<String>,
    dependencies: HashMap<String, Vec<String>>,
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Infer the edge set from a task list.
    pub fn from_tasks(tasks: &[TaskNode]) -> Self {
        let position: HashMap<&str, usize> = tasks
            .iter()
            .enumerate()
            .rev()
            .map(|(index, task)| (task.name.as_str(), index))
            .collect();

        let mut graph = Self::new();
        for task in tasks {
            if graph.dependencies.contains_key(&task.name) {
                continue;
            }
            graph.order.push(task.name.clone());
            graph.dependencies.insert(task.name.clone(), Vec::new());
            graph.dependents.insert(task.name.clone(), Vec::new());
        }

        for task in tasks {
            let mut referenced: Vec<&str> = task
                .references()
                .filter(|name| position.contains_key(name))
                .collect();
            referenced.sort_by_key(|name| position[name]);
            referenced.dedup();

            for dependency in referenced {
                graph.add_dependency(&task.name, dependency);
            }
        }

        graph
    }

    /// Add an edge: `task` depends on `dependency`.
    pub fn add_dependency(&mut self, task: &str, dependency: &str) {
        let deps = self.dependencies.entry(task.to_string()).or_default();
        if !deps.iter().any(|existing| existing == dependency) {
            deps.push(dependency.to_string());
        }
        let dependents = self.dependents.entry(dependency.to_string()).or_default();
        if !dependents.iter().any(|existing| existing == task) {
            dependents.push(task.to_string());
        }
    }

    /// Tasks `task` reads from
    pub fn dependencies_of(&self, task: &str) -> &[String] {
        self.dependencies.get(task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tasks that read from `task`
    pub fn dependents_of(&self, task: &str) -> &[String] {
        self.dependents.get(task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All task names in declaration order
    pub fn tasks(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tasks with no dependencies, in declaration order.
    pub fn entry_points(&self) -> EntryPoints {
        self.order
            .iter()
            .filter(|task| self.dependencies_of(task).is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .into()
    }

    /// Whether `task` depends on `ancestor`, directly or transitively.
    pub fn depends_on(&self, task: &str, ancestor: &str) -> bool {
        let mut stack: Vec<&str> = vec![task];
        let mut seen: Vec<&str> = Vec::new();
        while let Some(current) = stack.pop() {
            for dependency in self.dependencies_of(current) {
                if dependency == ancestor {
                    return true;
                }
                if !seen.contains(&dependency.as_str()) {
                    seen.push(dependency);
                    stack.push(dependency);
                }
            }
        }
        false
    }
}
