// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The recipe definition: declared inputs, task nodes and output routes.
//!
//! A [`DagGraph`] is plain data. It is built once (from YAML or in code),
//! shared behind an `Arc`, and never mutated by validation, planning or
//! execution. All per-run state lives in
//! [`RunContext`](crate::engine::RunContext).
//!
//! # Example
//! ```yaml
//! name: annual-daylight-en17037
//! inputs:
//!   - name: model
//!     kind: file
//!     extensions: [json, hbjson]
//!   - name: wea
//!     kind: file
//!     extensions: [wea]
//! tasks:
//!   - name: run_annual_daylight
//!     template: annual-daylight
//!     sub_folder: annual_daylight
//!     parameters:
//!       model: { input: model }
//!       wea: { input: wea }
//!     returns:
//!       - from: results
//!         to: ../results
//! outputs:
//!   - name: results
//!     kind: folder
//!     source: { path: results }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::task::TaskNode;
use crate::config::value::{Alias, ValueDescriptor, ValueKind};

/// What an output route points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteSource {
    /// A named output of a task, optionally narrowed to a sub-path.
    TaskOutput {
        task: String,
        output: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sub_path: Option<String>,
    },
    /// A path under the graph's result root, surfaced by a task's `returns`.
    Path { path: String },
}

impl RouteSource {
    pub fn task_output(task: impl Into<String>, output: impl Into<String>) -> Self {
        RouteSource::TaskOutput {
            task: task.into(),
            output: output.into(),
            sub_path: None,
        }
    }

    pub fn task_output_at(
        task: impl Into<String>,
        output: impl Into<String>,
        sub_path: impl Into<String>,
    ) -> Self {
        RouteSource::TaskOutput {
            task: task.into(),
            output: output.into(),
            sub_path: Some(sub_path.into()),
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        RouteSource::Path { path: path.into() }
    }
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSource::TaskOutput {
                task,
                output,
                sub_path: Some(sub_path),
            } => write!(f, "{}.{}/{}", task, output, sub_path),
            RouteSource::TaskOutput { task, output, .. } => write!(f, "{}.{}", task, output),
            RouteSource::Path { path } => write!(f, "{}", path),
        }
    }
}

/// A declared output of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRoute {
    pub name: String,
    pub kind: ValueKind,
    pub source: RouteSource,
    /// Where consumers find the output under the run root. Defaults to the
    /// route name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<Alias>,
}

impl OutputRoute {
    pub fn new(name: impl Into<String>, kind: ValueKind, source: RouteSource) -> Self {
        Self {
            name: name.into(),
            kind,
            source,
            destination: None,
            description: None,
            alias: Vec::new(),
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn destination(&self) -> &str {
        self.destination.as_deref().unwrap_or(&self.name)
    }
}

/// A recipe: ordered inputs, ordered tasks, ordered output routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagGraph {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub inputs: Vec<ValueDescriptor>,
    #[serde(default)]
    pub tasks: Vec<TaskNode>,
    #[serde(default)]
    pub outputs: Vec<OutputRoute>,
}

impl DagGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            inputs: Vec::new(),
            tasks: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: ValueDescriptor) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_task(mut self, task: TaskNode) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn with_output(mut self, output: OutputRoute) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn input(&self, name: &str) -> Option<&ValueDescriptor> {
        self.inputs.iter().find(|input| input.name == name)
    }

    pub fn task(&self, name: &str) -> Option<&TaskNode> {
        self.tasks.iter().find(|task| task.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputRoute> {
        self.outputs.iter().find(|output| output.name == name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|task| task.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Source;

    #[test]
    fn test_route_destination_defaults_to_name() {
        let route = OutputRoute::new(
            "results",
            ValueKind::Folder,
            RouteSource::task_output("simulate", "results"),
        );
        assert_eq!(route.destination(), "results");
        assert_eq!(route.with_destination("raw/results").destination(), "raw/results");
    }

    #[test]
    fn test_route_source_yaml_shapes() {
        let direct: RouteSource =
            serde_yaml::from_str("{ task: simulate, output: results, sub_path: grid_1 }")
                .unwrap();
        assert_eq!(
            direct,
            RouteSource::task_output_at("simulate", "results", "grid_1")
        );

        let by_path: RouteSource = serde_yaml::from_str("{ path: results }").unwrap();
        assert_eq!(by_path, RouteSource::path("results"));
    }

    #[test]
    fn test_lookup_helpers() {
        let graph = DagGraph::new("demo")
            .with_input(ValueDescriptor::new("epw", ValueKind::File))
            .with_task(
                TaskNode::new("convert_epw", "convert-epw")
                    .with_parameter("epw", Source::input("epw")),
            )
            .with_output(OutputRoute::new(
                "wea",
                ValueKind::File,
                RouteSource::task_output("convert_epw", "wea"),
            ));

        assert!(graph.input("epw").is_some());
        assert!(graph.task("convert_epw").is_some());
        assert!(graph.output("wea").is_some());
        assert!(graph.task("simulate").is_none());
        assert_eq!(graph.task_names().collect::<Vec<_>>(), vec!["convert_epw"]);
    }
}
