// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Templates: the contract a task executes against.
//!
//! A task's template is either an atomic operation (a wrapped external tool
//! with a parameter list and an output list) or a whole recipe embedded as a
//! sub-DAG. Validation and planning dispatch on [`Template`] rather than on
//! any trait hierarchy.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::graph::DagGraph;
use crate::config::value::{ValueDescriptor, ValueKind};

/// An output an atomic template produces inside its task's sub-folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub name: String,
    pub kind: ValueKind,
    /// Location relative to the task's sub-folder. Defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OutputDescriptor {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            path: None,
            description: None,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn location(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// Signature of an atomic operation: what it takes and what it leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicContract {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ValueDescriptor>,
    #[serde(default)]
    pub outputs: Vec<OutputDescriptor>,
}

impl AtomicContract {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            parameters: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ValueDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_output(mut self, output: OutputDescriptor) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn output(&self, name: &str) -> Option<&OutputDescriptor> {
        self.outputs.iter().find(|output| output.name == name)
    }
}

/// A resolved template.
#[derive(Debug, Clone)]
pub enum Template {
    Atomic(Arc<AtomicContract>),
    Composite(Arc<DagGraph>),
}

impl Template {
    pub fn name(&self) -> &str {
        match self {
            Template::Atomic(contract) => &contract.name,
            Template::Composite(graph) => &graph.name,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Template::Atomic(contract) => contract.version.as_deref(),
            Template::Composite(graph) => graph.version.as_deref(),
        }
    }

    /// Parameters a task bound to this template may set. For a composite
    /// these are the inner graph's declared inputs.
    pub fn parameters(&self) -> &[ValueDescriptor] {
        match self {
            Template::Atomic(contract) => &contract.parameters,
            Template::Composite(graph) => &graph.inputs,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ValueDescriptor> {
        self.parameters().iter().find(|parameter| parameter.name == name)
    }

    /// Kind of a named output. For a composite, the inner graph's routes are
    /// its outputs.
    pub fn output_kind(&self, name: &str) -> Option<ValueKind> {
        match self {
            Template::Atomic(contract) => contract.output(name).map(|output| output.kind),
            Template::Composite(graph) => graph.output(name).map(|route| route.kind),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Template::Composite(_))
    }
}

impl From<AtomicContract> for Template {
    fn from(contract: AtomicContract) -> Self {
        Template::Atomic(Arc::new(contract))
    }
}

impl From<DagGraph> for Template {
    fn from(graph: DagGraph) -> Self {
        Template::Composite(Arc::new(graph))
    }
}
