// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::source::Source;

/// Reference to a template in a registry, written `name` or `name@version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRef(pub String);

impl TemplateRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn name(&self) -> &str {
        match self.0.split_once('@') {
            Some((name, _)) => name,
            None => &self.0,
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.0.split_once('@').map(|(_, version)| version)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateRef {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}

/// Copies one of a task's outputs to a path relative to the task's
/// sub-folder once the task completes, e.g. `to: ../results` surfaces it at
/// the recipe's result root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReturn {
    pub from: String,
    pub to: String,
}

/// One unit of work in a recipe.
///
/// Nodes never own each other. Every edge between tasks is inferred from an
/// [`Source::Output`] parameter or listed by name in `needs`.
///
/// # Example
/// ```yaml
/// name: simulate
/// template: annual-daylight@0.9.0
/// sub_folder: annual_daylight
/// parameters:
///   model: { input: model }
///   wea: { task: convert_epw, output: wea }
/// returns:
///   - from: results
///     to: ../results
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub name: String,
    pub template: TemplateRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_folder: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<TaskReturn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskNode {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: TemplateRef::new(template),
            sub_folder: None,
            parameters: BTreeMap::new(),
            needs: Vec::new(),
            returns: Vec::new(),
            description: None,
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>, source: Source) -> Self {
        self.parameters.insert(parameter.into(), source);
        self
    }

    pub fn with_sub_folder(mut self, sub_folder: impl Into<String>) -> Self {
        self.sub_folder = Some(sub_folder.into());
        self
    }

    pub fn with_need(mut self, task: impl Into<String>) -> Self {
        self.needs.push(task.into());
        self
    }

    pub fn with_return(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.returns.push(TaskReturn {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Folder, relative to the owning graph's root, where outputs land.
    pub fn sub_folder(&self) -> &str {
        self.sub_folder.as_deref().unwrap_or(&self.name)
    }

    /// Every task this node depends on, in parameter order then `needs` order.
    /// May contain duplicates.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .values()
            .filter_map(Source::referenced_task)
            .chain(self.needs.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_ref_parts() {
        let versioned = TemplateRef::new("annual-daylight@0.9.0");
        assert_eq!(versioned.name(), "annual-daylight");
        assert_eq!(versioned.version(), Some("0.9.0"));

        let bare = TemplateRef::new("convert-epw");
        assert_eq!(bare.name(), "convert-epw");
        assert_eq!(bare.version(), None);
    }

    #[test]
    fn test_sub_folder_defaults_to_name() {
        let task = TaskNode::new("simulate", "annual-daylight");
        assert_eq!(task.sub_folder(), "simulate");
        assert_eq!(task.with_sub_folder("annual_daylight").sub_folder(), "annual_daylight");
    }

    #[test]
    fn test_references_include_sources_and_needs() {
        let task = TaskNode::new("metrics", "daylight-metrics")
            .with_parameter("folder", Source::output("simulate", "results"))
            .with_parameter("schedule", Source::input("schedule"))
            .with_need("prepare");

        let refs: Vec<&str> = task.references().collect();
        assert_eq!(refs, vec!["simulate", "prepare"]);
    }

    #[test]
    fn test_parse_task_yaml() {
        let yaml = r#"
name: run_annual_daylight
template: annual-daylight@0.9.0
sub_folder: annual_daylight
parameters:
  north: { input: north }
  model: { input: model }
returns:
  - from: results
    to: ../results
"#;
        let task: TaskNode = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(task.template.name(), "annual-daylight");
        assert_eq!(task.sub_folder(), "annual_daylight");
        assert_eq!(task.parameters.len(), 2);
        assert_eq!(task.returns[0].to, "../results");
        assert!(task.needs.is_empty());
    }
}
