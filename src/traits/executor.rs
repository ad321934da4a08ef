// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::{OutputDescriptor, TemplateRef};
use crate::engine::{ResolvedParameters, TaskPath};

/// Everything an external executor needs to run one atomic task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    /// Qualified task path, e.g. `run_annual_daylight/split_grids`
    pub task: TaskPath,
    pub template: TemplateRef,
    /// Folder, relative to the run root, where the task must leave its outputs
    pub work_dir: PathBuf,
    pub parameters: ResolvedParameters,
    /// Outputs the template promises to produce
    pub outputs: Vec<OutputDescriptor>,
}

impl TaskRequest {
    /// Where each declared output is expected under the work directory.
    pub fn expected_outputs(&self) -> BTreeMap<String, PathBuf> {
        self.outputs
            .iter()
            .map(|output| (output.name.clone(), self.work_dir.join(output.location())))
            .collect()
    }
}

/// What the executor reports back once a task finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskCompletion {
    /// Output name to materialized location
    Succeeded { outputs: BTreeMap<String, PathBuf> },
    Failed { reason: String },
}

/// Boundary to whatever actually runs the wrapped tools.
///
/// The engine hands over a bound [`TaskRequest`] and only consumes the
/// completion signal; process spawning, containers and remote execution are
/// the implementor's business.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, request: TaskRequest) -> TaskCompletion;

    fn name(&self) -> &'static str;
}
