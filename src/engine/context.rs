// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::engine::{ResolvedValue, TaskPath};

/// Final state of a task in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    Failed,
    /// Not attempted because something it depends on did not succeed
    Skipped,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        };
        f.write_str(status)
    }
}

/// What one task left behind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Output name to materialized location
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, PathBuf>,
}

impl TaskRecord {
    pub fn succeeded(outputs: BTreeMap<String, PathBuf>) -> Self {
        Self {
            status: TaskStatus::Succeeded,
            detail: None,
            outputs,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            detail: Some(reason.into()),
            outputs: BTreeMap::new(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Skipped,
            detail: Some(reason.into()),
            outputs: BTreeMap::new(),
        }
    }
}

/// Records of the tasks directly inside one scope, keyed by bare task name.
pub type CompletedTasks = BTreeMap<String, TaskRecord>;

/// Mutable state of a single run.
///
/// The recipe itself is shared and never touched; everything a run learns
/// (bound inputs per scope, task outcomes and output locations) lives here
/// and is dropped with the run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    run_root: PathBuf,
    inputs: HashMap<TaskPath, BTreeMap<String, ResolvedValue>>,
    records: HashMap<TaskPath, TaskRecord>,
}

impl RunContext {
    pub fn new(run_root: impl Into<PathBuf>) -> Self {
        Self {
            run_root: run_root.into(),
            inputs: HashMap::new(),
            records: HashMap::new(),
        }
    }

    pub fn run_root(&self) -> &Path {
        &self.run_root
    }

    /// Bind the inputs of a scope: the root recipe or an opened composite.
    pub fn open_scope(&mut self, scope: TaskPath, inputs: BTreeMap<String, ResolvedValue>) {
        self.inputs.insert(scope, inputs);
    }

    /// Whether a scope's inputs were bound. Tasks in an unopened scope
    /// cannot run.
    pub fn is_open(&self, scope: &TaskPath) -> bool {
        self.inputs.contains_key(scope)
    }

    pub fn scope_input(&self, scope: &TaskPath, name: &str) -> Option<&ResolvedValue> {
        self.inputs.get(scope).and_then(|inputs| inputs.get(name))
    }

    pub fn record(&mut self, task: TaskPath, record: TaskRecord) {
        self.records.insert(task, record);
    }

    pub fn record_of(&self, task: &TaskPath) -> Option<&TaskRecord> {
        self.records.get(task)
    }

    pub fn status_of(&self, task: &TaskPath) -> Option<TaskStatus> {
        self.records.get(task).map(|record| record.status)
    }

    /// Records of the tasks directly inside `scope`.
    pub fn scope_records(&self, scope: &TaskPath) -> CompletedTasks {
        self.records
            .iter()
            .filter(|(path, _)| path.parent().as_ref() == Some(scope))
            .filter_map(|(path, record)| Some((path.name()?.to_string(), record.clone())))
            .collect()
    }

    /// Every record, ordered by task path.
    pub fn records(&self) -> BTreeMap<TaskPath, TaskRecord> {
        self.records
            .iter()
            .map(|(path, record)| (path.clone(), record.clone()))
            .collect()
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.records
            .values()
            .filter(|record| record.status == status)
            .count()
    }
}
