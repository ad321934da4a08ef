// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::value::LiteralValue;

/// Where a task parameter gets its value from.
///
/// Written in YAML as one of three shapes:
///
/// ```yaml
/// parameters:
///   model: { input: model }                              # graph input
///   wea: { task: convert_epw, output: wea }              # another task's output
///   grid: { task: split, output: grids, sub_path: g1 }   # narrowed into a folder
///   north: { value: 0 }                                  # literal
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Output {
        task: String,
        output: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sub_path: Option<String>,
    },
    Input {
        input: String,
    },
    Literal {
        value: LiteralValue,
    },
}

impl Source {
    pub fn literal(value: LiteralValue) -> Self {
        Source::Literal { value }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Source::Input { input: name.into() }
    }

    pub fn output(task: impl Into<String>, output: impl Into<String>) -> Self {
        Source::Output {
            task: task.into(),
            output: output.into(),
            sub_path: None,
        }
    }

    pub fn output_at(
        task: impl Into<String>,
        output: impl Into<String>,
        sub_path: impl Into<String>,
    ) -> Self {
        Source::Output {
            task: task.into(),
            output: output.into(),
            sub_path: Some(sub_path.into()),
        }
    }

    /// Name of the task this source depends on, if any.
    pub fn referenced_task(&self) -> Option<&str> {
        match self {
            Source::Output { task, .. } => Some(task),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Output {
                task,
                output,
                sub_path: Some(sub_path),
            } => write!(f, "{}.{}/{}", task, output, sub_path),
            Source::Output { task, output, .. } => write!(f, "{}.{}", task, output),
            Source::Input { input } => write!(f, "inputs.{}", input),
            Source::Literal { value } => write!(f, "'{}'", value),
        }
    }
}
