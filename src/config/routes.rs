// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Static resolution of output routes to task outputs.
//!
//! A route either names a task output directly or names a path under the
//! result root that some task surfaces through `returns`. Both shapes reduce
//! to a [`RouteTarget`]: a task, one of its outputs, and an optional sub-path
//! inside that output. This is pure path algebra over the definition; the
//! validator uses it to reject unresolved routes and the router uses it to
//! find recorded locations after a run.

use std::path::{Path, PathBuf};

use crate::config::{DagGraph, OutputRoute, RouteSource, TaskNode};
use crate::utils::{normalize_relative, strip_route_prefix};

/// The task output a route lands on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub task: String,
    pub output: String,
    pub sub_path: Option<PathBuf>,
}

/// Why a route could not be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLookupError {
    /// Nothing in the graph produces this route
    Unresolved,
    /// More than one task return covers the route path
    Ambiguous { candidates: Vec<String> },
    /// The route path or sub-path is absolute or escapes its root
    InvalidPath { path: String },
}

/// Where a task return lands, relative to the graph's result root.
pub fn return_destination(task: &TaskNode, to: &str) -> Option<PathBuf> {
    normalize_relative(&Path::new(task.sub_folder()).join(to))
        .filter(|path| !path.as_os_str().is_empty())
}

/// Locate the task output a route points at.
pub fn locate_route(graph: &DagGraph, route: &OutputRoute) -> Result<RouteTarget, RouteLookupError> {
    match &route.source {
        RouteSource::TaskOutput {
            task,
            output,
            sub_path,
        } => {
            if graph.task(task).is_none() {
                return Err(RouteLookupError::Unresolved);
            }
            let sub_path = match sub_path {
                Some(sub_path) => {
                    let normalized = normalize_relative(Path::new(sub_path)).ok_or_else(|| {
                        RouteLookupError::InvalidPath {
                            path: sub_path.clone(),
                        }
                    })?;
                    Some(normalized).filter(|path| !path.as_os_str().is_empty())
                }
                None => None,
            };
            Ok(RouteTarget {
                task: task.clone(),
                output: output.clone(),
                sub_path,
            })
        }
        RouteSource::Path { path } => {
            let wanted = normalize_relative(Path::new(path))
                .filter(|normalized| !normalized.as_os_str().is_empty())
                .ok_or_else(|| RouteLookupError::InvalidPath { path: path.clone() })?;

            let mut candidates = Vec::new();
            for task in &graph.tasks {
                for ret in &task.returns {
                    let Some(destination) = return_destination(task, &ret.to) else {
                        continue;
                    };
                    if let Some(remainder) = strip_route_prefix(&wanted, &destination) {
                        candidates.push(RouteTarget {
                            task: task.name.clone(),
                            output: ret.from.clone(),
                            sub_path: Some(remainder).filter(|rem| !rem.as_os_str().is_empty()),
                        });
                    }
                }
            }

            match candidates.len() {
                0 => Err(RouteLookupError::Unresolved),
                1 => Ok(candidates.remove(0)),
                _ => Err(RouteLookupError::Ambiguous {
                    candidates: candidates
                        .iter()
                        .map(|target| format!("{}.{}", target.task, target.output))
                        .collect(),
                }),
            }
        }
    }
}
