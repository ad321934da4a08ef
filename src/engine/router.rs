// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::routes::{locate_route, RouteLookupError};
use crate::config::DagGraph;
use crate::engine::{CompletedTasks, TaskStatus};
use crate::utils::join_sub_path;

/// An output route that landed on a recorded location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOutput {
    /// Where the producing task left the value
    pub materialized: PathBuf,
    /// Where consumers of the recipe expect it
    pub destination: PathBuf,
}

/// An output route whose producer did not deliver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnavailableOutput {
    pub task: String,
    pub reason: String,
}

/// Output routes of one recipe after a run, split by availability.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputResolution {
    pub resolved: BTreeMap<String, ResolvedOutput>,
    pub unavailable: BTreeMap<String, UnavailableOutput>,
}

impl OutputResolution {
    pub fn is_complete(&self) -> bool {
        self.unavailable.is_empty()
    }
}

/// Map every output route of `graph` onto the locations recorded for the
/// tasks of its scope.
///
/// Routes whose producing task failed, was skipped or never reported the
/// output are listed as unavailable instead of failing the whole lookup, so
/// a partial run still exposes what it produced.
pub fn resolve_outputs(
    graph: &DagGraph,
    completed: &CompletedTasks,
    destination_root: &Path,
) -> OutputResolution {
    let mut resolution = OutputResolution::default();

    for route in &graph.outputs {
        let target = match locate_route(graph, route) {
            Ok(target) => target,
            Err(error) => {
                let reason = match error {
                    RouteLookupError::Unresolved => "route does not resolve".to_string(),
                    RouteLookupError::Ambiguous { candidates } => {
                        format!("route is ambiguous between {}", candidates.join(", "))
                    }
                    RouteLookupError::InvalidPath { path } => format!("invalid route path '{}'", path),
                };
                resolution.unavailable.insert(
                    route.name.clone(),
                    UnavailableOutput {
                        task: String::new(),
                        reason,
                    },
                );
                continue;
            }
        };

        let unavailable = |reason: String| UnavailableOutput {
            task: target.task.clone(),
            reason,
        };

        let location = match completed.get(&target.task) {
            None => Err(unavailable("task did not run".to_string())),
            Some(record) if record.status != TaskStatus::Succeeded => Err(unavailable(
                record
                    .detail
                    .clone()
                    .map(|detail| format!("task {}: {}", record.status, detail))
                    .unwrap_or_else(|| format!("task {}", record.status)),
            )),
            Some(record) => match record.outputs.get(&target.output) {
                None => Err(unavailable(format!(
                    "output '{}' was not reported",
                    target.output
                ))),
                Some(location) => match &target.sub_path {
                    None => Ok(location.clone()),
                    Some(sub_path) => join_sub_path(location, &sub_path.to_string_lossy())
                        .ok_or_else(|| unavailable("invalid sub-path".to_string())),
                },
            },
        };

        match location {
            Ok(materialized) => {
                resolution.resolved.insert(
                    route.name.clone(),
                    ResolvedOutput {
                        materialized,
                        destination: destination_root.join(route.destination()),
                    },
                );
            }
            Err(missing) => {
                resolution.unavailable.insert(route.name.clone(), missing);
            }
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputRoute, RouteSource, TaskNode, ValueKind};
    use crate::engine::TaskRecord;

    fn graph() -> DagGraph {
        DagGraph::new("daylight")
            .with_task(
                TaskNode::new("run_annual_daylight", "annual-daylight")
                    .with_sub_folder("annual_daylight")
                    .with_return("results", "../results"),
            )
            .with_task(TaskNode::new("metrics", "daylight-metrics"))
            .with_output(OutputRoute::new(
                "results",
                ValueKind::Folder,
                RouteSource::path("results"),
            ))
            .with_output(OutputRoute::new(
                "grid_1",
                ValueKind::Folder,
                RouteSource::path("results/grid_1"),
            ))
            .with_output(
                OutputRoute::new(
                    "da",
                    ValueKind::Folder,
                    RouteSource::task_output("metrics", "da"),
                )
                .with_destination("metrics/da"),
            )
    }

    #[test]
    fn test_routes_resolve_to_recorded_locations() {
        let mut completed = CompletedTasks::new();
        let mut outputs = BTreeMap::new();
        outputs.insert(
            "results".to_string(),
            PathBuf::from("/run/annual_daylight/results"),
        );
        completed.insert("run_annual_daylight".to_string(), TaskRecord::succeeded(outputs));
        let mut outputs = BTreeMap::new();
        outputs.insert("da".to_string(), PathBuf::from("/run/metrics/da"));
        completed.insert("metrics".to_string(), TaskRecord::succeeded(outputs));

        let resolution = resolve_outputs(&graph(), &completed, Path::new("/out"));
        assert!(resolution.is_complete());
        assert_eq!(
            resolution.resolved["results"].materialized,
            PathBuf::from("/run/annual_daylight/results")
        );
        assert_eq!(
            resolution.resolved["grid_1"].materialized,
            PathBuf::from("/run/annual_daylight/results/grid_1")
        );
        assert_eq!(resolution.resolved["da"].destination, PathBuf::from("/out/metrics/da"));
    }

    #[test]
    fn test_failed_producer_makes_route_unavailable() {
        let mut completed = CompletedTasks::new();
        completed.insert(
            "run_annual_daylight".to_string(),
            TaskRecord::failed("exit status 1"),
        );

        let resolution = resolve_outputs(&graph(), &completed, Path::new("/out"));
        assert!(resolution.resolved.is_empty());
        assert_eq!(resolution.unavailable.len(), 3);
        assert_eq!(
            resolution.unavailable["results"].reason,
            "task failed: exit status 1"
        );
        assert_eq!(resolution.unavailable["da"].reason, "task did not run");
    }
}
