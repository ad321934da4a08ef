// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_graph;
mod entry_points;
mod graph;
mod loader;
pub mod routes;
mod runtime;
mod source;
mod task;
mod template;
mod template_map;
mod validation;
mod value;

pub mod consts;

pub use dependency_graph::DependencyGraph;
pub use entry_points::EntryPoints;
pub use graph::{DagGraph, OutputRoute, RouteSource};
pub use loader::{
    load_and_validate, load_recipe, load_registry, load_run_config, ExecutorOptions, RunConfig,
};
pub use runtime::RuntimeBuilder;
pub use source::Source;
pub use task::{TaskNode, TaskReturn, TemplateRef};
pub use template::{AtomicContract, OutputDescriptor, Template};
pub use template_map::{RegistryDocument, TemplateMap};
pub use validation::{detect_cycles, validate, validate_graph, ResolvedTemplate, ValidatedGraph};
pub use value::{Alias, LiteralValue, ValueDescriptor, ValueKind};
