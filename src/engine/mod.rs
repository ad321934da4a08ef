// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod binding;
pub mod context;
pub mod planner;
pub mod router;
pub mod runner;
pub mod task_path;

pub use binding::{bind, bind_inputs, ResolvedParameters, ResolvedValue};
pub use context::{CompletedTasks, RunContext, TaskRecord, TaskStatus};
pub use planner::{plan, CompositeSpan, ExecutionPlan, PlanSummary, PlannedStep, Stage};
pub use router::{resolve_outputs, OutputResolution, ResolvedOutput, UnavailableOutput};
pub use runner::{PlanRunner, RunReport};
pub use task_path::TaskPath;
