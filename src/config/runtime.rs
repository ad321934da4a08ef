// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use crate::config::RunConfig;
use crate::engine::PlanRunner;

/// Runtime builder - turns run settings into a configured runner.
///
/// # Examples
///
/// ```
/// use recipe_dag::config::{RunConfig, RuntimeBuilder};
/// use recipe_dag::errors::FailureStrategy;
///
/// let mut config = RunConfig::default();
/// config.executor_options.max_concurrency = Some(2);
///
/// let runner = RuntimeBuilder::from_config(&config);
/// assert_eq!(runner.max_concurrency(), 2);
/// assert_eq!(runner.failure_strategy(), FailureStrategy::FailFast);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a runner rooted at the current directory.
    pub fn from_config(cfg: &RunConfig) -> PlanRunner {
        PlanRunner::new(
            cfg.executor_options.effective_concurrency(),
            cfg.failure_strategy,
        )
    }

    /// Build a runner whose task folders hang off `run_root`.
    pub fn with_run_root(cfg: &RunConfig, run_root: impl Into<PathBuf>) -> PlanRunner {
        Self::from_config(cfg).with_run_root(run_root)
    }
}
