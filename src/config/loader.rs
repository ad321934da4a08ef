// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::consts::FALLBACK_MAX_CONCURRENCY;
use crate::config::{validate_graph, DagGraph, LiteralValue, RegistryDocument, TemplateMap, ValidatedGraph};
use crate::errors::{FailureStrategy, RecipeError};
use crate::traits::TemplateRegistry;

/// Settings for one run of a validated recipe.
///
/// # Fields
/// * `failure_strategy` - How to handle task failures (optional, defaults to FailFast)
/// * `executor_options` - Runner options (optional)
/// * `inputs` - Values for the recipe's declared inputs
///
/// # Example
/// ```yaml
/// failure_strategy: best_effort
/// executor_options:
///   max_concurrency: 4
/// inputs:
///   model: model.hbjson
///   wea: weather.wea
///   north: 15
///   radiance_parameters: -ab 2 -ad 5000 -lw 2e-05
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub failure_strategy: FailureStrategy,
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    #[serde(default)]
    pub inputs: BTreeMap<String, LiteralValue>,
}

/// Runner options.
///
/// # Fields
/// * `max_concurrency` - Maximum number of tasks running at once (optional)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
}

impl ExecutorOptions {
    /// Configured concurrency, else the host's parallelism, else a fixed fallback.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency
            .filter(|limit| *limit > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(FALLBACK_MAX_CONCURRENCY)
            })
    }
}

fn load_yaml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, RecipeError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| RecipeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| RecipeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a recipe from a YAML file
pub fn load_recipe<P: AsRef<Path>>(path: P) -> Result<DagGraph, RecipeError> {
    load_yaml(path)
}

/// Load a template registry document from a YAML file
pub fn load_registry<P: AsRef<Path>>(path: P) -> Result<TemplateMap, RecipeError> {
    let document: RegistryDocument = load_yaml(path)?;
    Ok(TemplateMap::from_document(document))
}

/// Load run settings from a YAML file
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, RecipeError> {
    load_yaml(path)
}

/// Load and validate a recipe from a YAML file
///
/// Every validation error is kept in the returned [`RecipeError::Invalid`].
pub fn load_and_validate<P: AsRef<Path>>(
    path: P,
    registry: &dyn TemplateRegistry,
) -> Result<ValidatedGraph, RecipeError> {
    let graph = load_recipe(path)?;
    let recipe = graph.name.clone();
    validate_graph(Arc::new(graph), registry)
        .map_err(|errors| RecipeError::Invalid { recipe, errors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Source, ValueKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_recipe() {
        let yaml = r#"
name: daylight
inputs:
  - name: model
    kind: file
    extensions: [hbjson]
tasks:
  - name: convert
    template: convert-model
    parameters:
      model: { input: model }
      grid_size: { value: 0.5 }
  - name: simulate
    template: annual-daylight@0.9.0
    parameters:
      octree: { task: convert, output: octree }
    returns:
      - { from: results, to: ../results }
outputs:
  - name: results
    kind: folder
    source: { path: results }
"#;
        let file = write_temp(yaml);
        let graph = load_recipe(file.path()).unwrap();

        assert_eq!(graph.name, "daylight");
        assert_eq!(graph.inputs[0].kind, ValueKind::File);
        assert_eq!(graph.tasks.len(), 2);
        assert_eq!(graph.tasks[0].parameters["model"], Source::input("model"));
        assert_eq!(
            graph.tasks[1].parameters["octree"],
            Source::output("convert", "octree")
        );
        assert_eq!(graph.tasks[1].template.version(), Some("0.9.0"));
        assert_eq!(graph.tasks[1].returns[0].to, "../results");
    }

    #[test]
    fn parse_run_config_defaults() {
        let config: RunConfig = serde_yaml::from_str("inputs: { north: 15 }").unwrap();
        assert_eq!(config.failure_strategy, FailureStrategy::FailFast);
        assert_eq!(config.executor_options.max_concurrency, None);
        assert_eq!(config.inputs["north"], LiteralValue::Integer(15));
        assert!(config.executor_options.effective_concurrency() >= 1);
    }

    #[test]
    fn parse_run_config_best_effort() {
        let file = write_temp(
            "failure_strategy: best_effort\nexecutor_options:\n  max_concurrency: 2\n",
        );
        let config = load_run_config(file.path()).unwrap();
        assert_eq!(config.failure_strategy, FailureStrategy::BestEffort);
        assert_eq!(config.executor_options.effective_concurrency(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_recipe("does/not/exist.yaml");
        assert!(matches!(result, Err(RecipeError::Io { .. })));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let file = write_temp("name: [unclosed");
        assert!(matches!(
            load_recipe(file.path()),
            Err(RecipeError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_and_validate_reports_every_error() {
        let yaml = r#"
name: broken
tasks:
  - name: a
    template: nowhere
    needs: [b]
  - name: b
    template: nowhere
    needs: [a]
"#;
        let file = write_temp(yaml);
        let err = load_and_validate(file.path(), &TemplateMap::new()).unwrap_err();
        match err {
            RecipeError::Invalid { recipe, errors } => {
                assert_eq!(recipe, "broken");
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|error| error.is_cycle()));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        let message = load_and_validate(file.path(), &TemplateMap::new())
            .unwrap_err()
            .to_string();
        assert!(message.contains("Cyclic dependency detected: a -> b -> a"));
    }
}
