// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use recipe_dag::backends::stub::{FailingExecutor, StubExecutor};
use recipe_dag::config::{
    load_and_validate, load_registry, load_run_config, LiteralValue, RunConfig, RuntimeBuilder,
    TemplateMap, ValidatedGraph,
};
use recipe_dag::engine::{plan, RunReport, TaskStatus};
use recipe_dag::observability::init_tracing;
use recipe_dag::traits::TaskExecutor;

#[derive(Parser)]
#[command(name = "recipe-dag")]
#[command(about = "Validate, plan and dry-run recipe DAGs")]
#[command(version)]
struct Cli {
    /// Log filter directive (overrides RECIPE_DAG_LOG), e.g. `debug`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a recipe against the registry and report every violation
    Validate {
        /// Path to the recipe YAML
        recipe: PathBuf,

        /// Registry YAML with atomic contracts and embeddable recipes
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Print the execution stages of a recipe
    Plan {
        recipe: PathBuf,

        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Emit the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a recipe against the stub executor
    Simulate {
        recipe: PathBuf,

        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Run configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run input as name=value (repeatable, overrides the run config)
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, LiteralValue)>,

        /// Task to fail, by bare name or qualified path (repeatable)
        #[arg(long)]
        fail: Vec<String>,

        /// Folder task work directories hang off
        #[arg(long, default_value = ".")]
        run_root: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Validate { recipe, registry } => validate_recipe(&recipe, registry.as_deref()),
        Commands::Plan {
            recipe,
            registry,
            json,
        } => plan_recipe(&recipe, registry.as_deref(), json),
        Commands::Simulate {
            recipe,
            registry,
            config,
            inputs,
            fail,
            run_root,
        } => {
            simulate_recipe(
                &recipe,
                registry.as_deref(),
                config.as_deref(),
                inputs,
                fail,
                run_root,
            )
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

/// Parse `name=value`; the value is read as YAML so `50`, `true` and
/// `weather.epw` become the matching literal kinds.
fn parse_input(raw: &str) -> Result<(String, LiteralValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    if name.is_empty() {
        return Err(format!("missing input name in '{}'", raw));
    }
    let literal = serde_yaml::from_str::<LiteralValue>(value)
        .unwrap_or_else(|_| LiteralValue::Text(value.to_string()));
    Ok((name.to_string(), literal))
}

fn load(recipe: &Path, registry: Option<&Path>) -> Result<ValidatedGraph> {
    let templates = match registry {
        Some(path) => load_registry(path)?,
        None => TemplateMap::new(),
    };
    Ok(load_and_validate(recipe, &templates)?)
}

fn validate_recipe(recipe: &Path, registry: Option<&Path>) -> Result<()> {
    let validated = load(recipe, registry)?;
    println!(
        "✅ '{}' is valid: {} tasks ({} atomic after expansion), {} outputs",
        validated.name(),
        validated.graph().tasks.len(),
        validated.atomic_task_count(),
        validated.graph().outputs.len()
    );
    Ok(())
}

fn plan_recipe(recipe: &Path, registry: Option<&Path>, json: bool) -> Result<()> {
    let validated = load(recipe, registry)?;
    let summary = plan(&validated)?.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("📋 Plan for '{}'", summary.recipe);
    for (index, stage) in summary.stages.iter().enumerate() {
        println!("  stage {}: {}", index, stage.join(", "));
    }
    for composite in &summary.composites {
        println!(
            "  composite {} ({}) spans stages {}..={}",
            composite.task, composite.recipe, composite.first_stage, composite.last_stage
        );
    }
    Ok(())
}

async fn simulate_recipe(
    recipe: &Path,
    registry: Option<&Path>,
    config: Option<&Path>,
    inputs: Vec<(String, LiteralValue)>,
    fail: Vec<String>,
    run_root: PathBuf,
) -> Result<()> {
    let validated = load(recipe, registry)?;
    let execution_plan = plan(&validated)?;

    let run_config = match config {
        Some(path) => load_run_config(path)?,
        None => RunConfig::default(),
    };
    let mut run_inputs: BTreeMap<String, LiteralValue> = run_config.inputs.clone();
    run_inputs.extend(inputs);

    let executor: Arc<dyn TaskExecutor> = if fail.is_empty() {
        Arc::new(StubExecutor::new())
    } else {
        Arc::new(FailingExecutor::new(fail))
    };

    let runner = RuntimeBuilder::with_run_root(&run_config, run_root);
    let report = runner
        .run(&validated, &execution_plan, &run_inputs, executor)
        .await
        .with_context(|| format!("running '{}'", validated.name()))?;

    print_report(&report);

    if report.succeeded() {
        Ok(())
    } else {
        bail!(
            "'{}' finished with {} failed and {} skipped tasks",
            report.recipe,
            report.count(TaskStatus::Failed),
            report.count(TaskStatus::Skipped)
        )
    }
}

fn print_report(report: &RunReport) {
    println!("🚀 Run of '{}'", report.recipe);
    for (path, record) in &report.records {
        let marker = match record.status {
            TaskStatus::Succeeded => "✅",
            TaskStatus::Failed => "❌",
            TaskStatus::Skipped => "⏭️",
        };
        match &record.detail {
            Some(detail) => println!("  {} {} ({}): {}", marker, path, record.status, detail),
            None => println!("  {} {} ({})", marker, path, record.status),
        }
    }

    println!("📦 Outputs");
    for (name, output) in &report.outputs.resolved {
        println!(
            "  {} -> {} (from {})",
            name,
            output.destination.display(),
            output.materialized.display()
        );
    }
    for (name, missing) in &report.outputs.unavailable {
        println!("  {} unavailable: {} ({})", name, missing.reason, missing.task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_reads_yaml_literals() {
        assert_eq!(
            parse_input("grid_size=0.5").unwrap(),
            ("grid_size".to_string(), LiteralValue::Number(0.5))
        );
        assert_eq!(
            parse_input("north=90").unwrap(),
            ("north".to_string(), LiteralValue::Integer(90))
        );
        assert_eq!(
            parse_input("model=room.hbjson").unwrap(),
            ("model".to_string(), LiteralValue::Text("room.hbjson".to_string()))
        );
        assert_eq!(
            parse_input("radiance_parameters=-ab 2 -ad 5000").unwrap().1,
            LiteralValue::Text("-ab 2 -ad 5000".to_string())
        );
    }

    #[test]
    fn test_parse_input_rejects_malformed() {
        assert!(parse_input("grid_size").is_err());
        assert!(parse_input("=1").is_err());
    }

    #[test]
    fn test_missing_registry_file() {
        let error = load(Path::new("configs/weather-pipeline.yaml"), Some(Path::new("nope.yaml")))
            .unwrap_err();
        assert!(error.to_string().contains("nope.yaml"));
    }
}
