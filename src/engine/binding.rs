// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Turning parameter sources into concrete values at run time.
//!
//! Validation already guaranteed every source refers to something that
//! exists. What can still go wrong here is dynamic: an input without a value,
//! an input value the parameter's constraints reject, or an upstream task
//! that failed or was skipped.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::{LiteralValue, Source, TaskNode, ValueDescriptor, ValueKind};
use crate::engine::{RunContext, TaskPath, TaskStatus};
use crate::errors::BindingError;
use crate::utils::join_sub_path;

/// A parameter value ready to hand to an executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Literal(LiteralValue),
    /// A file or folder on disk
    Path(PathBuf),
    /// An optional value nobody supplied
    Absent,
}

impl ResolvedValue {
    /// Convert a literal according to the kind it is declared as. Path-like
    /// kinds carry their text as a path.
    pub fn from_literal(descriptor: &ValueDescriptor, value: &LiteralValue) -> Self {
        match value.as_text() {
            Some(text) if descriptor.kind.is_path_like() => ResolvedValue::Path(PathBuf::from(text)),
            _ => ResolvedValue::Literal(descriptor.normalize_literal(value)),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ResolvedValue::Absent)
    }

    pub fn as_path(&self) -> Option<&PathBuf> {
        match self {
            ResolvedValue::Path(path) => Some(path),
            _ => None,
        }
    }
}

/// Parameter name to value, in name order.
pub type ResolvedParameters = BTreeMap<String, ResolvedValue>;

/// Value for a descriptor nobody bound: its default, else absent when
/// optional.
fn fallback(descriptor: &ValueDescriptor) -> Option<ResolvedValue> {
    match &descriptor.default {
        Some(default) => Some(ResolvedValue::from_literal(descriptor, default)),
        None if descriptor.optional => Some(ResolvedValue::Absent),
        None => None,
    }
}

/// Check a value handed over from an enclosing scope against the slot it
/// lands in. Validation cannot see run-time values, so an unrestricted
/// input may still carry something the parameter forbids.
fn check_bound(descriptor: &ValueDescriptor, value: &ResolvedValue) -> Result<(), String> {
    match value {
        ResolvedValue::Literal(literal) => descriptor.check_literal(literal),
        ResolvedValue::Path(path) => {
            let path = path.to_string_lossy();
            if descriptor.kind == ValueKind::File && !descriptor.allows_extension(&path) {
                Err(format!(
                    "'{}' does not have an allowed extension ({})",
                    path,
                    descriptor.extensions.join(", ")
                ))
            } else {
                Ok(())
            }
        }
        ResolvedValue::Absent => Ok(()),
    }
}

/// Check run inputs against a recipe's declared inputs.
///
/// Unknown names, missing required values and values violating their
/// constraints are all collected.
pub fn bind_inputs(
    descriptors: &[ValueDescriptor],
    provided: &BTreeMap<String, LiteralValue>,
) -> Result<BTreeMap<String, ResolvedValue>, Vec<BindingError>> {
    let mut errors = Vec::new();
    let mut bound = BTreeMap::new();

    for name in provided.keys() {
        if !descriptors.iter().any(|descriptor| &descriptor.name == name) {
            errors.push(BindingError::UnknownInput {
                input: name.clone(),
            });
        }
    }

    for descriptor in descriptors {
        match provided.get(&descriptor.name) {
            Some(value) => match descriptor.check_literal(value) {
                Ok(()) => {
                    bound.insert(
                        descriptor.name.clone(),
                        ResolvedValue::from_literal(descriptor, value),
                    );
                }
                Err(reason) => errors.push(BindingError::InvalidInput {
                    input: descriptor.name.clone(),
                    reason,
                }),
            },
            None => match fallback(descriptor) {
                Some(value) => {
                    bound.insert(descriptor.name.clone(), value);
                }
                None => errors.push(BindingError::MissingInput {
                    input: descriptor.name.clone(),
                }),
            },
        }
    }

    if errors.is_empty() {
        Ok(bound)
    } else {
        Err(errors)
    }
}

/// Resolve every declared parameter of `node` within `scope`.
///
/// Parameters the node leaves unbound take their default, or
/// [`ResolvedValue::Absent`] when optional.
pub fn bind(
    node: &TaskNode,
    descriptors: &[ValueDescriptor],
    scope: &TaskPath,
    context: &RunContext,
) -> Result<ResolvedParameters, BindingError> {
    let mut parameters = ResolvedParameters::new();

    for descriptor in descriptors {
        let value = match node.parameters.get(&descriptor.name) {
            None => fallback(descriptor).ok_or_else(|| BindingError::Unbound {
                task: node.name.clone(),
                parameter: descriptor.name.clone(),
            })?,
            Some(Source::Literal { value }) => ResolvedValue::from_literal(descriptor, value),
            Some(Source::Input { input }) => match context.scope_input(scope, input) {
                Some(value) if !value.is_absent() => {
                    check_bound(descriptor, value).map_err(|reason| {
                        BindingError::ConstraintViolation {
                            task: node.name.clone(),
                            parameter: descriptor.name.clone(),
                            reason,
                        }
                    })?;
                    value.clone()
                }
                _ => fallback(descriptor).ok_or_else(|| BindingError::InputUnavailable {
                    task: node.name.clone(),
                    parameter: descriptor.name.clone(),
                    input: input.clone(),
                })?,
            },
            Some(Source::Output {
                task,
                output,
                sub_path,
            }) => {
                let unavailable = |reason: String| BindingError::UpstreamUnavailable {
                    task: node.name.clone(),
                    parameter: descriptor.name.clone(),
                    source_task: task.clone(),
                    output: output.clone(),
                    reason,
                };

                let record = context
                    .record_of(&scope.child(task.as_str()))
                    .ok_or_else(|| unavailable("has not run".to_string()))?;
                if record.status != TaskStatus::Succeeded {
                    return Err(unavailable(format!("task {}", record.status)));
                }
                let location = record
                    .outputs
                    .get(output)
                    .ok_or_else(|| unavailable("output was not reported".to_string()))?;

                match sub_path {
                    Some(sub_path) => ResolvedValue::Path(
                        join_sub_path(location, sub_path).ok_or_else(|| {
                            BindingError::InvalidSubPath {
                                task: node.name.clone(),
                                parameter: descriptor.name.clone(),
                                sub_path: sub_path.clone(),
                            }
                        })?,
                    ),
                    None => ResolvedValue::Path(location.clone()),
                }
            }
        };
        parameters.insert(descriptor.name.clone(), value);
    }

    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TaskRecord;

    fn descriptors() -> Vec<ValueDescriptor> {
        vec![
            ValueDescriptor::new("model", ValueKind::File).with_extensions(&["hbjson"]),
            ValueDescriptor::new("north", ValueKind::Number)
                .with_default(LiteralValue::Integer(0))
                .with_range(Some(0.0), Some(360.0)),
            ValueDescriptor::new("schedule", ValueKind::File).optional(),
        ]
    }

    #[test]
    fn test_bind_inputs_applies_defaults() {
        let mut provided = BTreeMap::new();
        provided.insert("model".to_string(), LiteralValue::Text("m.hbjson".into()));

        let bound = bind_inputs(&descriptors(), &provided).unwrap();
        assert_eq!(bound["model"], ResolvedValue::Path(PathBuf::from("m.hbjson")));
        assert_eq!(bound["north"], ResolvedValue::Literal(LiteralValue::Integer(0)));
        assert_eq!(bound["schedule"], ResolvedValue::Absent);
    }

    #[test]
    fn test_bind_inputs_collects_every_problem() {
        let mut provided = BTreeMap::new();
        provided.insert("north".to_string(), LiteralValue::Integer(400));
        provided.insert("colour".to_string(), LiteralValue::Text("red".into()));

        let errors = bind_inputs(&descriptors(), &provided).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&BindingError::UnknownInput {
            input: "colour".into()
        }));
        assert!(errors.contains(&BindingError::MissingInput {
            input: "model".into()
        }));
        assert!(errors
            .iter()
            .any(|error| matches!(error, BindingError::InvalidInput { input, .. } if input == "north")));
    }

    #[test]
    fn test_bind_reads_scope_inputs_and_upstream_outputs() {
        let scope = TaskPath::top("daylight");
        let mut context = RunContext::new("/run");
        let mut inputs = BTreeMap::new();
        inputs.insert("model".to_string(), ResolvedValue::Path(PathBuf::from("m.hbjson")));
        context.open_scope(scope.clone(), inputs);

        let mut outputs = BTreeMap::new();
        outputs.insert("grids".to_string(), PathBuf::from("/run/daylight/split/grids"));
        context.record(scope.child("split"), TaskRecord::succeeded(outputs));

        let node = TaskNode::new("simulate", "raytrace")
            .with_parameter("model", Source::input("model"))
            .with_parameter("grid", Source::output_at("split", "grids", "./grid_1.pts"))
            .with_parameter("bounces", Source::literal(LiteralValue::Integer(2)));
        let contract = vec![
            ValueDescriptor::new("model", ValueKind::File),
            ValueDescriptor::new("grid", ValueKind::File),
            ValueDescriptor::new("bounces", ValueKind::Integer),
            ValueDescriptor::new("extra", ValueKind::String).optional(),
        ];

        let bound = bind(&node, &contract, &scope, &context).unwrap();
        assert_eq!(bound["model"], ResolvedValue::Path(PathBuf::from("m.hbjson")));
        assert_eq!(
            bound["grid"],
            ResolvedValue::Path(PathBuf::from("/run/daylight/split/grids/grid_1.pts"))
        );
        assert_eq!(bound["bounces"], ResolvedValue::Literal(LiteralValue::Integer(2)));
        assert_eq!(bound["extra"], ResolvedValue::Absent);
    }

    #[test]
    fn test_failed_upstream_is_reported() {
        let mut context = RunContext::new("/run");
        context.open_scope(TaskPath::root(), BTreeMap::new());
        context.record(TaskPath::top("split"), TaskRecord::failed("exit 1"));

        let node = TaskNode::new("simulate", "raytrace")
            .with_parameter("grid", Source::output("split", "grids"));
        let contract = vec![ValueDescriptor::new("grid", ValueKind::Folder)];

        let error = bind(&node, &contract, &TaskPath::root(), &context).unwrap_err();
        assert!(error.is_upstream());
        assert!(error.to_string().contains("task failed"));
    }

    #[test]
    fn test_scope_input_is_checked_against_the_parameter() {
        let scope = TaskPath::root();
        let mut context = RunContext::new("/run");
        let mut inputs = BTreeMap::new();
        inputs.insert("epw".to_string(), ResolvedValue::Path(PathBuf::from("model.txt")));
        inputs.insert(
            "north".to_string(),
            ResolvedValue::Literal(LiteralValue::Integer(720)),
        );
        context.open_scope(scope.clone(), inputs);

        let epw_contract = vec![ValueDescriptor::new("epw", ValueKind::File).with_extensions(&["epw"])];
        let convert = TaskNode::new("convert", "convert-epw").with_parameter("epw", Source::input("epw"));
        let error = bind(&convert, &epw_contract, &scope, &context).unwrap_err();
        assert!(matches!(
            &error,
            BindingError::ConstraintViolation { task, parameter, reason }
                if task == "convert" && parameter == "epw" && reason.contains("model.txt")
        ));
        assert!(!error.is_upstream());

        let north_contract = vec![ValueDescriptor::new("north", ValueKind::Number)
            .with_range(Some(0.0), Some(360.0))];
        let sunpath = TaskNode::new("sunpath", "create-sunpath")
            .with_parameter("north", Source::input("north"));
        let error = bind(&sunpath, &north_contract, &scope, &context).unwrap_err();
        assert!(matches!(
            &error,
            BindingError::ConstraintViolation { parameter, reason, .. }
                if parameter == "north" && reason.contains("maximum")
        ));
    }

    #[test]
    fn test_string_parameter_receives_text() {
        let node = TaskNode::new("split", "split-grids")
            .with_parameter("grid_filter", Source::literal(LiteralValue::Integer(1)));
        let contract = vec![ValueDescriptor::new("grid_filter", ValueKind::String)];

        let bound = bind(&node, &contract, &TaskPath::root(), &RunContext::new("/run")).unwrap();
        assert_eq!(
            bound["grid_filter"],
            ResolvedValue::Literal(LiteralValue::Text("1".into()))
        );
    }

    #[test]
    fn test_unbound_required_parameter() {
        let context = RunContext::new("/run");
        let node = TaskNode::new("simulate", "raytrace");
        let contract = vec![ValueDescriptor::new("grid", ValueKind::Folder)];

        let error = bind(&node, &contract, &TaskPath::root(), &context).unwrap_err();
        assert_eq!(
            error,
            BindingError::Unbound {
                task: "simulate".into(),
                parameter: "grid".into()
            }
        );
        assert!(!error.is_upstream());
    }
}
