// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

use crate::errors::ValidationError;

/// Errors from reading recipe, registry and run-configuration documents.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("recipe '{recipe}' failed validation:\n{}", render(.errors))]
    Invalid {
        recipe: String,
        errors: Vec<ValidationError>,
    },
}

fn render(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| format!("  - {}", error))
        .collect::<Vec<_>>()
        .join("\n")
}
