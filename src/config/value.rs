// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Typed value declarations shared by recipe inputs, template parameters and
//! template outputs.
//!
//! A [`ValueDescriptor`] is the single building block for every typed slot in
//! a recipe: graph inputs are descriptors, atomic template parameters are
//! descriptors, and a composite template exposes its inner graph's inputs as
//! its parameters. Constraint checks live here so validation and run-time
//! input binding agree on what a valid value is.
//!
//! # Example
//! ```yaml
//! - name: north
//!   kind: number
//!   default: 0
//!   minimum: 0
//!   maximum: 360
//! - name: model
//!   kind: file
//!   extensions: [json, hbjson, pkl, hbpkl, zip]
//! - name: schedule
//!   kind: file
//!   extensions: [txt, csv]
//!   optional: true
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::extension_of;

/// The kind of value a descriptor declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Number,
    Integer,
    String,
    Boolean,
    File,
    Folder,
    /// Either a file or a folder.
    Path,
}

impl ValueKind {
    /// Whether values of this kind are locations on disk.
    pub fn is_path_like(self) -> bool {
        matches!(self, ValueKind::File | ValueKind::Folder | ValueKind::Path)
    }

    /// Whether a slot of this kind can be fed a value of kind `provided`.
    ///
    /// ```
    /// use recipe_dag::config::ValueKind;
    ///
    /// assert!(ValueKind::Number.accepts(ValueKind::Integer));
    /// assert!(ValueKind::Path.accepts(ValueKind::Folder));
    /// assert!(!ValueKind::File.accepts(ValueKind::Folder));
    /// ```
    pub fn accepts(self, provided: ValueKind) -> bool {
        match self {
            ValueKind::Number => matches!(provided, ValueKind::Number | ValueKind::Integer),
            ValueKind::Path => provided.is_path_like(),
            other => other == provided,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::File => "file",
            ValueKind::Folder => "folder",
            ValueKind::Path => "path",
        };
        f.write_str(name)
    }
}

/// A literal value written directly in a recipe or supplied as a run input.
///
/// Deserialized untagged, so YAML `true`, `50`, `0.5` and `"-ab 2"` map to
/// the obvious variants. Paths to files and folders are plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl LiteralValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            LiteralValue::Boolean(_) => ValueKind::Boolean,
            LiteralValue::Integer(_) => ValueKind::Integer,
            LiteralValue::Number(_) => ValueKind::Number,
            LiteralValue::Text(_) => ValueKind::String,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LiteralValue::Integer(value) => Some(*value as f64),
            LiteralValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            LiteralValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Boolean(value) => write!(f, "{}", value),
            LiteralValue::Integer(value) => write!(f, "{}", value),
            LiteralValue::Number(value) => write!(f, "{}", value),
            LiteralValue::Text(value) => write!(f, "{}", value),
        }
    }
}

/// Human-facing name attached to an input or output.
///
/// Aliases are metadata for front ends. They are not addressable from
/// sources or routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Typed declaration of an input, a template parameter or an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDescriptor {
    pub name: String,
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<LiteralValue>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<Alias>,
}

impl ValueDescriptor {
    /// Bare descriptor with no constraints.
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            default: None,
            optional: false,
            extensions: Vec::new(),
            minimum: None,
            maximum: None,
            alias: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: LiteralValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|ext| ext.to_string()).collect();
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Non-optional and without a default: must be bound to a source.
    pub fn is_required(&self) -> bool {
        !self.optional && self.default.is_none()
    }

    /// Whether `path` carries one of the allowed extensions.
    ///
    /// An empty extension list allows anything. Comparison ignores case and a
    /// leading dot in the declared extension.
    pub fn allows_extension(&self, path: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        match extension_of(path) {
            Some(ext) => self
                .extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext)),
            None => false,
        }
    }

    /// Whether every extension `other` allows is also allowed here.
    pub fn extensions_cover(&self, other: &ValueDescriptor) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        if other.extensions.is_empty() {
            return false;
        }
        other.extensions.iter().all(|ext| {
            let ext = ext.trim_start_matches('.');
            self.extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
    }

    /// Whether every bound `other` declares lies inside this descriptor's
    /// range. A side `other` leaves open is not compared.
    pub fn range_covers(&self, other: &ValueDescriptor) -> bool {
        let minimum_ok = match (self.minimum, other.minimum) {
            (Some(minimum), Some(theirs)) => theirs >= minimum,
            _ => true,
        };
        let maximum_ok = match (self.maximum, other.maximum) {
            (Some(maximum), Some(theirs)) => theirs <= maximum,
            _ => true,
        };
        minimum_ok && maximum_ok
    }

    /// The literal as this descriptor stores it. Scalars given for a
    /// `string` slot become their text form.
    pub fn normalize_literal(&self, value: &LiteralValue) -> LiteralValue {
        match value {
            LiteralValue::Text(_) => value.clone(),
            other if self.kind == ValueKind::String => LiteralValue::Text(other.to_string()),
            other => other.clone(),
        }
    }

    /// Check a literal against kind, range and extension constraints.
    ///
    /// A `string` slot takes any scalar. Returns a human readable reason on
    /// failure.
    pub fn check_literal(&self, value: &LiteralValue) -> Result<(), String> {
        if self.kind == ValueKind::String {
            return Ok(());
        }

        let literal_kind = value.kind();
        let kind_ok = if self.kind.is_path_like() {
            literal_kind == ValueKind::String
        } else {
            self.kind.accepts(literal_kind)
        };
        if !kind_ok {
            return Err(format!(
                "expected a {} value but got {} '{}'",
                self.kind, literal_kind, value
            ));
        }

        if let Some(number) = value.as_f64() {
            if let Some(minimum) = self.minimum {
                if number < minimum {
                    return Err(format!("{} is below the minimum of {}", number, minimum));
                }
            }
            if let Some(maximum) = self.maximum {
                if number > maximum {
                    return Err(format!("{} is above the maximum of {}", number, maximum));
                }
            }
        }

        if self.kind == ValueKind::File {
            if let Some(path) = value.as_text() {
                if !self.allows_extension(path) {
                    return Err(format!(
                        "'{}' does not have an allowed extension ({})",
                        path,
                        self.extensions.join(", ")
                    ));
                }
            }
        }

        Ok(())
    }
}
