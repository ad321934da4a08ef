// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AtomicContract, DagGraph, Template, TemplateRef};
use crate::traits::TemplateRegistry;

/// A registry document: atomic contracts and embeddable recipes.
///
/// # Example
/// ```yaml
/// atomic:
///   - name: convert-epw
///     parameters:
///       - name: epw
///         kind: file
///         extensions: [epw]
///     outputs:
///       - name: wea
///         kind: file
///         path: weather.wea
/// recipes:
///   - name: weather
///     inputs: [...]
///     tasks: [...]
///     outputs: [...]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub atomic: Vec<AtomicContract>,
    #[serde(default)]
    pub recipes: Vec<DagGraph>,
}

/// A type-safe in-memory registry mapping template references to templates.
///
/// Each template is registered under its bare name and, when it carries a
/// version, also under `name@version`. Lookup tries the exact reference
/// first, so `annual-daylight@0.9.0` finds a versioned entry while plain
/// `annual-daylight` finds the latest one registered. A pinned reference
/// falls back to the bare name only when that entry carries no version of
/// its own.
///
/// ```
/// use recipe_dag::config::{AtomicContract, TemplateMap, TemplateRef};
/// use recipe_dag::traits::TemplateRegistry;
///
/// let mut templates = TemplateMap::new();
/// templates.insert_atomic(AtomicContract::new("convert-epw"));
///
/// assert!(templates.contains_key("convert-epw"));
/// assert!(templates.resolve(&TemplateRef::new("convert-epw@1.0.0")).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateMap(pub HashMap<String, Template>);

impl TemplateMap {
    /// Create a new empty template map
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Build a map from a parsed registry document
    pub fn from_document(document: RegistryDocument) -> Self {
        let mut map = Self::new();
        for contract in document.atomic {
            map.insert_atomic(contract);
        }
        for recipe in document.recipes {
            map.insert_recipe(recipe);
        }
        map
    }

    /// Insert a template under an explicit key
    pub fn insert(&mut self, key: impl Into<String>, template: Template) {
        self.0.insert(key.into(), template);
    }

    pub fn insert_atomic(&mut self, contract: AtomicContract) {
        let keys = registry_keys(&contract.name, contract.version.as_deref());
        let template = Template::Atomic(Arc::new(contract));
        for key in keys {
            self.insert(key, template.clone());
        }
    }

    pub fn insert_recipe(&mut self, recipe: DagGraph) {
        let keys = registry_keys(&recipe.name, recipe.version.as_deref());
        let template = Template::Composite(Arc::new(recipe));
        for key in keys {
            self.insert(key, template.clone());
        }
    }

    /// Get a template by exact key
    pub fn get(&self, key: &str) -> Option<&Template> {
        self.0.get(key)
    }

    /// Check if a template key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Get all registered keys
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TemplateRegistry for TemplateMap {
    fn resolve(&self, reference: &TemplateRef) -> Option<Template> {
        if let Some(template) = self.0.get(reference.as_str()) {
            return Some(template.clone());
        }
        self.0
            .get(reference.name())
            .filter(|template| reference.version().is_none() || template.version().is_none())
            .cloned()
    }
}

impl From<HashMap<String, Template>> for TemplateMap {
    fn from(map: HashMap<String, Template>) -> Self {
        Self(map)
    }
}

impl From<TemplateMap> for HashMap<String, Template> {
    fn from(map: TemplateMap) -> Self {
        map.0
    }
}

fn registry_keys(name: &str, version: Option<&str>) -> Vec<String> {
    match version {
        Some(version) => vec![name.to_string(), format!("{}@{}", name, version)],
        None => vec![name.to_string()],
    }
}
