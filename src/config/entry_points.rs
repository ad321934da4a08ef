// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// A type-safe wrapper for recipe entry points - tasks with no dependencies.
///
/// Entry points only read graph inputs and literals, so they make up the
/// first level of every plan.
///
/// # Examples
///
/// ```
/// use recipe_dag::config::EntryPoints;
///
/// let mut entry_points = EntryPoints::new();
/// entry_points.add("convert_epw".to_string());
/// entry_points.add("create_sky".to_string());
///
/// let names: Vec<&String> = entry_points.iter().collect();
/// assert_eq!(names.len(), 2);
///
/// let vec_form: Vec<String> = entry_points.into();
/// assert_eq!(vec_form[0], "convert_epw");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPoints(pub Vec<String>);

impl EntryPoints {
    /// Create a new empty entrypoints list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add an entrypoint
    pub fn add(&mut self, task: String) {
        self.0.push(task);
    }

    /// Get iterator over entrypoints
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn contains(&self, task: &str) -> bool {
        self.0.iter().any(|entry| entry == task)
    }
}

impl From<Vec<String>> for EntryPoints {
    fn from(entrypoints: Vec<String>) -> Self {
        Self(entrypoints)
    }
}

impl From<EntryPoints> for Vec<String> {
    fn from(value: EntryPoints) -> Self {
        value.0
    }
}
