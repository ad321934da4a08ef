// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Serialize, Serializer};
use std::fmt;

use crate::config::consts::TASK_PATH_SEPARATOR;

/// Fully qualified name of a task inside possibly nested composites.
///
/// The root scope is the empty path. A task `simulate` inside composite
/// task `daylight` is `daylight/simulate`.
///
/// ```
/// use recipe_dag::engine::TaskPath;
///
/// let path = TaskPath::root().child("daylight").child("simulate");
/// assert_eq!(path.to_string(), "daylight/simulate");
/// assert_eq!(path.parent().unwrap().to_string(), "daylight");
/// assert_eq!(path.name(), Some("simulate"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskPath(Vec<String>);

impl TaskPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A task directly under the root scope.
    pub fn top(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// The enclosing scope. `None` for the root.
    pub fn parent(&self) -> Option<TaskPath> {
        match self.0.split_last() {
            Some((_, rest)) => Some(Self(rest.to_vec())),
            None => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of composites enclosing this task, plus one.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(TASK_PATH_SEPARATOR))
    }
}

impl Serialize for TaskPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_no_parent() {
        let root = TaskPath::root();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(root.name(), None);
        assert_eq!(root.to_string(), "");
    }

    #[test]
    fn test_top_level_parent_is_root() {
        let path = TaskPath::top("convert");
        assert_eq!(path.parent(), Some(TaskPath::root()));
        assert_eq!(path.depth(), 1);
    }

    #[test]
    fn test_serializes_as_string() {
        let path = TaskPath::top("a").child("b");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"a/b\"");
    }
}
