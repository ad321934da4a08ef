// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lexical path helpers used by routing and validation.
//!
//! Nothing in here touches the filesystem. Paths in a recipe are always
//! relative to some run root, so these helpers reject anything absolute and
//! anything that climbs out of the root with `..`.

use std::path::{Component, Path, PathBuf};

/// Normalize a relative path lexically, resolving `.` and `..` segments.
///
/// Returns `None` for absolute paths and for paths that escape the root.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use recipe_dag::utils::normalize_relative;
///
/// assert_eq!(
///     normalize_relative(Path::new("annual_daylight/../results")),
///     Some(PathBuf::from("results"))
/// );
/// assert_eq!(normalize_relative(Path::new("../outside")), None);
/// ```
pub fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::Normal(part) => parts.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.iter().collect())
}

/// Join `sub_path` onto `base`, refusing sub-paths that are absolute or that
/// climb above `base`.
pub fn join_sub_path(base: &Path, sub_path: &str) -> Option<PathBuf> {
    let normalized = normalize_relative(Path::new(sub_path))?;
    if normalized.as_os_str().is_empty() {
        return Some(base.to_path_buf());
    }
    Some(base.join(normalized))
}

/// Lower-cased extension of the final component, without the dot.
pub fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// If `path` equals `prefix` or lies below it, return the remainder.
pub fn strip_route_prefix(path: &Path, prefix: &Path) -> Option<PathBuf> {
    path.strip_prefix(prefix).ok().map(Path::to_path_buf)
}
