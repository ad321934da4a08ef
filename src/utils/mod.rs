// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod paths;

pub use paths::{extension_of, join_sub_path, normalize_relative, strip_route_prefix};
