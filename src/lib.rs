// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // task executor backends
pub mod config;     // recipes, registry, validation
pub mod engine;     // planning and running
pub mod errors;     // error handling
pub mod observability;
pub mod traits;     // executor and registry seams
pub mod utils;      // path helpers
