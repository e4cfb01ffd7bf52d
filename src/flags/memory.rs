// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fixed in-memory flag values.

use std::collections::HashMap;

use async_trait::async_trait;

use super::FeatureFlagSource;

/// A flag source backed by a plain map. The primary source for tests and for
/// callers that resolve their configuration up front (e.g. the CLI).
#[derive(Debug, Clone, Default)]
pub struct StaticFlagSource {
    flags: HashMap<String, f64>,
}

impl StaticFlagSource {
    /// Create an empty source; every lookup resolves to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style flag assignment.
    pub fn with_flag(mut self, name: impl Into<String>, value: f64) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    /// Set a flag on an existing source.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.flags.insert(name.into(), value);
    }

    /// Whether any flag has been assigned.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

#[async_trait]
impl FeatureFlagSource for StaticFlagSource {
    async fn number(&self, name: &str, default: f64) -> f64 {
        self.flags.get(name).copied().unwrap_or(default)
    }
}
