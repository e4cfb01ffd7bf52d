// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Environment-variable backed flag values.

use async_trait::async_trait;

use super::FeatureFlagSource;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "CHARGEFLOW";

/// Resolves flags from `PREFIX_FLAG_NAME` environment variables, with the
/// camelCase flag name rewritten as SHOUTY_SNAKE. `paymentRetryMax` under the
/// default prefix becomes `CHARGEFLOW_PAYMENT_RETRY_MAX`.
#[derive(Debug, Clone)]
pub struct EnvFlagSource {
    prefix: String,
}

impl EnvFlagSource {
    /// Source with the default `CHARGEFLOW` prefix.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Source with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The environment variable a flag name maps to.
    pub fn var_name(&self, flag: &str) -> String {
        format!("{}_{}", self.prefix, shouty_snake(flag))
    }
}

impl Default for EnvFlagSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureFlagSource for EnvFlagSource {
    async fn number(&self, name: &str, default: f64) -> f64 {
        let var = self.var_name(name);
        match std::env::var(&var) {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(%var, value = %raw, "Ignoring non-numeric flag value");
                default
            }),
            Err(_) => default,
        }
    }
}

/// camelCase to SHOUTY_SNAKE.
fn shouty_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() && !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}
