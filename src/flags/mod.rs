// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Feature-flag sources for the charge workflow.
//!
//! The processor reads two numeric flags at the start of every charge
//! invocation: the retry cap and the failure-injection rate. This module
//! provides the [`FeatureFlagSource`] trait plus the bundled providers:
//!
//! - [`memory::StaticFlagSource`] - fixed in-memory values
//! - [`env::EnvFlagSource`] - environment-variable backed values
//!
//! Flag names are provider-defined strings; the constants below are the
//! defaults and can be remapped through the processor's config.

pub mod env;
pub mod memory;

pub use env::EnvFlagSource;
pub use memory::StaticFlagSource;

use std::sync::Arc;

use async_trait::async_trait;

/// Flag naming the maximum number of charge attempts.
pub const PAYMENT_RETRY_MAX_FLAG: &str = "paymentRetryMax";

/// Flag naming the injected per-attempt failure probability.
pub const PAYMENT_FAILURE_RATE_FLAG: &str = "paymentFailureRate";

/// A named-value lookup consulted at the start of each charge invocation.
///
/// Providers resolve the default themselves; lookups are infallible so a
/// flag outage can never take charging down with it.
#[async_trait]
pub trait FeatureFlagSource: Send + Sync {
    /// Resolve a numeric flag, returning `default` when unset.
    async fn number(&self, name: &str, default: f64) -> f64;
}

/// Shared handle to a flag source.
pub type SharedFlagSource = Arc<dyn FeatureFlagSource>;
