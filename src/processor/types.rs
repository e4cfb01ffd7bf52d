// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Processor configuration and invocation types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::flags::{SharedFlagSource, PAYMENT_FAILURE_RATE_FLAG, PAYMENT_RETRY_MAX_FLAG};
use crate::gateway::SharedGateway;
use crate::runtime::{RandomSource, SharedClock, SharedRandom};
use crate::telemetry::MetricsRecorder;

/// Tunables of the retry loop. `Default` carries the reference values.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Backoff before attempt k+1 is `base_delay_ms * 2^(k-1)`.
    pub base_delay_ms: u64,
    /// Attempt cap when the retry flag is unset.
    pub default_retry_max: u32,
    /// Flag name for the attempt cap.
    pub retry_max_flag: String,
    /// Flag name for the injected failure probability.
    pub failure_rate_flag: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 150,
            default_retry_max: 4,
            retry_max_flag: PAYMENT_RETRY_MAX_FLAG.to_string(),
            failure_rate_flag: PAYMENT_FAILURE_RATE_FLAG.to_string(),
        }
    }
}

/// Per-invocation context the request itself does not carry.
///
/// `synthetic` marks automated test/load traffic: the charge proceeds
/// normally but must never be counted as a real charge in telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChargeContext {
    /// Whether this invocation originates from synthetic traffic.
    pub synthetic: bool,
}

impl ChargeContext {
    /// Context for a synthetic (non-accounted) invocation.
    pub fn synthetic() -> Self {
        Self { synthetic: true }
    }
}

/// Telemetry-only customer tier, sampled uniformly per invocation. Never
/// affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyLevel {
    Platinum,
    Gold,
    Silver,
    Bronze,
}

impl LoyaltyLevel {
    /// All tiers, in sampling order.
    pub const ALL: [LoyaltyLevel; 4] = [
        LoyaltyLevel::Platinum,
        LoyaltyLevel::Gold,
        LoyaltyLevel::Silver,
        LoyaltyLevel::Bronze,
    ];

    /// Sample a tier uniformly.
    pub fn sample(random: &dyn RandomSource) -> Self {
        Self::ALL[random.uniform_u64(Self::ALL.len() as u64 - 1) as usize]
    }

    /// Tier name for span attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platinum => "platinum",
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Bronze => "bronze",
        }
    }
}

impl fmt::Display for LoyaltyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Collaborators and configuration for building a processor.
pub struct ChargeProcessorOptions {
    /// Gateway the attempts run against.
    pub gateway: SharedGateway,
    /// Source of the retry cap and failure rate.
    pub flags: SharedFlagSource,
    /// Metrics sink.
    pub metrics: Arc<dyn MetricsRecorder>,
    /// Time source for expiry checks and backoff sleeps.
    pub clock: SharedClock,
    /// Randomness for loyalty sampling.
    pub random: SharedRandom,
    /// Loop tunables.
    pub config: ProcessorConfig,
}
