// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chargeflow - a payment charge workflow with observable retries.
//!
//! The processor validates a credit card, resolves a retry cap and a
//! failure-injection rate from feature flags, then runs up to that many
//! attempts against a simulated external gateway with exponential backoff,
//! emitting one parent span per charge and one child span per attempt.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Core value types (Money, CreditCardInfo, ChargeRequest, ChargeResult)
//! - [`card`] - Deterministic brand detection and validity checks
//! - [`error`] - Error types, the 400/401/500 code space, and result aliases
//! - [`flags`] - Feature-flag sources (retry cap, failure rate)
//! - [`gateway`] - The external-gateway seam and its simulated implementation
//! - [`processor`] - The retry/backoff state machine itself
//! - [`runtime`] - Injectable clock and randomness sources
//! - [`telemetry`] - Span guards, metrics recorders, subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use chargeflow::{ChargeProcessor, ChargeRequest, CreditCardInfo, Money, StaticFlagSource};
//! use std::sync::Arc;
//!
//! let flags = Arc::new(StaticFlagSource::new());
//! let processor = ChargeProcessor::with_defaults(flags);
//!
//! let request = ChargeRequest::new(
//!     Money::new("USD", 49, 990_000_000)?,
//!     CreditCardInfo::new("4111-1111-1111-1111", 123, 2030, 1),
//! );
//! let result = processor.charge(request).await?;
//! assert_eq!(result.retry_count, 0);
//! ```

pub mod card;
pub mod error;
pub mod flags;
pub mod gateway;
pub mod processor;
pub mod runtime;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use card::{CardDetails, CardType};
pub use error::{ChargeError, FlagError, GatewayError, MoneyError, Result};
pub use flags::{
    EnvFlagSource, FeatureFlagSource, SharedFlagSource, StaticFlagSource,
    PAYMENT_FAILURE_RATE_FLAG, PAYMENT_RETRY_MAX_FLAG,
};
pub use gateway::{GatewayReceipt, PaymentGateway, SharedGateway, SimulatedGateway};
pub use processor::{
    ChargeContext, ChargeProcessor, ChargeProcessorOptions, LoyaltyLevel, ProcessorConfig,
};
pub use runtime::{
    Clock, ManualClock, RandomSource, ScriptedRandom, SharedClock, SharedRandom, SystemClock,
    ThreadRngSource,
};
pub use telemetry::{ChargeMetrics, MetricsRecorder, NoopMetrics};
pub use types::{
    AttemptOutcome, ChargeRequest, ChargeResult, CreditCardInfo, Money, TransactionId,
};

/// Chargeflow version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        // Verify key types are accessible from the crate root
        let _card = CreditCardInfo::new("4111111111111111", 123, 2030, 1);
        let _flags = StaticFlagSource::new();
        let _details = CardDetails::from_number("4111111111111111");
    }
}
