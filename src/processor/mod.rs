// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The charge processor.
//!
//! `charge` runs the full workflow for one request: deterministic card
//! validation first (never retried, never randomized), then flag resolution,
//! then up to `retryMax` attempts against the gateway with exponential
//! backoff between failures. Per-attempt failures are absorbed and recorded
//! on telemetry; only the final verdict reaches the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use chargeflow::flags::StaticFlagSource;
//! use chargeflow::processor::ChargeProcessor;
//! use chargeflow::types::{ChargeRequest, CreditCardInfo, Money};
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
//! println!("charged, transaction {}", result.transaction_id);
//! ```

mod types;

pub use types::{ChargeContext, ChargeProcessorOptions, LoyaltyLevel, ProcessorConfig};

use std::sync::Arc;
use std::time::Duration;

use crate::card::{expiration_is_past, CardDetails};
use crate::error::{ChargeError, GatewayError};
use crate::flags::{FeatureFlagSource, SharedFlagSource};
use crate::gateway::{PaymentGateway, SimulatedGateway};
use crate::runtime::{Clock, SharedClock, SharedRandom, SystemClock, ThreadRngSource};
use crate::telemetry::{ChargeSpan, MetricsRecorder, NoopMetrics};
use crate::types::{AttemptOutcome, ChargeRequest, ChargeResult, CreditCardInfo};

/// Orchestrates validation, retry, backoff, and telemetry for charge calls.
///
/// Holds no per-request state; a single processor serves any number of
/// concurrent invocations.
pub struct ChargeProcessor {
    gateway: Arc<dyn PaymentGateway>,
    flags: SharedFlagSource,
    metrics: Arc<dyn MetricsRecorder>,
    clock: SharedClock,
    random: SharedRandom,
    config: ProcessorConfig,
}

impl ChargeProcessor {
    /// Create a processor from explicit collaborators.
    pub fn new(options: ChargeProcessorOptions) -> Self {
        Self {
            gateway: options.gateway,
            flags: options.flags,
            metrics: options.metrics,
            clock: options.clock,
            random: options.random,
            config: options.config,
        }
    }

    /// Production wiring: simulated gateway, system clock, thread RNG, no
    /// metrics collection. Pass [`ChargeProcessorOptions`] to [`Self::new`]
    /// for anything custom.
    pub fn with_defaults(flags: SharedFlagSource) -> Self {
        let clock: SharedClock = Arc::new(SystemClock);
        let random: SharedRandom = Arc::new(ThreadRngSource);
        Self::new(ChargeProcessorOptions {
            gateway: Arc::new(SimulatedGateway::new(random.clone(), clock.clone())),
            flags,
            metrics: Arc::new(NoopMetrics),
            clock,
            random,
            config: ProcessorConfig::default(),
        })
    }

    /// The active loop tunables.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Charge a real (non-synthetic) request.
    pub async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, ChargeError> {
        self.charge_with(request, ChargeContext::default()).await
    }

    /// Charge with explicit invocation context.
    pub async fn charge_with(
        &self,
        request: ChargeRequest,
        ctx: ChargeContext,
    ) -> Result<ChargeResult, ChargeError> {
        let span = ChargeSpan::start(&request.amount);
        let card = &request.credit_card;
        let details = CardDetails::from_number(&card.number);
        span.record_card(details.card_type, details.valid);

        // Deterministic rejections happen before any attempt; retrying
        // cannot change their outcome.
        if let Err(err) = self.validate(card, &details) {
            tracing::warn!(
                parent: span.span(),
                code = err.code(),
                error = %err,
                "Charge rejected before any attempt"
            );
            span.finish(false, 0);
            return Err(err);
        }

        let retry_max = self.resolve_retry_max().await;
        let failure_rate = self.resolve_failure_rate().await;
        let loyalty = LoyaltyLevel::sample(&*self.random);
        span.record_loyalty(loyalty);

        if retry_max == 0 {
            tracing::warn!(
                parent: span.span(),
                "Retry maximum resolved to zero; no charge attempt possible"
            );
            span.finish(false, 0);
            return Err(ChargeError::NoAttemptsPossible);
        }

        let mut last_failure: Option<GatewayError> = None;
        for attempt in 1..=retry_max {
            let attempt_span = span.attempt(attempt);

            match self.gateway.charge(&request.amount, failure_rate).await {
                Ok(receipt) => {
                    let latency_ms = attempt_span.succeed();
                    let outcome = AttemptOutcome {
                        attempt,
                        succeeded: true,
                        failure_code: None,
                        latency_ms,
                    };
                    self.metrics
                        .record_attempt(outcome.succeeded, Duration::from_millis(outcome.latency_ms));

                    let charged = !ctx.synthetic;
                    if charged {
                        self.metrics.record_transaction(details.card_type, &receipt.amount);
                    }

                    let result = ChargeResult {
                        transaction_id: receipt.transaction_id,
                        card_type: details.card_type,
                        last_four_digits: card.last_four(),
                        retry_count: attempt - 1,
                        success: true,
                    };
                    tracing::info!(
                        parent: span.span(),
                        transaction_id = %result.transaction_id,
                        card_type = %result.card_type,
                        amount = %receipt.amount,
                        retry_count = result.retry_count,
                        charged,
                        "Transaction complete"
                    );
                    span.finish(charged, attempt);
                    return Ok(result);
                }
                Err(err) => {
                    let latency_ms = attempt_span.fail(err.code());
                    let outcome = AttemptOutcome {
                        attempt,
                        succeeded: false,
                        failure_code: Some(err.code()),
                        latency_ms,
                    };
                    self.metrics
                        .record_attempt(outcome.succeeded, Duration::from_millis(outcome.latency_ms));
                    last_failure = Some(err);

                    if attempt < retry_max {
                        let delay = self.backoff_delay(attempt);
                        tracing::debug!(
                            parent: span.span(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Backing off before next attempt"
                        );
                        self.clock.sleep(delay).await;
                    }
                }
            }
        }

        let last_code = last_failure.map(|e| e.code()).unwrap_or(500);
        tracing::warn!(
            parent: span.span(),
            attempts = retry_max,
            code = last_code,
            "Charge attempts exhausted"
        );
        span.finish(false, retry_max);
        Err(ChargeError::RetriesExhausted {
            attempts: retry_max,
            last_code,
        })
    }

    /// Step-1 checks: checksum/format, accepted brand, expiration. Pure
    /// given the card and the clock's current month.
    fn validate(&self, card: &CreditCardInfo, details: &CardDetails) -> Result<(), ChargeError> {
        if !details.valid {
            return Err(ChargeError::InvalidCard);
        }
        if !details.card_type.is_accepted() {
            return Err(ChargeError::UnacceptedBrand {
                card_type: details.card_type,
            });
        }
        if expiration_is_past(card.expiration_year, card.expiration_month, self.clock.now()) {
            return Err(ChargeError::expired(
                card.last_four(),
                card.expiration_month,
                card.expiration_year,
            ));
        }
        Ok(())
    }

    /// Delay before the attempt following failed attempt `attempt`:
    /// `base_delay_ms * 2^(attempt-1)`, saturating.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt - 1);
        Duration::from_millis(self.config.base_delay_ms.saturating_mul(factor))
    }

    async fn resolve_retry_max(&self) -> u32 {
        let raw = self
            .flags
            .number(&self.config.retry_max_flag, self.config.default_retry_max as f64)
            .await;
        // Negative or NaN flag values clamp to zero attempts.
        raw.max(0.0) as u32
    }

    async fn resolve_failure_rate(&self) -> f64 {
        let raw = self.flags.number(&self.config.failure_rate_flag, 0.0).await;
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{StaticFlagSource, PAYMENT_FAILURE_RATE_FLAG, PAYMENT_RETRY_MAX_FLAG};
    use crate::gateway::GatewayReceipt;
    use crate::runtime::{ManualClock, ScriptedRandom};
    use crate::telemetry::ChargeMetrics;
    use crate::types::{Money, TransactionId};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use mockall::mock;

    mock! {
        Gateway {}

        #[async_trait]
        impl PaymentGateway for Gateway {
            fn name(&self) -> &str;
            async fn charge(
                &self,
                amount: &Money,
                failure_rate: f64,
            ) -> Result<GatewayReceipt, GatewayError>;
        }
    }

    fn frozen_clock() -> Arc<ManualClock> {
        let now = chrono::Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        Arc::new(ManualClock::at(now))
    }

    fn valid_request() -> ChargeRequest {
        ChargeRequest::new(
            Money::new("USD", 49, 990_000_000).unwrap(),
            CreditCardInfo::new("4111-1111-1111-1111", 123, 2030, 1),
        )
    }

    fn processor_with(
        gateway: MockGateway,
        flags: StaticFlagSource,
        metrics: Arc<dyn MetricsRecorder>,
        clock: Arc<ManualClock>,
    ) -> ChargeProcessor {
        ChargeProcessor::new(ChargeProcessorOptions {
            gateway: Arc::new(gateway),
            flags: Arc::new(flags),
            metrics,
            clock,
            random: Arc::new(ScriptedRandom::constant(0.0)),
            config: ProcessorConfig::default(),
        })
    }

    fn accepting_gateway() -> MockGateway {
        let mut gateway = MockGateway::new();
        gateway.expect_charge().returning(|amount, _| {
            Ok(GatewayReceipt {
                transaction_id: TransactionId::new(),
                amount: amount.clone(),
            })
        });
        gateway
    }

    #[tokio::test]
    async fn test_invalid_card_never_reaches_gateway() {
        let mut gateway = MockGateway::new();
        gateway.expect_charge().times(0);
        let processor = processor_with(
            gateway,
            StaticFlagSource::new(),
            Arc::new(NoopMetrics),
            frozen_clock(),
        );

        let request = ChargeRequest::new(
            Money::new("USD", 10, 0).unwrap(),
            CreditCardInfo::new("0000-0000-0000-0000", 123, 2030, 1),
        );
        let err = processor.charge(request).await.unwrap_err();
        assert_eq!(err, ChargeError::InvalidCard);
        assert_eq!(err.code(), 400);
    }

    #[tokio::test]
    async fn test_exhaustion_with_unavailable_gateway_is_500() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_charge()
            .times(2)
            .returning(|_, _| Err(GatewayError::Unavailable("connection refused".to_string())));
        let clock = frozen_clock();
        let flags = StaticFlagSource::new().with_flag(PAYMENT_RETRY_MAX_FLAG, 2.0);
        let processor = processor_with(gateway, flags, Arc::new(NoopMetrics), clock.clone());

        let err = processor.charge(valid_request()).await.unwrap_err();
        assert_eq!(
            err,
            ChargeError::RetriesExhausted {
                attempts: 2,
                last_code: 500
            }
        );

        // One backoff between the two attempts.
        assert_eq!(clock.recorded_sleeps(), vec![Duration::from_millis(150)]);
    }

    #[tokio::test]
    async fn test_last_failure_type_decides_exhaustion_code() {
        let mut gateway = MockGateway::new();
        let mut seq = mockall::Sequence::new();
        gateway
            .expect_charge()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(GatewayError::Unavailable("flaky".to_string())));
        gateway
            .expect_charge()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(GatewayError::InvalidToken));
        let flags = StaticFlagSource::new().with_flag(PAYMENT_RETRY_MAX_FLAG, 2.0);
        let processor = processor_with(gateway, flags, Arc::new(NoopMetrics), frozen_clock());

        let err = processor.charge(valid_request()).await.unwrap_err();
        assert_eq!(
            err,
            ChargeError::RetriesExhausted {
                attempts: 2,
                last_code: 401
            }
        );
    }

    #[tokio::test]
    async fn test_retry_max_zero_makes_no_attempts() {
        let mut gateway = MockGateway::new();
        gateway.expect_charge().times(0);
        let flags = StaticFlagSource::new().with_flag(PAYMENT_RETRY_MAX_FLAG, 0.0);
        let clock = frozen_clock();
        let processor = processor_with(gateway, flags, Arc::new(NoopMetrics), clock.clone());

        let err = processor.charge(valid_request()).await.unwrap_err();
        assert_eq!(err, ChargeError::NoAttemptsPossible);
        assert_eq!(err.code(), 500);
        assert!(clock.recorded_sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_negative_retry_flag_clamps_to_zero() {
        let mut gateway = MockGateway::new();
        gateway.expect_charge().times(0);
        let flags = StaticFlagSource::new().with_flag(PAYMENT_RETRY_MAX_FLAG, -3.0);
        let processor = processor_with(gateway, flags, Arc::new(NoopMetrics), frozen_clock());

        let err = processor.charge(valid_request()).await.unwrap_err();
        assert_eq!(err, ChargeError::NoAttemptsPossible);
    }

    #[tokio::test]
    async fn test_success_records_transaction_metric() {
        let metrics = Arc::new(ChargeMetrics::new());
        let processor = processor_with(
            accepting_gateway(),
            StaticFlagSource::new(),
            metrics.clone(),
            frozen_clock(),
        );

        let result = processor.charge(valid_request()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.retry_count, 0);
        assert_eq!(metrics.transactions_for(crate::card::CardType::Visa), 1);
        assert_eq!(metrics.snapshot().attempts.successes, 1);
    }

    #[tokio::test]
    async fn test_synthetic_success_is_not_counted_as_a_charge() {
        let metrics = Arc::new(ChargeMetrics::new());
        let processor = processor_with(
            accepting_gateway(),
            StaticFlagSource::new(),
            metrics.clone(),
            frozen_clock(),
        );

        let result = processor
            .charge_with(valid_request(), ChargeContext::synthetic())
            .await
            .unwrap();
        assert!(result.success);

        // The attempt ran, the charge was never accounted.
        assert_eq!(metrics.transaction_total(), 0);
        assert_eq!(metrics.snapshot().attempts.successes, 1);
    }

    #[tokio::test]
    async fn test_failure_rate_flag_is_clamped_and_passed_through() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_charge()
            .withf(|_, rate| *rate == 1.0)
            .times(1)
            .returning(|amount, _| {
                Ok(GatewayReceipt {
                    transaction_id: TransactionId::new(),
                    amount: amount.clone(),
                })
            });
        let flags = StaticFlagSource::new().with_flag(PAYMENT_FAILURE_RATE_FLAG, 7.5);
        let processor = processor_with(gateway, flags, Arc::new(NoopMetrics), frozen_clock());

        processor.charge(valid_request()).await.unwrap();
    }

    #[test]
    fn test_backoff_schedule_doubles() {
        let clock = frozen_clock();
        let flags = StaticFlagSource::new();
        let processor = processor_with(MockGateway::new(), flags, Arc::new(NoopMetrics), clock);

        assert_eq!(processor.backoff_delay(1), Duration::from_millis(150));
        assert_eq!(processor.backoff_delay(2), Duration::from_millis(300));
        assert_eq!(processor.backoff_delay(3), Duration::from_millis(600));
        assert_eq!(processor.backoff_delay(4), Duration::from_millis(1200));
    }

    #[test]
    fn test_backoff_saturates_instead_of_overflowing() {
        let clock = frozen_clock();
        let processor = processor_with(
            MockGateway::new(),
            StaticFlagSource::new(),
            Arc::new(NoopMetrics),
            clock,
        );
        // A pathological attempt count must not panic.
        let delay = processor.backoff_delay(500);
        assert!(delay >= Duration::from_millis(150));
    }
}
