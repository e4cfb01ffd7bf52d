// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Simulated external payment gateway.
//!
//! Stands in for the real processor: draws a failure decision from the
//! injected failure rate, sleeps a bounded random latency, and either mints
//! a receipt or rejects with the invalid-token error.

use std::time::Duration;

use async_trait::async_trait;

use super::{GatewayReceipt, PaymentGateway};
use crate::error::GatewayError;
use crate::runtime::{Clock, RandomSource, SharedClock, SharedRandom};
use crate::types::{Money, TransactionId};

/// Latency bounds for the simulation.
#[derive(Debug, Clone)]
pub struct SimulatedGatewayConfig {
    /// Upper bound on successful-call latency, milliseconds.
    pub success_latency_max_ms: u64,
    /// Upper bound on failed-call latency, milliseconds.
    pub error_latency_max_ms: u64,
}

impl Default for SimulatedGatewayConfig {
    fn default() -> Self {
        Self {
            success_latency_max_ms: 200,
            error_latency_max_ms: 1000,
        }
    }
}

/// The simulated gateway. Failure injection happens here, at the seam the
/// failures are supposed to come from, so the retry loop sees them exactly
/// as it would see a real processor's rejections.
pub struct SimulatedGateway {
    config: SimulatedGatewayConfig,
    random: SharedRandom,
    clock: SharedClock,
}

impl SimulatedGateway {
    /// Gateway with reference latency bounds.
    pub fn new(random: SharedRandom, clock: SharedClock) -> Self {
        Self::with_config(SimulatedGatewayConfig::default(), random, clock)
    }

    /// Gateway with explicit latency bounds.
    pub fn with_config(
        config: SimulatedGatewayConfig,
        random: SharedRandom,
        clock: SharedClock,
    ) -> Self {
        Self {
            config,
            random,
            clock,
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn charge(&self, amount: &Money, failure_rate: f64) -> Result<GatewayReceipt, GatewayError> {
        let should_fail = failure_rate > 0.0 && self.random.uniform() < failure_rate;

        if should_fail {
            let latency = self.random.uniform_u64(self.config.error_latency_max_ms);
            self.clock.sleep(Duration::from_millis(latency)).await;
            return Err(GatewayError::InvalidToken);
        }

        let latency = self.random.uniform_u64(self.config.success_latency_max_ms);
        self.clock.sleep(Duration::from_millis(latency)).await;
        Ok(GatewayReceipt {
            transaction_id: TransactionId::new(),
            amount: amount.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ManualClock, ScriptedRandom};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn amount() -> Money {
        Money::new("USD", 10, 0).unwrap()
    }

    fn manual_clock() -> Arc<ManualClock> {
        let now = chrono::Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        Arc::new(ManualClock::at(now))
    }

    #[tokio::test]
    async fn test_zero_rate_always_succeeds() {
        let clock = manual_clock();
        let gateway = SimulatedGateway::new(Arc::new(ScriptedRandom::constant(0.99)), clock);

        for _ in 0..5 {
            let receipt = gateway.charge(&amount(), 0.0).await.unwrap();
            assert_eq!(receipt.amount, amount());
            assert!(!receipt.transaction_id.is_nil());
        }
    }

    #[tokio::test]
    async fn test_full_rate_always_fails_with_invalid_token() {
        let clock = manual_clock();
        let gateway = SimulatedGateway::new(Arc::new(ScriptedRandom::constant(0.5)), clock);

        for _ in 0..5 {
            let err = gateway.charge(&amount(), 1.0).await.unwrap_err();
            assert_eq!(err, GatewayError::InvalidToken);
        }
    }

    #[tokio::test]
    async fn test_failure_decision_compares_draw_to_rate() {
        let clock = manual_clock();

        // Draw below the rate fails, draw above it succeeds.
        let gateway = SimulatedGateway::new(Arc::new(ScriptedRandom::new([0.4, 0.0])), clock.clone());
        assert!(gateway.charge(&amount(), 0.5).await.is_err());

        let gateway = SimulatedGateway::new(Arc::new(ScriptedRandom::new([0.6, 0.0])), clock);
        assert!(gateway.charge(&amount(), 0.5).await.is_ok());
    }

    #[tokio::test]
    async fn test_latency_is_drawn_and_slept() {
        let clock = manual_clock();
        // First draw decides failure, second draws latency at half the bound.
        let random = Arc::new(ScriptedRandom::new([0.5, 0.5]));
        let gateway = SimulatedGateway::new(random, clock.clone());

        gateway.charge(&amount(), 1.0).await.unwrap_err();

        let sleeps = clock.recorded_sleeps();
        assert_eq!(sleeps.len(), 1);
        assert!(sleeps[0] <= Duration::from_millis(1000));
        assert_eq!(sleeps[0], Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_receipts_have_unique_ids() {
        let clock = manual_clock();
        let gateway = SimulatedGateway::new(Arc::new(ScriptedRandom::constant(0.0)), clock);

        let a = gateway.charge(&amount(), 0.0).await.unwrap();
        let b = gateway.charge(&amount(), 0.0).await.unwrap();
        assert_ne!(a.transaction_id, b.transaction_id);
    }
}
