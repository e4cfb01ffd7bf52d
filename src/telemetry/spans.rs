// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Span guards for the charge call hierarchy.

use std::time::Instant;

use tracing::{info_span, Span};

use crate::card::CardType;
use crate::processor::LoyaltyLevel;
use crate::types::Money;

/// RAII guard for the parent span of one `charge` invocation.
///
/// Attributes that are only known later (card verdict, loyalty level, final
/// `charged` flag) are declared empty at creation and recorded as the
/// workflow progresses.
pub struct ChargeSpan {
    span: Span,
    start: Instant,
}

impl ChargeSpan {
    /// Open the parent span for a charge of `amount`.
    pub fn start(amount: &Money) -> Self {
        let span = info_span!(
            "charge",
            currency = %amount.currency_code,
            card_type = tracing::field::Empty,
            card_valid = tracing::field::Empty,
            loyalty_level = tracing::field::Empty,
            charged = tracing::field::Empty,
            attempts = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
        }
    }

    /// Get the underlying tracing span.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Record the card verdict from validation.
    pub fn record_card(&self, card_type: CardType, valid: bool) {
        self.span.record("card_type", card_type.to_string().as_str());
        self.span.record("card_valid", valid);
    }

    /// Record the sampled loyalty level.
    pub fn record_loyalty(&self, level: LoyaltyLevel) {
        self.span.record("loyalty_level", level.as_str());
    }

    /// Open a child span for one attempt.
    pub fn attempt(&self, attempt: u32) -> AttemptSpan {
        AttemptSpan::start(&self.span, attempt)
    }

    /// Close the span, recording whether a real charge was applied and how
    /// many attempts ran. Synthetic requests pass `charged = false` here
    /// even when the gateway accepted the charge.
    pub fn finish(self, charged: bool, attempts: u32) {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.span.record("charged", charged);
        self.span.record("attempts", attempts);

        tracing::debug!(
            parent: &self.span,
            duration_ms,
            "Charge span closed"
        );
    }
}

/// RAII guard for one attempt's child span. Ended after every attempt
/// regardless of outcome.
pub struct AttemptSpan {
    span: Span,
    start: Instant,
}

impl AttemptSpan {
    fn start(parent: &Span, attempt: u32) -> Self {
        let span = info_span!(
            parent: parent,
            "charge_attempt",
            attempt,
            success = tracing::field::Empty,
            failure_code = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
        }
    }

    /// Close the span as successful. Returns the observed latency in
    /// milliseconds for downstream bookkeeping.
    pub fn succeed(self) -> u64 {
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.span.record("success", true);
        self.span.record("latency_ms", latency_ms);
        latency_ms
    }

    /// Close the span as failed with the gateway's failure code. Returns the
    /// observed latency in milliseconds.
    pub fn fail(self, code: u16) -> u64 {
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.span.record("success", false);
        self.span.record("failure_code", code);
        self.span.record("latency_ms", latency_ms);

        tracing::warn!(
            parent: &self.span,
            code,
            "Charge attempt failed"
        );
        latency_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_span_lifecycle() {
        let amount = Money::new("USD", 10, 0).unwrap();
        let span = ChargeSpan::start(&amount);
        span.record_card(CardType::Visa, true);
        span.record_loyalty(LoyaltyLevel::Gold);
        span.finish(true, 1);
    }

    #[test]
    fn test_attempt_span_success_reports_latency() {
        let amount = Money::new("USD", 10, 0).unwrap();
        let span = ChargeSpan::start(&amount);
        let attempt = span.attempt(1);
        let latency = attempt.succeed();
        assert!(latency < 1000); // nothing slept here
        span.finish(true, 1);
    }

    #[test]
    fn test_attempt_span_failure() {
        let amount = Money::new("USD", 10, 0).unwrap();
        let span = ChargeSpan::start(&amount);
        let attempt = span.attempt(1);
        attempt.fail(401);
        span.finish(false, 1);
    }
}
