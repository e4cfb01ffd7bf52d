// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The external payment gateway seam.
//!
//! The processor talks to whatever sits behind [`PaymentGateway`]; in this
//! repository that is the [`simulated::SimulatedGateway`], which stands in
//! for the real processor with injected failures and randomized latency.
//! Tests substitute their own implementations to drive specific failure
//! sequences.

pub mod simulated;

pub use simulated::{SimulatedGateway, SimulatedGatewayConfig};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{Money, TransactionId};

/// What a successful gateway call hands back: a fresh transaction id and an
/// echo of the charged amount.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReceipt {
    /// Identifier minted by the gateway for this transaction.
    pub transaction_id: TransactionId,
    /// The amount that was charged.
    pub amount: Money,
}

/// One charge attempt against the external processor.
///
/// `failure_rate` is resolved from feature flags per charge invocation and
/// passed through on every attempt; implementations that do not inject
/// failures ignore it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Implementation name, for spans and logs.
    fn name(&self) -> &str;

    /// Attempt to charge `amount` once.
    async fn charge(&self, amount: &Money, failure_rate: f64) -> Result<GatewayReceipt, GatewayError>;
}

/// Shared handle to a gateway.
pub type SharedGateway = Arc<dyn PaymentGateway>;
