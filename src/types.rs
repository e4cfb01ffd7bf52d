// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core value types for the charge workflow.
//!
//! Everything here is a plain value: constructed by the caller, passed into
//! the processor by value, never mutated. All wire-facing types serialize
//! with camelCase field names so the `units`/`nanos` money split round-trips
//! losslessly through any JSON transport.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::CardType;
use crate::error::MoneyError;

// ============================================================================
// Money
// ============================================================================

/// Largest magnitude `nanos` may carry (one unit minus one nano).
pub const MAX_NANOS: i32 = 999_999_999;

/// A monetary amount split into whole `units` and fractional `nanos`.
///
/// Invariant: `nanos` lies in `[-999_999_999, 999_999_999]`, and when
/// `units != 0` the sign of `nanos` matches the sign of `units`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// ISO 4217 currency code (3 letters).
    pub currency_code: String,
    /// Whole currency units.
    pub units: i64,
    /// Fractional part in nano-units.
    pub nanos: i32,
}

impl Money {
    /// Create a validated amount.
    pub fn new(currency_code: impl Into<String>, units: i64, nanos: i32) -> Result<Self, MoneyError> {
        let money = Self {
            currency_code: currency_code.into(),
            units,
            nanos,
        };
        money.validate()?;
        Ok(money)
    }

    /// Check the currency code, nanos range, and sign invariant.
    pub fn validate(&self) -> Result<(), MoneyError> {
        let code_ok = self.currency_code.len() == 3
            && self.currency_code.chars().all(|c| c.is_ascii_alphabetic());
        if !code_ok {
            return Err(MoneyError::BadCurrencyCode(self.currency_code.clone()));
        }
        if self.nanos.abs() > MAX_NANOS {
            return Err(MoneyError::NanosOutOfRange(self.nanos));
        }
        if self.units != 0 && self.nanos != 0 && (self.units < 0) != (self.nanos < 0) {
            return Err(MoneyError::SignMismatch {
                units: self.units,
                nanos: self.nanos,
            });
        }
        Ok(())
    }

    /// Parse a decimal string like `"49.99"` into a validated amount.
    ///
    /// Accepts an optional leading sign and up to nine fractional digits.
    pub fn from_decimal_str(currency_code: impl Into<String>, s: &str) -> Result<Self, MoneyError> {
        let raw = s.trim();
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };

        let (units_part, frac_part) = match digits.split_once('.') {
            Some((u, f)) => (u, f),
            None => (digits, ""),
        };

        let parse_err = || MoneyError::UnparsableAmount(s.to_string());
        if units_part.is_empty() && frac_part.is_empty() {
            return Err(parse_err());
        }
        if frac_part.len() > 9 {
            return Err(parse_err());
        }

        let mut units: i64 = if units_part.is_empty() {
            0
        } else {
            units_part.parse().map_err(|_| parse_err())?
        };
        let mut nanos: i32 = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{frac_part:0<9}");
            padded.parse().map_err(|_| parse_err())?
        };

        if negative {
            units = -units;
            nanos = -nanos;
        }
        Self::new(currency_code, units, nanos)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 || self.nanos < 0 { "-" } else { "" };
        let units = self.units.unsigned_abs();
        let nanos = self.nanos.unsigned_abs();
        if nanos == 0 {
            write!(f, "{sign}{units} {}", self.currency_code)
        } else {
            let frac = format!("{nanos:09}");
            write!(f, "{sign}{units}.{} {}", frac.trim_end_matches('0'), self.currency_code)
        }
    }
}

// ============================================================================
// Card Info
// ============================================================================

/// Card details as submitted by the caller. Validation happens in the
/// processor; this type carries the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardInfo {
    /// Card number, separators allowed.
    pub number: String,
    /// Card verification value.
    pub cvv: i32,
    /// Four-digit expiration year.
    pub expiration_year: i32,
    /// Expiration month, 1-12.
    pub expiration_month: u32,
}

impl CreditCardInfo {
    /// Create card info from its parts.
    pub fn new(
        number: impl Into<String>,
        cvv: i32,
        expiration_year: i32,
        expiration_month: u32,
    ) -> Self {
        Self {
            number: number.into(),
            cvv,
            expiration_year,
            expiration_month,
        }
    }

    /// The last four digits of the number, separators ignored.
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self.number.chars().filter(|c| c.is_ascii_digit()).collect();
        let start = digits.len().saturating_sub(4);
        digits[start..].iter().collect()
    }
}

// ============================================================================
// Charge Request / Result
// ============================================================================

/// A single charge invocation's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    /// Amount to charge.
    pub amount: Money,
    /// Card to charge against.
    pub credit_card: CreditCardInfo,
}

impl ChargeRequest {
    /// Create a charge request.
    pub fn new(amount: Money, credit_card: CreditCardInfo) -> Self {
        Self {
            amount,
            credit_card,
        }
    }
}

/// The successful outcome of a charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResult {
    /// Identifier generated for the completed transaction.
    pub transaction_id: TransactionId,
    /// Detected card brand.
    pub card_type: CardType,
    /// Last four digits of the charged card.
    pub last_four_digits: String,
    /// Number of failed attempts before the one that succeeded.
    pub retry_count: u32,
    /// Always true on this type; failures surface as `ChargeError`.
    pub success: bool,
}

/// The outcome of one attempt inside the retry loop. Ephemeral: consumed by
/// telemetry, never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Whether the gateway accepted the charge.
    pub succeeded: bool,
    /// Failure code when `succeeded` is false (401 for the simulated
    /// invalid-token rejection).
    pub failure_code: Option<u16>,
    /// Observed attempt latency in milliseconds.
    pub latency_ms: u64,
}

// ============================================================================
// Transaction Id
// ============================================================================

/// A unique identifier minted for each completed transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Whether this is the all-zero UUID.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Short representation (first 8 characters) for log lines.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.short())
    }
}

impl From<Uuid> for TransactionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl serde::Serialize for TransactionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Uuid::deserialize(deserializer).map(Self)
    }
}
