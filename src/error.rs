// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the charge workflow.
//!
//! This module provides strongly-typed errors for the processor and its
//! collaborators, using `thiserror` for ergonomic error definitions and
//! `anyhow` for propagation in the binary.
//!
//! Failures live in two disjoint code spaces: permanent validation
//! rejections (400) that must never be retried, and transient gateway
//! failures (401, escalating to 500 once retries are exhausted). Both sides
//! share the `ChargeError` shape and are told apart by [`ChargeError::code`].

use thiserror::Error;

use crate::card::CardType;

/// Errors surfaced to the caller of `ChargeProcessor::charge`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChargeError {
    /// The number failed the checksum/format check.
    #[error("Credit card info is invalid.")]
    InvalidCard,

    /// The number is valid but the brand cannot be charged.
    #[error("Sorry, we cannot process {card_type} credit cards. Only VISA or MasterCard is accepted.")]
    UnacceptedBrand { card_type: CardType },

    /// The card's expiration point lies before the current month.
    #[error("The credit card (ending {last_four}) expired on {month}/{year}.")]
    ExpiredCard {
        last_four: String,
        month: u32,
        year: i32,
    },

    /// Every attempt failed. `last_code` is the code of the final gateway
    /// failure (401 for the simulated invalid-token rejection, 500 otherwise).
    #[error("The payment could not be completed after {attempts} attempts (code {last_code}).")]
    RetriesExhausted { attempts: u32, last_code: u16 },

    /// The retry maximum resolved to zero, so no attempt was ever made.
    #[error("Payment retries are disabled; no charge attempt was made.")]
    NoAttemptsPossible,
}

impl ChargeError {
    /// Expired-card rejection for the given card.
    pub fn expired(last_four: impl Into<String>, month: u32, year: i32) -> Self {
        Self::ExpiredCard {
            last_four: last_four.into(),
            month,
            year,
        }
    }

    /// Numeric failure code in the charge code space.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidCard | Self::UnacceptedBrand { .. } | Self::ExpiredCard { .. } => 400,
            Self::RetriesExhausted { last_code, .. } => *last_code,
            Self::NoAttemptsPossible => 500,
        }
    }

    /// Permanent validation rejection; new card details are required.
    pub fn is_permanent(&self) -> bool {
        self.code() == 400
    }

    /// All retries were spent (or none were possible); trying again later
    /// may succeed.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. } | Self::NoAttemptsPossible)
    }
}

/// Per-attempt failures produced at the gateway seam. Absorbed by the retry
/// loop, never propagated to the caller directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The simulated invalid-token rejection.
    #[error("invalid request token")]
    InvalidToken,

    /// The gateway could not be reached or refused service.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Numeric code carried into exhaustion reporting.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidToken => 401,
            Self::Unavailable(_) => 500,
        }
    }

    /// Whether another attempt is worthwhile.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InvalidToken | Self::Unavailable(_))
    }
}

/// Errors constructing a [`crate::types::Money`] value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("currency code must be 3 ASCII letters, got {0:?}")]
    BadCurrencyCode(String),

    #[error("nanos out of range: {0}")]
    NanosOutOfRange(i32),

    #[error("units ({units}) and nanos ({nanos}) disagree in sign")]
    SignMismatch { units: i64, nanos: i32 },

    #[error("unparsable amount: {0:?}")]
    UnparsableAmount(String),
}

/// Errors from fallible feature-flag providers.
///
/// The bundled providers resolve defaults internally and never fail; this
/// exists for remote providers layered on the same trait.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    #[error("flag provider unreachable: {0}")]
    Unreachable(String),

    #[error("flag {name} has a non-numeric value: {value:?}")]
    NotANumber { name: String, value: String },
}

/// Result type alias using anyhow for flexible error handling in the binary.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_400() {
        assert_eq!(ChargeError::InvalidCard.code(), 400);
        assert_eq!(
            ChargeError::UnacceptedBrand {
                card_type: CardType::Amex
            }
            .code(),
            400
        );
        assert_eq!(ChargeError::expired("1111", 1, 2021).code(), 400);
    }

    #[test]
    fn test_exhaustion_codes() {
        let exhausted = ChargeError::RetriesExhausted {
            attempts: 3,
            last_code: 401,
        };
        assert_eq!(exhausted.code(), 401);
        assert!(exhausted.is_exhaustion());
        assert!(!exhausted.is_permanent());

        assert_eq!(ChargeError::NoAttemptsPossible.code(), 500);
        assert!(ChargeError::NoAttemptsPossible.is_exhaustion());
    }

    #[test]
    fn test_permanent_vs_exhaustion_are_disjoint() {
        let permanent = ChargeError::InvalidCard;
        assert!(permanent.is_permanent());
        assert!(!permanent.is_exhaustion());
    }

    #[test]
    fn test_unaccepted_brand_message() {
        let err = ChargeError::UnacceptedBrand {
            card_type: CardType::Amex,
        };
        let message = err.to_string();
        assert!(message.contains("amex"));
        assert!(message.contains("VISA or MasterCard"));
    }

    #[test]
    fn test_expired_message() {
        let err = ChargeError::expired("1111", 1, 2021);
        let message = err.to_string();
        assert!(message.contains("expired"));
        assert!(message.contains("1111"));
        assert!(message.contains("1/2021"));
    }

    #[test]
    fn test_gateway_error_codes() {
        assert_eq!(GatewayError::InvalidToken.code(), 401);
        assert_eq!(GatewayError::Unavailable("down".to_string()).code(), 500);
        assert!(GatewayError::InvalidToken.is_retryable());
    }
}
