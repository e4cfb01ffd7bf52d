// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Card brand detection and validity checks.
//!
//! Everything in this module is a pure function of its input: the same number
//! always yields the same verdict, so the processor can run these checks
//! before any retry logic without randomness leaking in.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Card brand, derived from the number's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardType {
    /// Whether this brand can be charged (VISA or MasterCard only).
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Visa | Self::Mastercard)
    }

    /// Number lengths the brand issues.
    fn allowed_lengths(&self) -> &'static [usize] {
        match self {
            Self::Visa => &[13, 16, 19],
            Self::Mastercard => &[16],
            Self::Amex => &[15],
            Self::Discover => &[16, 19],
            Self::Unknown => &[],
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Amex => "amex",
            Self::Discover => "discover",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Verdict derived from a card number. Not stored anywhere; recomputed per
/// charge invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardDetails {
    /// Detected brand (prefix rules), regardless of validity.
    pub card_type: CardType,
    /// Checksum, brand, and length all check out.
    pub valid: bool,
}

impl CardDetails {
    /// Derive brand and validity from a card number.
    ///
    /// Spaces and dashes are accepted as separators; any other non-digit
    /// character makes the number invalid.
    pub fn from_number(number: &str) -> Self {
        let stripped: String = number.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_digit()) {
            return Self {
                card_type: CardType::Unknown,
                valid: false,
            };
        }

        let card_type = detect_brand(&stripped);
        let valid = card_type.allowed_lengths().contains(&stripped.len()) && luhn_valid(&stripped);
        Self { card_type, valid }
    }
}

/// Prefix rules of the major card-numbering schemes.
fn detect_brand(digits: &str) -> CardType {
    let prefix = |n: usize| -> u32 {
        digits
            .get(..n)
            .and_then(|p| p.parse().ok())
            .unwrap_or(0)
    };

    if digits.starts_with('4') {
        return CardType::Visa;
    }
    if (51..=55).contains(&prefix(2)) || (2221..=2720).contains(&prefix(4)) {
        return CardType::Mastercard;
    }
    if matches!(prefix(2), 34 | 37) {
        return CardType::Amex;
    }
    if prefix(4) == 6011 || prefix(2) == 65 || (644..=649).contains(&prefix(3)) {
        return CardType::Discover;
    }
    CardType::Unknown
}

/// Luhn checksum over an all-digit string.
fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    let mut double = false;
    for c in digits.chars().rev() {
        let mut d = c.to_digit(10).unwrap_or(0);
        if double {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        double = !double;
    }
    sum % 10 == 0
}

/// Whether an expiration point lies strictly before `now`, comparing
/// `year * 12 + month` on both sides.
pub fn expiration_is_past(expiration_year: i32, expiration_month: u32, now: DateTime<Utc>) -> bool {
    let expires = expiration_year * 12 + expiration_month as i32;
    let current = now.year() * 12 + now.month() as i32;
    expires < current
}
