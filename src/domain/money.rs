//! Money conversion and validation
//!
//! Balances are stored as integer minor units (cents). User-facing amounts
//! are decimal major units and are converted exactly once, here, before any
//! arithmetic touches a balance. No floating point survives past this module.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minor units per major unit (cents per dollar).
const MINOR_PER_MAJOR: i64 = 100;

/// Maximum allowed amount in major units (1 trillion)
const MAX_MAJOR: &str = "1000000000000";

/// Errors that can occur when converting or validating an amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Amount exceeds maximum allowed value ({MAX_MAJOR})")]
    Overflow,

    #[error("Amount is not representable in minor units: {0}")]
    NotRepresentable(Decimal),
}

/// Convert a major-unit decimal amount to integer minor units.
///
/// Multiplies by 100 and rounds half away from zero. Rounding here absorbs
/// any binary floating-point representation error carried in from the
/// request boundary, so `19.99` always becomes exactly `1999`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, AmountError> {
    let max = Decimal::from_str(MAX_MAJOR).expect("Invalid MAX_MAJOR constant");
    if amount.abs() > max {
        return Err(AmountError::Overflow);
    }

    let scaled = amount
        .checked_mul(Decimal::from(MINOR_PER_MAJOR))
        .ok_or(AmountError::Overflow)?;

    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AmountError::NotRepresentable(amount))
}

/// Convert integer minor units back to a major-unit decimal (scale 2).
pub fn to_major_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// A valid minor-unit balance value is a non-negative integer.
pub fn is_valid_minor_amount(minor: i64) -> bool {
    minor >= 0
}

/// A validated transfer amount.
///
/// # Invariants
/// - Strictly positive: at least one minor unit
/// - Within the maximum amount cap
///
/// Carries both the exact minor-unit value used for balance arithmetic and
/// the major-unit decimal as originally requested, which the ledger persists
/// for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAmount {
    minor: i64,
    major: Decimal,
}

impl TransferAmount {
    /// Validate and normalize a major-unit amount for transfer.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if the value is zero or negative, or
    ///   rounds to fewer than one minor unit
    /// - `AmountError::Overflow` if the value exceeds the cap
    pub fn from_major(amount: Decimal) -> Result<Self, AmountError> {
        if amount <= Decimal::ZERO {
            return Err(AmountError::NotPositive(amount));
        }

        let minor = to_minor_units(amount)?;
        if minor <= 0 {
            return Err(AmountError::NotPositive(amount));
        }

        Ok(Self { minor, major: amount })
    }

    /// The exact minor-unit value, used for all balance arithmetic.
    pub fn minor_units(&self) -> i64 {
        self.minor
    }

    /// The major-unit decimal as originally requested.
    pub fn major_units(&self) -> Decimal {
        self.major
    }
}

impl fmt::Display for TransferAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.major)
    }
}
