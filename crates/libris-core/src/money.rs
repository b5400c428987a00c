//! # Money Module
//!
//! Provides the `Money` type used for fines.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 + 0.2 = 0.30000000000000004  ❌                                    │
//! │                                                                         │
//! │  A fine ledger summed from floats drifts by fractions of a cent.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Operator types "2.50" ──► Money(250) ──► fines.amount_cents = 250    │
//! │    Reports format 250 back to "2.50"                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use libris_core::money::Money;
//!
//! let fine: Money = "2.50".parse().unwrap();
//! assert_eq!(fine.cents(), 250);
//! assert_eq!(fine.to_string(), "$2.50");
//! assert_eq!(fine.to_decimal_string(), "2.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// - **i64 (signed)**: arithmetic never has to special-case a refund
/// - **Single field tuple struct**: zero-cost over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// let fine = Money::from_cents(250); // $2.50
    /// assert_eq!(fine.cents(), 250);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by `factor`, clamping at the representable range instead
    /// of overflowing.
    ///
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(50).saturating_mul(4), Money::from_cents(200));
    /// assert_eq!(Money::from_cents(i64::MAX).saturating_mul(3).cents(), i64::MAX);
    /// ```
    #[inline]
    pub const fn saturating_mul(self, factor: i64) -> Self {
        Money(self.0.saturating_mul(factor))
    }

    /// Plain decimal rendering without a currency symbol, as stored in
    /// exported reports.
    ///
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1205).to_decimal_string(), "12.05");
    /// assert_eq!(Money::from_cents(-50).to_decimal_string(), "-0.50");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses operator input such as `"2.50"`, `"2.5"`, `"3"` or `"$1.25"`.
///
/// More than two decimal places is rejected rather than rounded.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let mut text = s.trim();
        let negative = text.starts_with('-');
        if negative {
            text = &text[1..];
        }
        let text = text.strip_prefix('$').unwrap_or(text);

        let (major_text, minor_text) = match text.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (text, ""),
        };

        if major_text.is_empty() && minor_text.is_empty() {
            return Err(invalid("expected a number like 2.50"));
        }
        if !major_text.chars().all(|c| c.is_ascii_digit())
            || !minor_text.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected a number like 2.50"));
        }
        if minor_text.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let major: i64 = if major_text.is_empty() {
            0
        } else {
            major_text
                .parse()
                .map_err(|_| invalid("amount is too large"))?
        };
        let minor: i64 = match minor_text.len() {
            0 => 0,
            1 => minor_text.parse::<i64>().map_err(|_| invalid("bad cents"))? * 10,
            _ => minor_text.parse::<i64>().map_err(|_| invalid("bad cents"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `$12.34`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a day count (daily fine rates). Saturates.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, days: i64) -> Self {
        self.saturating_mul(days)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
