//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  The original frontend computed totals in JavaScript numbers:       │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Centavos                                     │
//! │    R$ 12.50 is stored as 1250. All arithmetic is exact; rounding    │
//! │    happens once, at the wire boundary, half-up at two decimals.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! The REST API (and the stored documents it mirrors) uses plain decimal
//! numbers (`12.5`), so `Money` carries a custom `Serialize`/`Deserialize`
//! pair instead of exposing raw centavos. The conversion is lossless for
//! any realistic currency amount and rounds half-up on input.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (the smallest currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: change calculations may transiently go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Custom serde**: transmitted as a decimal number (`12.5`), never
///   as raw centavos, for compatibility with the existing frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ```rust
    /// use boteco_core::money::Money;
    ///
    /// let price = Money::from_centavos(1250); // R$ 12.50
    /// assert_eq!(price.centavos(), 1250);
    /// ```
    #[inline]
    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    /// Creates a Money value from a decimal amount in reais, rounding
    /// half-up at two decimal places.
    ///
    /// This is the only float entry point and exists for the wire
    /// boundary; internal code should stay in centavos.
    pub fn from_reais(reais: f64) -> Self {
        // f64::round rounds half away from zero, which is half-up for
        // the non-negative currency values the API carries.
        Money((reais * 100.0).round() as i64)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal amount in reais.
    #[inline]
    pub fn reais(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the whole-reais portion.
    #[inline]
    pub const fn whole(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use boteco_core::money::Money;
    ///
    /// let unit_price = Money::from_centavos(299); // R$ 2.99
    /// assert_eq!(unit_price.multiply_quantity(3).centavos(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - discount in basis points (1000 = 10%)
    ///
    /// ## Rounding
    /// The discount amount is rounded half-up before subtraction, so the
    /// result is always an exact centavo value.
    ///
    /// ```rust
    /// use boteco_core::money::Money;
    ///
    /// let subtotal = Money::from_centavos(10000); // R$ 100.00
    /// assert_eq!(subtotal.apply_percentage_discount(1000).centavos(), 9000);
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        // i128 to prevent overflow on large amounts; +5000 rounds half-up
        let discount_amount = (self.0 as i128 * discount_bps as i128 + 5000) / 10000;
        Money::from_centavos(self.0 - discount_amount as i64)
    }
}

// =============================================================================
// Wire Format (serde)
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.reais())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let reais = f64::deserialize(deserializer)?;
        Ok(Money::from_reais(reais))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. The frontend does its own `toFixed(2)`
/// formatting; this mirrors it for logs and receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R$ {}.{:02}", sign, self.whole().abs(), self.cents_part())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_centavos() {
        let money = Money::from_centavos(1250);
        assert_eq!(money.centavos(), 1250);
        assert_eq!(money.whole(), 12);
        assert_eq!(money.cents_part(), 50);
    }

    #[test]
    fn test_from_reais_rounds_half_up() {
        assert_eq!(Money::from_reais(12.5).centavos(), 1250);
        assert_eq!(Money::from_reais(12.505).centavos(), 1251);
        assert_eq!(Money::from_reais(0.0).centavos(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_centavos(1250)), "R$ 12.50");
        assert_eq!(format!("{}", Money::from_centavos(500)), "R$ 5.00");
        assert_eq!(format!("{}", Money::from_centavos(-550)), "-R$ 5.50");
        assert_eq!(format!("{}", Money::from_centavos(0)), "R$ 0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_centavos(1000);
        let b = Money::from_centavos(500);

        assert_eq!((a + b).centavos(), 1500);
        assert_eq!((a - b).centavos(), 500);
        assert_eq!((a * 3).centavos(), 3000);
        assert_eq!([a, b].into_iter().sum::<Money>().centavos(), 1500);
    }

    #[test]
    fn test_percentage_discount() {
        let subtotal = Money::from_centavos(10000); // R$ 100.00
        assert_eq!(subtotal.apply_percentage_discount(1000).centavos(), 9000);

        // R$ 10.05 at 50%: discount 502.5 -> rounds half-up to 503
        let odd = Money::from_centavos(1005);
        assert_eq!(odd.apply_percentage_discount(5000).centavos(), 502);

        // 0% is the identity
        assert_eq!(subtotal.apply_percentage_discount(0), subtotal);
    }

    #[test]
    fn test_wire_round_trip() {
        for centavos in [0i64, 1, 99, 100, 1250, 999_999_99] {
            let money = Money::from_centavos(centavos);
            let json = serde_json::to_string(&money).unwrap();
            let back: Money = serde_json::from_str(&json).unwrap();
            assert_eq!(back, money, "round trip failed for {centavos}");
        }
    }

    #[test]
    fn test_wire_format_is_decimal() {
        let json = serde_json::to_string(&Money::from_centavos(1250)).unwrap();
        assert_eq!(json, "12.5");
    }

    #[test]
    fn test_wire_accepts_integers() {
        let money: Money = serde_json::from_str("20").unwrap();
        assert_eq!(money.centavos(), 2000);
    }
}
