//! Fixed-point money amounts.
//!
//! Kiosk trades in a single currency with two-decimal pricing. Amounts are
//! held as integer minor units (cents) so sums and comparisons are exact;
//! decimal text only appears at the edges (JSON bodies, `NUMERIC` columns).
//!
//! Rounding to two decimals is half-up: a midpoint rounds away from zero.
//!
//! ```rust
//! use kiosk_core::Money;
//!
//! let price: Money = "10.99".parse().unwrap();
//! assert_eq!(price.checked_mul(2).unwrap().to_string(), "21.98");
//! assert_eq!("20".parse::<Money>().unwrap().to_string(), "20.00");
//! assert_eq!("0.125".parse::<Money>().unwrap().to_string(), "0.13");
//! ```

use core::fmt;
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places carried by every amount.
pub const SCALE: u32 = 2;

/// Errors that can occur when building a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("not a decimal amount: {0:?}")]
    NotNumeric(String),
    /// The amount does not fit into the minor-unit representation.
    #[error("amount out of range")]
    OutOfRange,
}

/// A monetary amount in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self { cents: 0 };

    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// The amount in minor units.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.cents
    }

    /// Round a decimal half-up to two places and convert it to minor units.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::OutOfRange` if the amount does not fit into `i64` cents.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        let rounded = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        let cents = rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.to_i64())
            .ok_or(MoneyError::OutOfRange)?;
        Ok(Self { cents })
    }

    /// The amount as a two-place decimal.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.cents, SCALE)
    }

    /// Multiply by a quantity, returning `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Self::from_cents)
    }

    /// Add two amounts, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.cents.checked_add(other.cents).map(Self::from_cents)
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.cents < 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| MoneyError::NotNumeric(s.to_owned()))?;
        Self::from_decimal(amount)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.to_decimal()
    }
}

/// Serialized as a decimal string (`"21.98"`) so clients never see float noise.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts JSON numbers and numeric strings.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as number or string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money::from_cents)
            .ok_or_else(|| E::custom(MoneyError::OutOfRange))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(MoneyError::OutOfRange))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        // Display for f64 is the shortest text that round-trips, so 21.98 stays "21.98".
        self.visit_str(&v.to_string())
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for Money {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for Money {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, ::sqlx::error::BoxDynError> {
        let amount = <Decimal as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self::from_decimal(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <Decimal as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.to_decimal(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_always_has_two_places() {
        assert_eq!(Money::from_cents(2198).to_string(), "21.98");
        assert_eq!(Money::from_cents(2000).to_string(), "20.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_parse_rounds_half_up() {
        assert_eq!("0.125".parse::<Money>().unwrap().cents(), 13);
        assert_eq!("0.124".parse::<Money>().unwrap().cents(), 12);
        assert_eq!("10.995".parse::<Money>().unwrap().cents(), 1100);
        assert_eq!("-0.125".parse::<Money>().unwrap().cents(), -13);
    }

    #[test]
    fn test_parse_accepts_whitespace_and_integers() {
        assert_eq!(" 21.98 ".parse::<Money>().unwrap().cents(), 2198);
        assert_eq!("20".parse::<Money>().unwrap().cents(), 2000);
        assert_eq!("1.5e1".parse::<Money>().unwrap().cents(), 1500);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(
            "abc".parse::<Money>(),
            Err(MoneyError::NotNumeric(_))
        ));
        assert!("".parse::<Money>().is_err());
        assert!("12,50".parse::<Money>().is_err());
    }

    #[test]
    fn test_decimal_conversion() {
        let amount = Money::try_from(Decimal::new(1099, 2)).unwrap();
        assert_eq!(amount.cents(), 1099);
        assert_eq!(amount.to_decimal(), Decimal::new(1099, 2));
        assert_eq!(Decimal::from(amount).to_string(), "10.99");
    }

    #[test]
    fn test_checked_arithmetic() {
        let price = Money::from_cents(1099);
        assert_eq!(price.checked_mul(2), Some(Money::from_cents(2198)));
        assert_eq!(
            price.checked_add(Money::from_cents(1)),
            Some(Money::from_cents(1100))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(price), None);
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_float: Money = serde_json::from_str("21.98").unwrap();
        let from_int: Money = serde_json::from_str("20").unwrap();
        let from_text: Money = serde_json::from_str("\"20.00\"").unwrap();

        assert_eq!(from_float.cents(), 2198);
        assert_eq!(from_int.cents(), 2000);
        assert_eq!(from_text.cents(), 2000);
    }

    #[test]
    fn test_deserialize_rejects_other_json() {
        assert!(serde_json::from_str::<Money>("true").is_err());
        assert!(serde_json::from_str::<Money>("\"zehn\"").is_err());
        assert!(serde_json::from_str::<Money>("null").is_err());
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(1099)).unwrap();
        assert_eq!(json, "\"10.99\"");
    }
}
