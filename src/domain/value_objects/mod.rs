//! Value Objects for the shopping domain

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;
use uuid::Uuid;

/// Catalog product identifier.
///
/// Serialized as a bare JSON integer so blobs written by earlier app versions
/// (`{"id": 1, ...}` or millisecond timestamps) load unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    pub const fn new(id: i64) -> Self { Self(id) }
    pub const fn as_i64(&self) -> i64 { self.0 }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self { Self(id) }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Purchase history entry identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(String);

impl PurchaseId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

    /// Time-ordered id for a purchase being finalized now.
    pub fn generate() -> Self { Self(Uuid::now_v7().to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for PurchaseId {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Parses a user-typed decimal, accepting `,` as the decimal separator.
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() { return None; }
    Decimal::from_str(&normalized).ok()
}

/// Money value object.
///
/// Single-currency (BRL) amount backed by a decimal so totals never pick up
/// binary floating point drift. JSON encodes it as a plain number; decoding
/// rounds to cents, which absorbs the float noise of that encoding.
///
/// Arithmetic saturates at the decimal range instead of panicking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Largest amount accepted from user input (R$ 1 bilhão). Cent amounts up
    /// to this bound survive the JSON number encoding exactly.
    pub const MAX_INPUT: Money = Money(Decimal::from_parts(1_000_000_000, 0, 0, false, 0));

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn from_cents(cents: i64) -> Self { Self(Decimal::new(cents, 2)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_negative(&self) -> bool { self.0.is_sign_negative() && !self.0.is_zero() }

    /// Parses user input such as `"12.50"`, `" 3 "` or `"12,50"`.
    ///
    /// At most two decimal places and at most [`Money::MAX_INPUT`] in either
    /// direction; anything else is rejected rather than rounded.
    pub fn parse(input: &str) -> Option<Self> {
        parse_decimal(input)
            .map(|d| d.normalize())
            .filter(|d| d.scale() <= 2 && d.abs() <= Self::MAX_INPUT.0)
            .map(Self)
    }

    pub fn multiply(&self, qty: u32) -> Money {
        self.0
            .checked_mul(Decimal::from(qty))
            .map_or_else(|| Money::saturated(self.is_negative()), Money)
    }

    /// `percent`% of this amount, e.g. `percent_of(10)` on 25.00 is 2.50.
    pub fn percent_of(&self, percent: Decimal) -> Money {
        self.0
            .checked_mul(percent)
            .and_then(|d| d.checked_div(Decimal::ONE_HUNDRED))
            .map_or_else(|| Money::saturated(self.is_negative() != percent.is_sign_negative()), Money)
    }

    /// Subtraction floored at zero.
    pub fn saturating_sub(&self, other: Money) -> Money {
        if other.0 >= self.0 { Money::ZERO } else { *self - other }
    }

    fn saturated(negative: bool) -> Money {
        Money(if negative { Decimal::MIN } else { Decimal::MAX })
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(|d| Money(d.round_dp(2)))
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        self.0.checked_add(rhs.0).map_or_else(|| Money::saturated(self.is_negative()), Money)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        self.0.checked_sub(rhs.0).map_or_else(|| Money::saturated(self.is_negative()), Money)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self { Self(amount) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "R$ {:.2}", self.0.round_dp(2)) }
}
