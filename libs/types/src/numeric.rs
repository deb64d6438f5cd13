//! Fixed-point integer types for prices and quantities
//!
//! Prices are signed 64-bit integers quoted in multiples of [`PRICE_SCALE`]
//! (1e8 units = 1.0). Quantities are plain signed 64-bit integers. All hot
//! path arithmetic is exact; the only widening is the `i128` notional
//! computation used by the risk gate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Fixed-point scale: 1e8 units = 1.0
pub const PRICE_SCALE: i64 = 100_000_000;

/// Price in fixed-point units
///
/// Zero is the conventional price of a market order; the risk gate requires
/// limit prices to be positive. Serialized as a plain JSON integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub fn new(units: i64) -> Self {
        Self(units)
    }

    /// Build a price from whole units (multiplies by [`PRICE_SCALE`])
    pub fn from_major(major: i64) -> Self {
        Self(major * PRICE_SCALE)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Notional value of `quantity` at this price, in fixed-point units.
    ///
    /// Widened to `i128` so `price * quantity` cannot overflow before the
    /// divide by [`PRICE_SCALE`].
    pub fn notional(&self, quantity: Quantity) -> i128 {
        (self.0 as i128) * (quantity.as_i64() as i128) / (PRICE_SCALE as i128)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order or trade quantity
///
/// Not scaled. Serialized as a plain JSON integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn new(qty: i64) -> Self {
        Self(qty)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Clamp to zero from below; replay applies trade quantities this way.
    pub fn saturating_to_zero(self) -> Self {
        Self(self.0.max(0))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
