//! Price type in integer tick units.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Price in integer tick units.
///
/// Uses i64 internally; dollars are not modeled. All matching-path
/// arithmetic stays in integers, which keeps the engine deterministic.
///
/// # Example
///
/// ```rust
/// use exsim_core::types::Price;
///
/// let px = Price::from_ticks(10_100);
/// assert_eq!(px.raw(), 10_100);
/// assert!(px.is_on_grid(Price::from_ticks(100)));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Price(i64);

impl Price {
    /// Zero price constant
    pub const ZERO: Self = Self(0);

    /// Maximum price constant
    pub const MAX: Self = Self(i64::MAX);

    /// Create a price from a raw tick count
    #[inline]
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Get the raw tick count
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Check if the price is zero
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Check if the price is strictly positive
    #[inline]
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether this price lies on the given tick grid
    #[inline]
    #[must_use]
    pub const fn is_on_grid(self, tick: Self) -> bool {
        tick.0 > 0 && self.0 % tick.0 == 0
    }

    /// Absolute distance to another price, in ticks
    #[inline]
    #[must_use]
    pub const fn distance(self, other: Self) -> i64 {
        (self.0 - other.0).abs()
    }

    /// Saturating addition
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl PartialOrd for Price {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Add for Price {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Price {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl Mul<i64> for Price {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: i64) -> Self {
        Self(self.0 * scalar)
    }
}

impl Div<i64> for Price {
    type Output = Self;

    #[inline]
    fn div(self, scalar: i64) -> Self {
        Self(self.0 / scalar)
    }
}

impl fmt::Debug for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Price({})", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_arithmetic() {
        let p1 = Price::from_ticks(100);
        let p2 = Price::from_ticks(50);

        assert_eq!((p1 + p2).raw(), 150);
        assert_eq!((p1 - p2).raw(), 50);
        assert_eq!((p1 * 2).raw(), 200);
        assert_eq!((p1 / 2).raw(), 50);
    }

    #[test]
    fn test_price_comparison() {
        assert!(Price::from_ticks(100) > Price::from_ticks(50));
        assert_eq!(Price::from_ticks(100), Price::from_ticks(100));
    }

    #[test]
    fn test_price_grid() {
        let tick = Price::from_ticks(25);
        assert!(Price::from_ticks(10_025).is_on_grid(tick));
        assert!(!Price::from_ticks(10_030).is_on_grid(tick));
        assert!(!Price::from_ticks(10_025).is_on_grid(Price::ZERO));
    }

    #[test]
    fn test_price_distance() {
        assert_eq!(Price::from_ticks(100).distance(Price::from_ticks(130)), 30);
        assert_eq!(Price::from_ticks(130).distance(Price::from_ticks(100)), 30);
    }
}
