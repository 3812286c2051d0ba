//! Virtual timestamp type.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{NS_PER_MS, NS_PER_SEC, NS_PER_US};

/// Nanosecond timestamp on the simulation's virtual clock.
///
/// Monotonic within a run. The engine and driver never read the wall
/// clock; every `Ts` is derived from the tick loop or the input order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ts(i64);

impl Ts {
    /// Start of the virtual clock
    pub const ZERO: Self = Self(0);

    /// Create a timestamp from nanoseconds
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from milliseconds
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * NS_PER_MS)
    }

    /// Create a timestamp from seconds
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * NS_PER_SEC)
    }

    /// Get nanoseconds
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Get microseconds
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> i64 {
        self.0 / NS_PER_US
    }

    /// Get whole seconds
    #[inline]
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0 / NS_PER_SEC
    }

    /// Add nanoseconds to this timestamp
    #[inline]
    #[must_use]
    pub const fn add_nanos(self, nanos: i64) -> Self {
        Self(self.0 + nanos)
    }

    /// Nanoseconds elapsed since an earlier timestamp
    #[inline]
    #[must_use]
    pub const fn since(self, earlier: Self) -> i64 {
        self.0 - earlier.0
    }
}

impl PartialOrd for Ts {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ts {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ts({}ns)", self.0)
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_conversions() {
        let ts = Ts::from_secs(1);
        assert_eq!(ts.as_nanos(), 1_000_000_000);
        assert_eq!(ts.as_micros(), 1_000_000);
        assert_eq!(Ts::from_millis(3).as_nanos(), 3_000_000);
    }

    #[test]
    fn test_ts_arithmetic() {
        let t1 = Ts::from_nanos(1000);
        assert_eq!(t1.add_nanos(100).as_nanos(), 1100);
        assert_eq!(t1.since(Ts::from_nanos(400)), 600);
    }

    #[test]
    fn test_ts_ordering() {
        assert!(Ts::from_nanos(1000) > Ts::from_nanos(500));
    }
}
