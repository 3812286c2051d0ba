//! Core domain types for the matching engine and simulator.

mod order;
mod price;
mod qty;
mod side;
mod ts;

pub use order::{MarketStyle, Order, OrderId, OrderType, OwnerId, TimeInForce};
pub use price::Price;
pub use qty::Qty;
pub use side::Side;
pub use ts::Ts;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique trade identifier, engine-monotonic within a run
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TradeId(u64);

impl TradeId {
    /// Create a new trade ID
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The next trade ID in sequence
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TradeId({})", self.0)
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An execution between a resting (maker) and an incoming (taker) order.
///
/// The trade price is always the maker's price: price-time priority pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade identifier, monotonic within an engine
    pub id: TradeId,
    /// Execution timestamp
    pub ts: Ts,
    /// Execution price (the maker's price)
    pub price: Price,
    /// Executed quantity
    pub qty: Qty,
    /// Resting order that provided liquidity
    pub maker_order_id: OrderId,
    /// Incoming order that took liquidity
    pub taker_order_id: OrderId,
}

impl Trade {
    /// Check structural validity: positive id, price and quantity
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.id.value() != 0 && self.price.raw() > 0 && self.qty.raw() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_validity() {
        let mut t = Trade {
            id: TradeId::new(1),
            ts: Ts::from_nanos(200),
            price: Price::from_ticks(10_100),
            qty: Qty::new(5),
            maker_order_id: OrderId::new(1),
            taker_order_id: OrderId::new(2),
        };
        assert!(t.is_valid());

        t.qty = Qty::new(-1);
        assert!(!t.is_valid());
    }

    #[test]
    fn test_trade_id_sequence() {
        let id = TradeId::new(1);
        assert_eq!(id.next().value(), 2);
        assert!(id < id.next());
    }
}
