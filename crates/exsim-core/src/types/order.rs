//! Order types and related structures.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Price, Qty, Side, Ts};

/// Unique order identifier
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct OrderId(u64);

impl OrderId {
    /// Create a new order ID
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
}

impl fmt::Debug for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderId({})", self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Owner (participant) identifier, used for trade attribution and STP
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Create a new owner ID
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
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order type
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    /// Limit order: price and quantity
    #[default]
    Limit = 0,
    /// Market order: execute at best available price
    Market = 1,
}

/// Time in force for orders
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum TimeInForce {
    /// Good till cancelled: unfilled remainder rests in the book
    #[default]
    Gtc = 0,
    /// Immediate or cancel: partial fills allowed, remainder cancelled
    Ioc = 1,
    /// Fill or kill: fills completely or produces zero trades
    Fok = 2,
}

/// How a market order's unfilled remainder is handled
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum MarketStyle {
    /// Remainder is cancelled
    #[default]
    PureMarket = 0,
    /// Remainder rests as a limit at the last fill price
    MarketToLimit = 1,
}

/// An inbound or resting order.
///
/// Priority at a price level is FIFO by insertion time; `id` is globally
/// unique. Limit orders require a positive price; market orders carry
/// `price = 0`, which the engine ignores.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier
    pub id: OrderId,
    /// Submission timestamp
    pub ts: Ts,
    /// Order side
    pub side: Side,
    /// Limit or market
    pub order_type: OrderType,
    /// Limit price in ticks (0 for market orders)
    pub price: Price,
    /// Remaining quantity
    pub qty: Qty,
    /// Owning participant
    pub owner: OwnerId,
    /// Time in force
    pub tif: TimeInForce,
    /// Market remainder handling
    pub market_style: MarketStyle,
}

impl Order {
    /// Create a GTC limit order
    #[must_use]
    pub const fn limit(id: OrderId, ts: Ts, side: Side, price: Price, qty: Qty, owner: OwnerId) -> Self {
        Self {
            id,
            ts,
            side,
            order_type: OrderType::Limit,
            price,
            qty,
            owner,
            tif: TimeInForce::Gtc,
            market_style: MarketStyle::PureMarket,
        }
    }

    /// Create a pure market order (behaves as immediate)
    #[must_use]
    pub const fn market(id: OrderId, ts: Ts, side: Side, qty: Qty, owner: OwnerId) -> Self {
        Self {
            id,
            ts,
            side,
            order_type: OrderType::Market,
            price: Price::ZERO,
            qty,
            owner,
            tif: TimeInForce::Ioc,
            market_style: MarketStyle::PureMarket,
        }
    }

    /// Same order with a different time in force
    #[must_use]
    pub const fn with_tif(mut self, tif: TimeInForce) -> Self {
        self.tif = tif;
        self
    }

    /// Same order with a different market remainder style
    #[must_use]
    pub const fn with_market_style(mut self, style: MarketStyle) -> Self {
        self.market_style = style;
        self
    }

    /// Check if this is a limit order
    #[inline]
    #[must_use]
    pub const fn is_limit(&self) -> bool {
        matches!(self.order_type, OrderType::Limit)
    }

    /// Structural validity: nonzero id, positive qty, limit implies positive price
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        if self.id.value() == 0 {
            return false;
        }
        if !self.qty.is_positive() {
            return false;
        }
        if self.is_limit() && !self.price.is_positive() {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_order_validity() {
        let o = Order::limit(
            OrderId::new(1),
            Ts::from_nanos(100),
            Side::Buy,
            Price::from_ticks(10_100),
            Qty::new(10),
            OwnerId::new(1),
        );
        assert!(o.is_valid());

        let zero_qty = Order { qty: Qty::ZERO, ..o };
        assert!(!zero_qty.is_valid());

        let zero_price = Order { price: Price::ZERO, ..o };
        assert!(!zero_price.is_valid());

        let zero_id = Order { id: OrderId::new(0), ..o };
        assert!(!zero_id.is_valid());
    }

    #[test]
    fn test_market_order_price_ignored() {
        let o = Order::market(
            OrderId::new(2),
            Ts::from_nanos(100),
            Side::Sell,
            Qty::new(5),
            OwnerId::new(1),
        );
        // Market orders may carry price = 0
        assert!(o.is_valid());
        assert_eq!(o.tif, TimeInForce::Ioc);
    }

    #[test]
    fn test_builder_helpers() {
        let o = Order::market(
            OrderId::new(3),
            Ts::ZERO,
            Side::Buy,
            Qty::new(10),
            OwnerId::new(9),
        )
        .with_tif(TimeInForce::Gtc)
        .with_market_style(MarketStyle::MarketToLimit);

        assert_eq!(o.tif, TimeInForce::Gtc);
        assert_eq!(o.market_style, MarketStyle::MarketToLimit);
    }
}
