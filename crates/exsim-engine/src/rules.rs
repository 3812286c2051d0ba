//! Order admission rules, session phase state and reference price.

use exsim_core::constants::{DEFAULT_BAND_BPS, DEFAULT_VOL_AUCTION_NS};
use exsim_core::types::{Order, Price, Qty, Trade};
use serde::{Deserialize, Serialize};

/// Session phase of the market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarketPhase {
    /// Continuous trading: incoming orders match immediately
    #[default]
    Continuous,
    /// Halted: all orders rejected while `enforce_halt` is set
    Halted,
    /// Volatility auction: orders queue for an uncross
    Auction,
    /// Trading-at-last: only executions at the last trade price
    TradingAtLast,
    /// Closing auction: orders queue for the closing uncross
    ClosingAuction,
    /// Closed: the session is over, all orders rejected
    Closed,
}

/// Structured admission failure reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RejectReason {
    /// Not a rejection
    #[default]
    None,
    /// Failed structural validation (zero id, non-positive qty, bad price)
    InvalidOrder,
    /// Market is halted or closed
    MarketHalted,
    /// Limit price not on the tick grid
    PriceNotOnTick,
    /// Quantity not a multiple of the lot size
    QtyNotOnLot,
    /// Quantity below the configured minimum
    QtyBelowMinimum,
    /// Self-trade prevention cancelled the taker
    SelfTradePrevented,
    /// During trading-at-last, limit price differs from the last trade
    PriceNotAtLast,
    /// Trading-at-last requires a last trade price and none exists
    NoReferencePrice,
}

/// Self-trade prevention policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StpMode {
    /// Allow owners to trade with themselves
    #[default]
    None,
    /// Discard the incoming order's unfilled remainder
    CancelTaker,
    /// Cancel the resting order and keep matching
    CancelMaker,
}

/// Admission decision returned by [`RuleSet::pre_accept`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDecision {
    /// Whether the order may proceed
    pub accept: bool,
    /// Failure reason when `accept` is false
    pub reason: RejectReason,
}

impl RuleDecision {
    const ACCEPT: Self = Self {
        accept: true,
        reason: RejectReason::None,
    };

    const fn reject(reason: RejectReason) -> Self {
        Self {
            accept: false,
            reason,
        }
    }
}

/// Static rule configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Reject orders while the market is halted
    pub enforce_halt: bool,
    /// Tick grid for limit prices (prices are integers in ticks)
    pub tick_size_ticks: Price,
    /// Quantity lot grid
    pub lot_size: Qty,
    /// Minimum order quantity
    pub min_qty: Qty,
    /// Self-trade prevention policy
    pub stp: StpMode,
    /// Check execution prices against the reference band
    pub enable_price_bands: bool,
    /// A band breach interrupts trading with a volatility auction
    pub enable_volatility_interruption: bool,
    /// Band half-width in basis points of the reference price
    pub band_bps: i64,
    /// Volatility auction duration in nanoseconds
    pub vol_auction_duration_ns: i64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            enforce_halt: true,
            tick_size_ticks: Price::from_ticks(1),
            lot_size: Qty::new(1),
            min_qty: Qty::new(1),
            stp: StpMode::None,
            enable_price_bands: false,
            enable_volatility_interruption: false,
            band_bps: DEFAULT_BAND_BPS,
            vol_auction_duration_ns: DEFAULT_VOL_AUCTION_NS,
        }
    }
}

/// Admission filter plus the mutable rule state the engine consults:
/// current phase and last trade price.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    cfg: RulesConfig,
    phase: MarketPhase,
    last_trade_price: Option<Price>,
}

impl RuleSet {
    /// Create a rule set from a configuration
    #[must_use]
    pub fn new(cfg: RulesConfig) -> Self {
        Self {
            cfg,
            phase: MarketPhase::Continuous,
            last_trade_price: None,
        }
    }

    /// Admission pipeline: validity, halt, minimum qty, lot, tick.
    #[must_use]
    pub fn pre_accept(&self, incoming: &Order) -> RuleDecision {
        if !incoming.is_valid() {
            return RuleDecision::reject(RejectReason::InvalidOrder);
        }

        if self.cfg.enforce_halt && self.phase == MarketPhase::Halted {
            return RuleDecision::reject(RejectReason::MarketHalted);
        }

        if incoming.qty < self.cfg.min_qty {
            return RuleDecision::reject(RejectReason::QtyBelowMinimum);
        }
        if !incoming.qty.is_on_lot(self.cfg.lot_size) {
            return RuleDecision::reject(RejectReason::QtyNotOnLot);
        }

        if incoming.is_limit() && !incoming.price.is_on_grid(self.cfg.tick_size_ticks) {
            return RuleDecision::reject(RejectReason::PriceNotOnTick);
        }

        RuleDecision::ACCEPT
    }

    /// Record executed trades; the final trade's price becomes the
    /// reference price. Idempotent for an empty slice.
    pub fn on_trades(&mut self, trades: &[Trade]) {
        if let Some(last) = trades.last() {
            self.last_trade_price = Some(last.price);
        }
    }

    /// Current session phase
    #[must_use]
    pub fn phase(&self) -> MarketPhase {
        self.phase
    }

    /// Set the session phase
    pub fn set_phase(&mut self, phase: MarketPhase) {
        self.phase = phase;
    }

    /// Price of the most recent trade, if any
    #[must_use]
    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    /// Rule configuration
    #[must_use]
    pub fn config(&self) -> &RulesConfig {
        &self.cfg
    }

    /// Mutable rule configuration
    pub fn config_mut(&mut self) -> &mut RulesConfig {
        &mut self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exsim_core::types::{OrderId, OwnerId, Side, TradeId, Ts};

    fn limit(price: i64, qty: i64) -> Order {
        Order::limit(
            OrderId::new(1),
            Ts::from_nanos(10),
            Side::Buy,
            Price::from_ticks(price),
            Qty::new(qty),
            OwnerId::new(1),
        )
    }

    #[test]
    fn test_accepts_valid_order() {
        let rules = RuleSet::default();
        let d = rules.pre_accept(&limit(100, 5));
        assert!(d.accept);
        assert_eq!(d.reason, RejectReason::None);
    }

    #[test]
    fn test_rejects_invalid_order() {
        let rules = RuleSet::default();
        assert_eq!(
            rules.pre_accept(&limit(100, 0)).reason,
            RejectReason::InvalidOrder
        );
        assert_eq!(
            rules.pre_accept(&limit(0, 5)).reason,
            RejectReason::InvalidOrder
        );
    }

    #[test]
    fn test_rejects_when_halted() {
        let mut rules = RuleSet::default();
        rules.set_phase(MarketPhase::Halted);
        assert_eq!(
            rules.pre_accept(&limit(100, 5)).reason,
            RejectReason::MarketHalted
        );

        // Halt enforcement can be switched off
        rules.config_mut().enforce_halt = false;
        assert!(rules.pre_accept(&limit(100, 5)).accept);
    }

    #[test]
    fn test_tick_lot_min_rules() {
        let mut rules = RuleSet::new(RulesConfig {
            tick_size_ticks: Price::from_ticks(5),
            lot_size: Qty::new(10),
            min_qty: Qty::new(20),
            ..RulesConfig::default()
        });

        assert_eq!(
            rules.pre_accept(&limit(100, 10)).reason,
            RejectReason::QtyBelowMinimum
        );
        assert_eq!(
            rules.pre_accept(&limit(100, 25)).reason,
            RejectReason::QtyNotOnLot
        );
        assert_eq!(
            rules.pre_accept(&limit(102, 20)).reason,
            RejectReason::PriceNotOnTick
        );
        assert!(rules.pre_accept(&limit(100, 20)).accept);

        // Market orders skip the tick rule
        let market = Order::market(
            OrderId::new(2),
            Ts::from_nanos(10),
            Side::Sell,
            Qty::new(20),
            OwnerId::new(1),
        );
        assert!(rules.pre_accept(&market).accept);
    }

    #[test]
    fn test_last_trade_tracking() {
        let mut rules = RuleSet::default();
        assert!(rules.last_trade_price().is_none());

        let trade = |id: u64, price: i64| Trade {
            id: TradeId::new(id),
            ts: Ts::from_nanos(10),
            price: Price::from_ticks(price),
            qty: Qty::new(1),
            maker_order_id: OrderId::new(1),
            taker_order_id: OrderId::new(2),
        };

        rules.on_trades(&[trade(1, 100), trade(2, 105)]);
        assert_eq!(rules.last_trade_price(), Some(Price::from_ticks(105)));

        // Empty slice leaves the reference untouched
        rules.on_trades(&[]);
        assert_eq!(rules.last_trade_price(), Some(Price::from_ticks(105)));
    }
}
