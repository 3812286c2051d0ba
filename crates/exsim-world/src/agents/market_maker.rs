//! Two-sided quoting agent with inventory skew.

use exsim_core::types::{Order, OrderId, OwnerId, Price, Qty, Side, Ts};
use exsim_engine::RulesConfig;
use serde::{Deserialize, Serialize};

use super::{scoped_order_id, Action, Agent, AgentState, MarketView};

/// Market maker quoting parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketMakerParams {
    /// Quantity quoted on each side
    pub quote_qty: Qty,
    /// Total spread in ticks
    pub spread_ticks: i64,
    /// Quote refresh interval in virtual nanoseconds
    pub refresh_ns: i64,
    /// Clamp on the inventory skew, in ticks
    pub max_skew_ticks: i64,
    /// Skew in ticks per unit of inventory
    pub skew_per_unit: i64,
    /// Reference price used while the book has no mid
    pub default_mid: Price,
}

impl Default for MarketMakerParams {
    fn default() -> Self {
        Self {
            quote_qty: Qty::new(10),
            spread_ticks: 4,
            refresh_ns: 50_000_000, // 50ms
            max_skew_ticks: 20,
            skew_per_unit: 1,
            default_mid: Price::from_ticks(10_000),
        }
    }
}

/// Quotes both sides of the book around the mid, skewing quotes against
/// its inventory. Previous quotes are cancelled before requoting.
pub struct MarketMaker {
    owner: OwnerId,
    params: MarketMakerParams,
    rules: RulesConfig,
    seed: u64,
    next_refresh_ts: Ts,
    bid_id: Option<OrderId>,
    ask_id: Option<OrderId>,
    seq: u64,
}

impl MarketMaker {
    /// Create a market maker for `owner`
    #[must_use]
    pub fn new(owner: OwnerId, params: MarketMakerParams, rules: RulesConfig) -> Self {
        Self {
            owner,
            params,
            rules,
            seed: 0,
            next_refresh_ts: Ts::ZERO,
            bid_id: None,
            ask_id: None,
            seq: 0,
        }
    }

    fn snap_to_tick(&self, price: Price) -> Price {
        let tick = self.rules.tick_size_ticks.raw().max(1);
        Price::from_ticks((price.raw() / tick) * tick)
    }

    fn snap_to_lot(&self, qty: Qty) -> Qty {
        let lot = self.rules.lot_size.raw().max(1);
        let q = ((qty.raw().max(self.rules.min_qty.raw())) / lot) * lot;
        Qty::new(q.max(lot))
    }

    /// Bid/ask prices for the current reference and inventory.
    fn quote_prices(&self, reference: Price, position: i64) -> (Price, Price) {
        let half = self.params.spread_ticks / 2;
        let skew = (position * self.params.skew_per_unit)
            .clamp(-self.params.max_skew_ticks, self.params.max_skew_ticks);

        // Long inventory pushes both quotes down to shed it, short pulls up
        let bid = self.snap_to_tick(Price::from_ticks(reference.raw() - half - skew));
        let ask = self.snap_to_tick(Price::from_ticks(reference.raw() + half - skew));
        (bid, ask)
    }
}

impl Agent for MarketMaker {
    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn seed(&mut self, seed: u64) {
        self.seed = seed;
        self.next_refresh_ts = Ts::ZERO;
        self.bid_id = None;
        self.ask_id = None;
        self.seq = 0;
    }

    fn step(&mut self, ts: Ts, view: &MarketView, state: &AgentState, out: &mut Vec<Action>) {
        if ts < self.next_refresh_ts {
            return;
        }
        self.next_refresh_ts = ts.add_nanos(self.params.refresh_ns.max(1));

        let reference = view
            .mid
            .or(view.last_trade)
            .unwrap_or(self.params.default_mid);
        let (bid_px, ask_px) = self.quote_prices(reference, state.position);
        if !bid_px.is_positive() || bid_px >= ask_px {
            return;
        }

        if let Some(id) = self.bid_id.take() {
            out.push(Action::Cancel(id));
        }
        if let Some(id) = self.ask_id.take() {
            out.push(Action::Cancel(id));
        }

        let qty = self.snap_to_lot(self.params.quote_qty);

        self.seq += 1;
        let bid_id = scoped_order_id(self.owner, self.seq);
        self.seq += 1;
        let ask_id = scoped_order_id(self.owner, self.seq);

        out.push(Action::Submit(Order::limit(
            bid_id, view.ts, Side::Buy, bid_px, qty, self.owner,
        )));
        out.push(Action::Submit(Order::limit(
            ask_id, view.ts, Side::Sell, ask_px, qty, self.owner,
        )));

        self.bid_id = Some(bid_id);
        self.ask_id = Some(ask_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(ts: i64, mid: i64) -> MarketView {
        MarketView {
            ts: Ts::from_nanos(ts),
            best_bid: None,
            best_ask: None,
            mid: Some(Price::from_ticks(mid)),
            last_trade: None,
        }
    }

    fn state(position: i64) -> AgentState {
        AgentState {
            owner: OwnerId::new(2),
            cash_ticks: 0,
            position,
        }
    }

    #[test]
    fn test_quotes_straddle_mid() {
        let mut mm = MarketMaker::new(OwnerId::new(2), MarketMakerParams::default(), RulesConfig::default());
        mm.seed(1);

        let mut out = Vec::new();
        mm.step(Ts::ZERO, &view(0, 10_000), &state(0), &mut out);

        let prices: Vec<(Side, i64)> = out
            .iter()
            .filter_map(|a| match a {
                Action::Submit(o) => Some((o.side, o.price.raw())),
                _ => None,
            })
            .collect();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0], (Side::Buy, 9_998));
        assert_eq!(prices[1], (Side::Sell, 10_002));
    }

    #[test]
    fn test_inventory_skews_quotes_down_when_long() {
        let mm = MarketMaker::new(OwnerId::new(2), MarketMakerParams::default(), RulesConfig::default());
        let flat = mm.quote_prices(Price::from_ticks(10_000), 0);
        let long = mm.quote_prices(Price::from_ticks(10_000), 10);
        let short = mm.quote_prices(Price::from_ticks(10_000), -10);

        assert!(long.0 < flat.0 && long.1 < flat.1);
        assert!(short.0 > flat.0 && short.1 > flat.1);

        // The clamp bounds extreme inventories
        let extreme = mm.quote_prices(Price::from_ticks(10_000), 1_000);
        assert_eq!(extreme.0.raw(), 10_000 - 2 - 20);
    }

    #[test]
    fn test_requote_cancels_previous_quotes() {
        let params = MarketMakerParams {
            refresh_ns: 10,
            ..MarketMakerParams::default()
        };
        let mut mm = MarketMaker::new(OwnerId::new(2), params, RulesConfig::default());
        mm.seed(1);

        let mut first = Vec::new();
        mm.step(Ts::ZERO, &view(0, 10_000), &state(0), &mut first);
        assert_eq!(first.len(), 2); // no previous quotes to cancel

        let submitted: Vec<OrderId> = first
            .iter()
            .filter_map(|a| match a {
                Action::Submit(o) => Some(o.id),
                _ => None,
            })
            .collect();

        let mut second = Vec::new();
        mm.step(Ts::from_nanos(20), &view(20, 10_000), &state(0), &mut second);
        let cancelled: Vec<OrderId> = second
            .iter()
            .filter_map(|a| match a {
                Action::Cancel(id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(cancelled, submitted);
    }

    #[test]
    fn test_respects_refresh_interval() {
        let mut mm = MarketMaker::new(OwnerId::new(2), MarketMakerParams::default(), RulesConfig::default());
        mm.seed(1);

        let mut out = Vec::new();
        mm.step(Ts::ZERO, &view(0, 10_000), &state(0), &mut out);
        let n = out.len();

        // Within the refresh window nothing happens
        mm.step(Ts::from_nanos(1), &view(1, 10_000), &state(0), &mut out);
        assert_eq!(out.len(), n);
    }
}
