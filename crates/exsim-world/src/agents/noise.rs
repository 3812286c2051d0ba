//! Noise trader: random liquidity takers and providers.

use exsim_core::types::{MarketStyle, Order, OwnerId, Price, Qty, Side, TimeInForce, Ts};
use exsim_engine::RulesConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

use super::{scoped_order_id, Action, Agent, AgentState, MarketView};

/// Noise trader behaviour parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoiseTraderConfig {
    /// Mean gap between orders in virtual nanoseconds (exponential arrivals)
    pub mean_gap_ns: i64,
    /// Probability that an order is a market order
    pub prob_market: f64,
    /// Maximum limit-price offset from the reference, in ticks
    pub max_offset_ticks: i64,
    /// Smallest order quantity before lot snapping
    pub min_qty: i64,
    /// Largest order quantity before lot snapping
    pub max_qty: i64,
    /// Reference price used while the book has no mid
    pub default_mid: Price,
}

impl Default for NoiseTraderConfig {
    fn default() -> Self {
        Self {
            mean_gap_ns: 5_000_000, // 5ms between orders on average
            prob_market: 0.25,
            max_offset_ticks: 10,
            min_qty: 1,
            max_qty: 10,
            default_mid: Price::from_ticks(10_000),
        }
    }
}

/// A trader that submits randomly-sided, randomly-priced orders with
/// exponentially distributed inter-arrival times.
pub struct NoiseTrader {
    owner: OwnerId,
    cfg: NoiseTraderConfig,
    rules: RulesConfig,
    rng: StdRng,
    next_action_ts: Ts,
    seq: u64,
}

impl NoiseTrader {
    /// Create a noise trader for `owner`, snapping prices and quantities
    /// to the exchange's tick and lot grids.
    #[must_use]
    pub fn new(owner: OwnerId, cfg: NoiseTraderConfig, rules: RulesConfig) -> Self {
        Self {
            owner,
            cfg,
            rules,
            rng: StdRng::seed_from_u64(0),
            next_action_ts: Ts::ZERO,
            seq: 0,
        }
    }

    fn snap_to_tick(&self, price: Price) -> Price {
        let tick = self.rules.tick_size_ticks.raw().max(1);
        Price::from_ticks((price.raw() / tick) * tick)
    }

    fn snap_to_lot(&self, qty: Qty) -> Qty {
        let lot = self.rules.lot_size.raw().max(1);
        let min = self.rules.min_qty.raw().max(1);

        let mut q = qty.raw().max(min);
        q = (q / lot) * lot;
        if q <= 0 {
            q = lot;
        }
        Qty::new(q)
    }

    fn sample_gap(&mut self) -> i64 {
        let mean = self.cfg.mean_gap_ns.max(1) as f64;
        let exp = Exp::new(1.0 / mean).expect("positive rate");
        (exp.sample(&mut self.rng) as i64).max(1)
    }
}

impl Agent for NoiseTrader {
    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.next_action_ts = Ts::ZERO;
        self.seq = 0;
    }

    fn step(&mut self, ts: Ts, view: &MarketView, _state: &AgentState, out: &mut Vec<Action>) {
        if ts < self.next_action_ts {
            return;
        }
        let gap = self.sample_gap();
        self.next_action_ts = ts.add_nanos(gap);

        // Reference price: the mid when the book is two-sided
        let mut reference = self.snap_to_tick(view.mid.unwrap_or(self.cfg.default_mid));
        if !reference.is_positive() {
            reference = Price::from_ticks(self.rules.tick_size_ticks.raw().max(1));
        }

        let side = if self.rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let qty_raw = self.rng.gen_range(self.cfg.min_qty.max(1)..=self.cfg.max_qty.max(1));
        let qty = self.snap_to_lot(Qty::new(qty_raw));

        self.seq += 1;
        let id = scoped_order_id(self.owner, self.seq);

        let order = if self.rng.gen_bool(self.cfg.prob_market) {
            Order::market(id, view.ts, side, qty, self.owner)
        } else {
            let offset = self.rng.gen_range(1..=self.cfg.max_offset_ticks.max(1));
            let raw = match side {
                Side::Buy => reference.raw() - offset,
                Side::Sell => reference.raw() + offset,
            };
            let mut price = self.snap_to_tick(Price::from_ticks(raw));
            if !price.is_positive() {
                price = reference;
            }
            Order {
                tif: TimeInForce::Gtc,
                market_style: MarketStyle::PureMarket,
                ..Order::limit(id, view.ts, side, price, qty, self.owner)
            }
        };

        out.push(Action::Submit(order));
    }
}
