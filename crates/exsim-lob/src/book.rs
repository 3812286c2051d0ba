//! Price-time priority order book.

use std::collections::{BTreeMap, HashMap, VecDeque};

use exsim_core::types::{Order, OrderId, Price, Qty, Side};
use serde::{Deserialize, Serialize};

/// Aggregated view of one price level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    /// Price of the level
    pub price: Price,
    /// Total resting quantity at this price
    pub total_qty: Qty,
    /// Number of resting orders at this price
    pub order_count: u32,
}

/// One price level: a FIFO queue of order ids plus cached totals.
///
/// Cancelled ids stay in the queue until they reach the front; `total_qty`
/// and `live` always describe the live orders only.
#[derive(Debug, Clone, Default)]
struct PriceLevel {
    queue: VecDeque<OrderId>,
    total_qty: Qty,
    live: u32,
}

/// Price-time priority limit order book.
///
/// Orders live in an id-keyed arena; the arena entry doubles as the
/// locator (the stored order carries its own side and price), which makes
/// cancel and modify O(1). Each side is a `BTreeMap` keyed by raw price:
/// asks iterate ascending, bids descending via `rev()`.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: BTreeMap<i64, PriceLevel>,
    asks: BTreeMap<i64, PriceLevel>,
    orders: HashMap<OrderId, Order>,
}

impl OrderBook {
    /// Create an empty book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether adding this limit order would cross the opposite side
    #[must_use]
    pub fn would_cross(&self, order: &Order) -> bool {
        match order.side {
            Side::Buy => self.best_ask().is_some_and(|ask| order.price >= ask),
            Side::Sell => self.best_bid().is_some_and(|bid| order.price <= bid),
        }
    }

    /// Add a resting limit order at the tail of its price level.
    ///
    /// Rejects non-limit orders, non-positive quantities, duplicate ids,
    /// and orders that would cross the opposite side. Returns false on
    /// rejection with no state change.
    pub fn add_resting_limit(&mut self, order: Order) -> bool {
        if !order.is_limit() || !order.qty.is_positive() {
            return false;
        }
        if self.orders.contains_key(&order.id) {
            return false;
        }
        if self.would_cross(&order) {
            return false;
        }

        let level = self
            .side_mut(order.side)
            .entry(order.price.raw())
            .or_default();
        level.queue.push_back(order.id);
        level.total_qty = level.total_qty + order.qty;
        level.live += 1;
        self.orders.insert(order.id, order);
        true
    }

    /// Cancel a resting order by id. O(1).
    ///
    /// Returns false for unknown ids. The level cache is updated
    /// immediately; the dead id is dequeued lazily.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        let Some(order) = self.orders.remove(&id) else {
            return false;
        };
        self.release_cached(order.side, order.price, order.qty, true);
        true
    }

    /// Reduce a resting order's quantity in place, keeping time priority.
    ///
    /// `new_qty <= 0` behaves as cancel; an increase is refused. Setting
    /// the current quantity is a no-op returning true.
    pub fn modify_qty(&mut self, id: OrderId, new_qty: Qty) -> bool {
        if !new_qty.is_positive() {
            return self.cancel(id);
        }
        let Some(order) = self.orders.get_mut(&id) else {
            return false;
        };
        let old_qty = order.qty;
        if new_qty > old_qty {
            return false;
        }
        if new_qty == old_qty {
            return true;
        }
        order.qty = new_qty;
        let (side, price) = (order.side, order.price);
        let delta = old_qty - new_qty;
        let level = self
            .side_mut(side)
            .get_mut(&price.raw())
            .expect("resting order has a level");
        level.total_qty = level.total_qty - delta;
        true
    }

    /// Best (highest) bid price
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().map(|&p| Price::from_ticks(p))
    }

    /// Best (lowest) ask price
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().map(|&p| Price::from_ticks(p))
    }

    /// Whether the resting book is crossed (`best_bid >= best_ask`)
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Top `n` aggregated levels in priority order
    #[must_use]
    pub fn depth(&self, side: Side, n: usize) -> Vec<LevelSummary> {
        let levels: Box<dyn Iterator<Item = (&i64, &PriceLevel)> + '_> = match side {
            Side::Buy => Box::new(self.bids.iter().rev()),
            Side::Sell => Box::new(self.asks.iter()),
        };
        levels
            .take(n)
            .map(|(&px, lvl)| LevelSummary {
                price: Price::from_ticks(px),
                total_qty: lvl.total_qty,
                order_count: lvl.live,
            })
            .collect()
    }

    /// Whether a side has no resting orders
    #[must_use]
    pub fn is_side_empty(&self, side: Side) -> bool {
        match side {
            Side::Buy => self.bids.is_empty(),
            Side::Sell => self.asks.is_empty(),
        }
    }

    /// Number of price levels on a side
    #[must_use]
    pub fn level_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.len(),
            Side::Sell => self.asks.len(),
        }
    }

    /// Look up a resting order by id
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// The front (oldest) live order at the best price on a side.
    ///
    /// Dequeues any cancelled ids it encounters, so the returned order is
    /// the one the matching walk would consume next.
    pub fn peek_front(&mut self, side: Side) -> Option<Order> {
        let (levels, orders) = match side {
            Side::Buy => (&mut self.bids, &self.orders),
            Side::Sell => (&mut self.asks, &self.orders),
        };
        loop {
            let price = match side {
                Side::Buy => *levels.keys().next_back()?,
                Side::Sell => *levels.keys().next()?,
            };
            let level = levels.get_mut(&price).expect("best price has a level");

            while let Some(id) = level.queue.front().copied() {
                if let Some(order) = orders.get(&id) {
                    return Some(*order);
                }
                level.queue.pop_front();
            }

            // Only dead ids remained at this price.
            assert_eq!(level.live, 0, "drained level still reports live orders");
            levels.remove(&price);
        }
    }

    /// Execute `qty` against the front live order at the best price.
    ///
    /// Callers obtain the front order via [`peek_front`](Self::peek_front)
    /// first; `qty` must not exceed its remaining quantity.
    pub fn fill_front(&mut self, side: Side, qty: Qty) {
        let front = self.peek_front(side).expect("fill_front on empty side");
        assert!(
            qty.is_positive() && qty <= front.qty,
            "fill_front qty out of range"
        );

        if qty == front.qty {
            let removed = self.orders.remove(&front.id);
            assert!(removed.is_some());
            // peek_front left the filled order at the queue front
            let level = self
                .side_mut(side)
                .get_mut(&front.price.raw())
                .expect("front order has a level");
            level.queue.pop_front();
            self.release_cached(side, front.price, qty, true);
        } else {
            let order = self
                .orders
                .get_mut(&front.id)
                .expect("front order is live");
            order.qty = order.qty - qty;
            self.release_cached(side, front.price, qty, false);
        }
    }

    /// All live orders on a side in price-time priority order
    pub fn orders_in_priority(&self, side: Side) -> impl Iterator<Item = &Order> + '_ {
        let levels: Box<dyn Iterator<Item = &PriceLevel> + '_> = match side {
            Side::Buy => Box::new(self.bids.values().rev()),
            Side::Sell => Box::new(self.asks.values()),
        };
        levels.flat_map(move |lvl| lvl.queue.iter().filter_map(move |id| self.orders.get(id)))
    }

    /// Validate internal invariants: non-crossed, level caches in sync,
    /// no empty level retained, arena and levels mutually consistent.
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        if self.is_crossed() {
            return false;
        }
        for (side, levels) in [(Side::Buy, &self.bids), (Side::Sell, &self.asks)] {
            for (&px, level) in levels {
                let mut sum = Qty::ZERO;
                let mut live = 0u32;
                for id in &level.queue {
                    if let Some(o) = self.orders.get(id) {
                        if o.side != side || o.price.raw() != px {
                            return false;
                        }
                        sum = sum + o.qty;
                        live += 1;
                    }
                }
                if sum != level.total_qty || live != level.live || live == 0 {
                    return false;
                }
            }
        }
        let live_total: u32 = self.bids.values().chain(self.asks.values()).map(|l| l.live).sum();
        live_total as usize == self.orders.len()
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<i64, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Update a level's cache after quantity leaves it; drops the level
    /// when its last live order goes.
    fn release_cached(&mut self, side: Side, price: Price, qty: Qty, order_gone: bool) {
        let levels = self.side_mut(side);
        let level = levels
            .get_mut(&price.raw())
            .expect("live order has a level");
        level.total_qty = level.total_qty - qty;
        if order_gone {
            level.live -= 1;
            if level.live == 0 {
                levels.remove(&price.raw());
            }
        }
    }
}
