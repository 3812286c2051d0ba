//! The matching engine: order processing, STP, price bands, auctions and
//! session phase transitions.

use exsim_core::constants::BPS_DENOMINATOR;
use exsim_core::types::{
    MarketStyle, Order, OrderId, OrderType, Price, Qty, Side, TimeInForce, Trade, TradeId, Ts,
};
use exsim_lob::OrderBook;
use serde::{Deserialize, Serialize};

use crate::rules::{MarketPhase, RejectReason, RuleSet, StpMode};

/// Processing outcome for an inbound order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order was admitted (it may still have filled nothing)
    #[default]
    Accepted,
    /// The order was rejected; `reject_reason` explains why
    Rejected,
}

/// Result of one [`MatchingEngine::process`] call.
///
/// `trades` includes any trades produced by a timed transition that was
/// due at the order's timestamp, followed by the order's own executions.
/// `filled_qty` counts only the incoming order's fills.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Trades in execution order
    pub trades: Vec<Trade>,
    /// Remainder that now rests in the book, if any
    pub resting: Option<Order>,
    /// Quantity of the incoming order that executed
    pub filled_qty: Qty,
    /// Admission outcome
    pub status: OrderStatus,
    /// Failure reason when rejected
    pub reject_reason: RejectReason,
}

impl MatchResult {
    fn reject(&mut self, reason: RejectReason) {
        self.status = OrderStatus::Rejected;
        self.reject_reason = reason;
    }
}

/// What the matching walk reported back to the remainder logic
#[derive(Debug, Clone, Copy, Default)]
struct WalkOutcome {
    /// STP `CancelTaker` discarded the unfilled remainder
    taker_cancelled: bool,
    /// Price of the final fill in this call
    last_fill_price: Option<Price>,
}

/// Deterministic price-time priority matching engine.
///
/// Single-threaded: `process`, `flush` and direct book mutations share
/// state and must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    book: OrderBook,
    rules: RuleSet,
    next_trade_id: TradeId,
    auction_queue: Vec<Order>,
    auction_end_ts: Ts,
    tal_end_ts: Ts,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

impl MatchingEngine {
    /// Create an engine with the given rule set
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            book: OrderBook::new(),
            rules,
            next_trade_id: TradeId::new(1),
            auction_queue: Vec::new(),
            auction_end_ts: Ts::ZERO,
            tal_end_ts: Ts::ZERO,
        }
    }

    /// The resting book
    #[must_use]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Mutable access to the resting book (driver-level cancel/modify)
    pub fn book_mut(&mut self) -> &mut OrderBook {
        &mut self.book
    }

    /// The rule set
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Mutable access to the rule set
    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    /// Enter trading-at-last until `end_ts`.
    pub fn start_trading_at_last(&mut self, end_ts: Ts) {
        tracing::info!(end_ts = end_ts.as_nanos(), "entering trading-at-last");
        self.rules.set_phase(MarketPhase::TradingAtLast);
        self.tal_end_ts = end_ts;
    }

    /// Enter the closing auction until `end_ts`; orders queue for the
    /// closing uncross.
    pub fn start_closing_auction(&mut self, end_ts: Ts) {
        tracing::info!(end_ts = end_ts.as_nanos(), "entering closing auction");
        self.rules.set_phase(MarketPhase::ClosingAuction);
        self.auction_end_ts = end_ts;
    }

    /// Execute any timed transition due at or before `ts` and return the
    /// trades it produced. Idempotent; safe to call every tick.
    pub fn flush(&mut self, ts: Ts) -> Vec<Trade> {
        if self.rules.phase() == MarketPhase::TradingAtLast && ts >= self.tal_end_ts {
            tracing::info!(ts = ts.as_nanos(), "trading-at-last ended");
            self.rules.set_phase(MarketPhase::Continuous);
        }

        match self.rules.phase() {
            MarketPhase::Auction if ts >= self.auction_end_ts => {
                let trades = self.uncross_auction(self.auction_end_ts);
                tracing::info!(trades = trades.len(), "volatility auction uncrossed, reopening");
                self.rules.set_phase(MarketPhase::Continuous);
                trades
            }
            MarketPhase::ClosingAuction if ts >= self.auction_end_ts => {
                let trades = self.uncross_auction(self.auction_end_ts);
                tracing::info!(trades = trades.len(), "closing auction uncrossed, market closed");
                self.rules.set_phase(MarketPhase::Closed);
                trades
            }
            _ => Vec::new(),
        }
    }

    /// Process one inbound order through the full pipeline: timed
    /// transitions, rule admission, phase policy, STP, price bands,
    /// matching and remainder handling.
    pub fn process(&mut self, incoming: Order) -> MatchResult {
        let mut result = MatchResult {
            trades: self.flush(incoming.ts),
            ..MatchResult::default()
        };

        let decision = self.rules.pre_accept(&incoming);
        if !decision.accept {
            result.reject(decision.reason);
            return result;
        }

        match self.rules.phase() {
            // A halted market with enforcement off trades normally.
            MarketPhase::Continuous | MarketPhase::Halted => {
                self.process_continuous(incoming, &mut result);
            }
            MarketPhase::TradingAtLast => {
                self.process_at_last(incoming, &mut result);
            }
            MarketPhase::Auction | MarketPhase::ClosingAuction => {
                self.auction_queue.push(incoming);
            }
            MarketPhase::Closed => {
                result.reject(RejectReason::MarketHalted);
            }
        }

        result
    }

    fn process_continuous(&mut self, incoming: Order, result: &mut MatchResult) {
        if self.should_trigger_volatility_auction(&incoming) {
            let end = incoming
                .ts
                .add_nanos(self.rules.config().vol_auction_duration_ns);
            tracing::info!(
                order = incoming.id.value(),
                end_ts = end.as_nanos(),
                "price band breach, starting volatility auction"
            );
            self.rules.set_phase(MarketPhase::Auction);
            self.auction_end_ts = end;
            self.auction_queue.push(incoming);
            return;
        }

        if incoming.tif == TimeInForce::Fok
            && self.available_liquidity(&incoming, None) < incoming.qty
        {
            return; // FOK is atomic but legal: accepted with zero fills
        }

        let mut taker = incoming;
        let outcome = self.execute(&mut taker, None, result);
        self.handle_remainder(taker, outcome, result);
    }

    fn process_at_last(&mut self, incoming: Order, result: &mut MatchResult) {
        let Some(last) = self.rules.last_trade_price() else {
            result.reject(RejectReason::NoReferencePrice);
            return;
        };

        if incoming.is_limit() {
            if incoming.price != last {
                result.reject(RejectReason::PriceNotAtLast);
                return;
            }
        } else {
            // Market orders are permitted only when the opposite best is
            // exactly the last trade price.
            let best_opposite = match incoming.side {
                Side::Buy => self.book.best_ask(),
                Side::Sell => self.book.best_bid(),
            };
            if best_opposite != Some(last) {
                result.reject(RejectReason::PriceNotAtLast);
                return;
            }
        }

        if incoming.tif == TimeInForce::Fok
            && self.available_liquidity(&incoming, Some(last)) < incoming.qty
        {
            return;
        }

        let mut taker = incoming;
        let outcome = self.execute(&mut taker, Some(last), result);
        self.handle_remainder(taker, outcome, result);
    }

    /// Walk the opposite side from the best price outward, consuming
    /// makers FIFO. Trades always print at the maker's price. With
    /// `price_cap` set (trading-at-last), only makers at exactly that
    /// price are touched.
    fn execute(
        &mut self,
        taker: &mut Order,
        price_cap: Option<Price>,
        result: &mut MatchResult,
    ) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        let stp = self.rules.config().stp;
        let opposite = taker.side.opposite();

        while taker.qty.is_positive() {
            let Some(maker) = self.book.peek_front(opposite) else {
                break;
            };
            if !price_acceptable(taker, maker.price, price_cap) {
                break;
            }

            if maker.owner == taker.owner && stp != StpMode::None {
                match stp {
                    StpMode::CancelTaker => {
                        taker.qty = Qty::ZERO;
                        outcome.taker_cancelled = true;
                        break;
                    }
                    StpMode::CancelMaker => {
                        let cancelled = self.book.cancel(maker.id);
                        assert!(cancelled, "STP maker cancel of a live order");
                        continue;
                    }
                    StpMode::None => unreachable!(),
                }
            }

            let exec = taker.qty.min(maker.qty);
            assert!(exec.is_positive(), "matching walk reached non-positive qty");
            self.book.fill_front(opposite, exec);

            let trade = self.make_trade(taker.ts, maker.price, exec, maker.id, taker.id);
            self.rules.on_trades(std::slice::from_ref(&trade));
            result.trades.push(trade);
            result.filled_qty = result.filled_qty + exec;
            taker.qty = taker.qty - exec;
            outcome.last_fill_price = Some(maker.price);
        }

        outcome
    }

    fn handle_remainder(&mut self, taker: Order, outcome: WalkOutcome, result: &mut MatchResult) {
        if outcome.taker_cancelled {
            if result.filled_qty.is_zero() {
                result.reject(RejectReason::SelfTradePrevented);
            }
            return;
        }
        if !taker.qty.is_positive() {
            return;
        }

        match taker.order_type {
            OrderType::Limit => {
                if taker.tif == TimeInForce::Gtc {
                    if self.book.add_resting_limit(taker) {
                        result.resting = Some(taker);
                    }
                }
                // IOC cancels the remainder; a FOK that got here is fully filled
            }
            OrderType::Market => {
                if taker.market_style == MarketStyle::MarketToLimit {
                    if let Some(px) = outcome.last_fill_price {
                        let mut rest = taker;
                        rest.order_type = OrderType::Limit;
                        rest.price = px;
                        if self.book.add_resting_limit(rest) {
                            result.resting = Some(rest);
                        }
                    }
                }
                // PureMarket (or MarketToLimit with no fill) cancels
            }
        }
    }

    /// Total opposite-side quantity this taker could execute against,
    /// accounting for its price constraint and STP maker cancels.
    fn available_liquidity(&self, taker: &Order, price_cap: Option<Price>) -> Qty {
        let stp = self.rules.config().stp;
        let mut total = Qty::ZERO;
        for maker in self.book.orders_in_priority(taker.side.opposite()) {
            if !price_acceptable(taker, maker.price, price_cap) {
                break;
            }
            if maker.owner == taker.owner {
                match stp {
                    StpMode::CancelTaker => break,
                    StpMode::CancelMaker => continue,
                    StpMode::None => {}
                }
            }
            total = total + maker.qty;
        }
        total
    }

    /// The first price this taker would execute at, after any STP maker
    /// cancels; `None` when it would not execute at all.
    fn first_execution_price(&self, taker: &Order) -> Option<Price> {
        let stp = self.rules.config().stp;
        for maker in self.book.orders_in_priority(taker.side.opposite()) {
            if !price_acceptable(taker, maker.price, None) {
                return None;
            }
            if maker.owner == taker.owner {
                match stp {
                    StpMode::CancelTaker => return None,
                    StpMode::CancelMaker => continue,
                    StpMode::None => {}
                }
            }
            return Some(maker.price);
        }
        None
    }

    fn should_trigger_volatility_auction(&self, incoming: &Order) -> bool {
        let cfg = self.rules.config();
        if !cfg.enable_price_bands || !cfg.enable_volatility_interruption {
            return false;
        }
        let Some(reference) = self.rules.last_trade_price() else {
            return false;
        };
        let Some(first_px) = self.first_execution_price(incoming) else {
            return false;
        };
        let half_width = reference.raw() * cfg.band_bps / BPS_DENOMINATOR;
        first_px.distance(reference) > half_width
    }

    fn make_trade(&mut self, ts: Ts, price: Price, qty: Qty, maker: OrderId, taker: OrderId) -> Trade {
        let trade = Trade {
            id: self.next_trade_id,
            ts,
            price,
            qty,
            maker_order_id: maker,
            taker_order_id: taker,
        };
        self.next_trade_id = self.next_trade_id.next();
        trade
    }

    // ---- auction uncross ----

    /// Resolve a volatility or closing auction at a single clearing price.
    ///
    /// Clearing price selection: maximise executable volume; tie-break on
    /// minimal imbalance, then closeness to the reference price, then the
    /// lower price. Execution pairs both sides by price-time priority at
    /// the clearing price. Queued market remainders are cancelled; queued
    /// limit remainders re-enter the book at their own limit.
    fn uncross_auction(&mut self, uncross_ts: Ts) -> Vec<Trade> {
        let queued = std::mem::take(&mut self.auction_queue);

        let mut buys: Vec<AuctionEntry> = Vec::new();
        let mut sells: Vec<AuctionEntry> = Vec::new();
        for order in &queued {
            let entry = AuctionEntry::queued(*order);
            match order.side {
                Side::Buy => buys.push(entry),
                Side::Sell => sells.push(entry),
            }
        }
        for maker in self.book.orders_in_priority(Side::Buy) {
            buys.push(AuctionEntry::resting(*maker));
        }
        for maker in self.book.orders_in_priority(Side::Sell) {
            sells.push(AuctionEntry::resting(*maker));
        }

        let Some(clearing) = self.compute_clearing_price(&buys, &sells) else {
            self.restore_queued(&queued, &[]);
            return Vec::new();
        };
        tracing::debug!(price = clearing.raw(), "auction clearing price");

        // Price-time priority on both sides; market orders first.
        buys.sort_by(AuctionEntry::buy_priority);
        sells.sort_by(AuctionEntry::sell_priority);

        let mut eligible_buys: Vec<AuctionEntry> = buys
            .into_iter()
            .filter(|e| e.limit.map_or(true, |px| px >= clearing))
            .collect();
        let mut eligible_sells: Vec<AuctionEntry> = sells
            .into_iter()
            .filter(|e| e.limit.map_or(true, |px| px <= clearing))
            .collect();

        let mut trades = Vec::new();
        let (mut bi, mut si) = (0usize, 0usize);
        while bi < eligible_buys.len() && si < eligible_sells.len() {
            let exec = eligible_buys[bi].remaining.min(eligible_sells[si].remaining);
            assert!(exec.is_positive(), "auction pairing reached non-positive qty");

            let trade = self.make_trade(
                uncross_ts,
                clearing,
                exec,
                eligible_sells[si].order.id,
                eligible_buys[bi].order.id,
            );
            self.rules.on_trades(std::slice::from_ref(&trade));
            trades.push(trade);

            eligible_buys[bi].remaining = eligible_buys[bi].remaining - exec;
            eligible_sells[si].remaining = eligible_sells[si].remaining - exec;
            if eligible_buys[bi].remaining.is_zero() {
                bi += 1;
            }
            if eligible_sells[si].remaining.is_zero() {
                si += 1;
            }
        }

        // Apply executions to resting orders first, then re-admit queued
        // limit remainders so they cannot cross orders about to shrink.
        let executed: Vec<&AuctionEntry> = eligible_buys
            .iter()
            .chain(eligible_sells.iter())
            .collect();
        for entry in &executed {
            if entry.from_book && entry.remaining < entry.order.qty {
                if entry.remaining.is_zero() {
                    self.book.cancel(entry.order.id);
                } else {
                    self.book.modify_qty(entry.order.id, entry.remaining);
                }
            }
        }
        self.restore_queued(&queued, &executed);

        trades
    }

    /// Re-admit queued limit orders (with any unexecuted remainder) to the
    /// book; queued market orders are cancelled.
    fn restore_queued(&mut self, queued: &[Order], executed: &[&AuctionEntry]) {
        for order in queued {
            if !order.is_limit() {
                continue;
            }
            let remaining = executed
                .iter()
                .find(|e| !e.from_book && e.order.id == order.id)
                .map_or(order.qty, |e| e.remaining);
            if remaining.is_positive() {
                let mut rest = *order;
                rest.qty = remaining;
                // Subject to non-crossing; a refused remainder is dropped.
                let _ = self.book.add_resting_limit(rest);
            }
        }
    }

    /// Candidate-price search for the auction clearing price.
    fn compute_clearing_price(&self, buys: &[AuctionEntry], sells: &[AuctionEntry]) -> Option<Price> {
        let mut candidates: Vec<i64> = buys
            .iter()
            .chain(sells.iter())
            .filter_map(|e| e.limit.map(Price::raw))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let reference = self.rules.last_trade_price();
        let mut best: Option<(Qty, i64, i64, i64)> = None; // (volume, imbalance, distance, price)

        for &px in &candidates {
            let price = Price::from_ticks(px);
            let demand: Qty = buys
                .iter()
                .filter(|e| e.limit.map_or(true, |l| l >= price))
                .fold(Qty::ZERO, |acc, e| acc + e.order.qty);
            let supply: Qty = sells
                .iter()
                .filter(|e| e.limit.map_or(true, |l| l <= price))
                .fold(Qty::ZERO, |acc, e| acc + e.order.qty);

            let volume = demand.min(supply);
            if volume.is_zero() {
                continue;
            }
            let imbalance = (demand.raw() - supply.raw()).abs();
            let distance = reference.map_or(0, |r| price.distance(r));

            let better = match best {
                None => true,
                Some((bv, bimb, bdist, _)) => {
                    volume > bv
                        || (volume == bv && imbalance < bimb)
                        || (volume == bv && imbalance == bimb && distance < bdist)
                }
            };
            if better {
                best = Some((volume, imbalance, distance, px));
            }
        }

        best.map(|(_, _, _, px)| Price::from_ticks(px))
    }
}

/// Whether a maker at `maker_price` is matchable by this taker.
fn price_acceptable(taker: &Order, maker_price: Price, price_cap: Option<Price>) -> bool {
    if let Some(cap) = price_cap {
        if maker_price != cap {
            return false;
        }
    }
    if taker.is_limit() {
        match taker.side {
            Side::Buy => maker_price <= taker.price,
            Side::Sell => maker_price >= taker.price,
        }
    } else {
        true
    }
}

/// One side's interest during an auction uncross
#[derive(Debug, Clone, Copy)]
struct AuctionEntry {
    order: Order,
    /// Limit price; `None` for price-unbounded market orders
    limit: Option<Price>,
    /// Whether the order rests in the book (vs the auction queue)
    from_book: bool,
    /// Unexecuted quantity as the pairing progresses
    remaining: Qty,
}

impl AuctionEntry {
    fn queued(order: Order) -> Self {
        Self {
            order,
            limit: order.is_limit().then_some(order.price),
            from_book: false,
            remaining: order.qty,
        }
    }

    fn resting(order: Order) -> Self {
        Self {
            order,
            limit: Some(order.price),
            from_book: true,
            remaining: order.qty,
        }
    }

    /// Buy priority: market first, then higher limit, then time, then id.
    fn buy_priority(a: &Self, b: &Self) -> std::cmp::Ordering {
        let rank = |e: &Self| e.limit.map_or(i64::MAX, Price::raw);
        rank(b)
            .cmp(&rank(a))
            .then_with(|| a.order.ts.cmp(&b.order.ts))
            .then_with(|| a.order.id.cmp(&b.order.id))
    }

    /// Sell priority: market first, then lower limit, then time, then id.
    fn sell_priority(a: &Self, b: &Self) -> std::cmp::Ordering {
        let rank = |e: &Self| e.limit.map_or(i64::MIN, Price::raw);
        rank(a)
            .cmp(&rank(b))
            .then_with(|| a.order.ts.cmp(&b.order.ts))
            .then_with(|| a.order.id.cmp(&b.order.id))
    }
}
