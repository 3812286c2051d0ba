//! Live wrapper: the same engine and driver state behind one mutex, with
//! a worker thread advancing virtual time.
//!
//! Every engine call happens under the mutex; no lock is held across
//! I/O. The stop flag is observed between ticks, so an in-flight tick
//! always completes.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use exsim_core::constants::{DEFAULT_DT_NS, NS_PER_SEC};
use exsim_core::types::{Order, OrderId, OwnerId, Price, Qty, Side, Trade, Ts};
use exsim_engine::{
    apply_trades_to_accounts, Account, MatchingEngine, OrderMeta, OrderStatus, RejectReason,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::agents::{midpoint, Action, Agent, MarketView};
use crate::world::BookTop;

/// Live wrapper configuration
#[derive(Debug, Clone, Copy)]
pub struct LiveConfig {
    /// Virtual time per tick, in nanoseconds
    pub dt_ns: i64,
    /// Optional wall-clock pacing between ticks; `None` runs flat out
    pub pace: Option<Duration>,
    /// How many trades and top-of-book points to retain
    pub history: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            dt_ns: DEFAULT_DT_NS,
            pace: None,
            history: 4096,
        }
    }
}

/// Acknowledgement for a manually submitted order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Id assigned to the order
    pub id: OrderId,
    /// Admission outcome
    pub status: OrderStatus,
    /// Failure reason when rejected
    pub reject_reason: RejectReason,
    /// Quantity that executed immediately
    pub filled_qty: Qty,
}

/// Lightweight "current market" view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Virtual time of the snapshot
    pub ts: Ts,
    /// Best bid, if any
    pub best_bid: Option<Price>,
    /// Best ask, if any
    pub best_ask: Option<Price>,
    /// Midpoint, if both sides exist
    pub mid: Option<Price>,
    /// Last trade price, if any
    pub last_trade: Option<Price>,
}

/// One aggregated depth level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// Level price
    pub price: Price,
    /// Total resting quantity
    pub qty: Qty,
}

/// L2 depth, best levels first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDepth {
    /// Bid levels, best to worse
    pub bids: Vec<DepthLevel>,
    /// Ask levels, best to worse
    pub asks: Vec<DepthLevel>,
}

/// Engine-plus-driver state guarded by the wrapper's mutex
struct LiveState {
    engine: MatchingEngine,
    ts_ns: i64,
    t_end_ns: i64,
    dt_ns: i64,
    history: usize,
    trades: VecDeque<Trade>,  // newest first
    tops: VecDeque<BookTop>,  // oldest first
    order_meta: HashMap<OrderId, OrderMeta>,
    accounts: HashMap<OwnerId, Account>,
    agents: Vec<Box<dyn Agent>>,
    manual_seq: u64,
}

impl LiveState {
    fn record_trades(&mut self, ts: Ts, trades: &[Trade]) {
        if trades.is_empty() {
            return;
        }
        let book = self.engine.book();
        let mid = midpoint(book.best_bid(), book.best_ask());
        apply_trades_to_accounts(ts, trades, &self.order_meta, &mut self.accounts, mid);
        for trade in trades {
            self.trades.push_front(*trade);
        }
        while self.trades.len() > self.history {
            self.trades.pop_back();
        }
    }

    /// One tick of the same loop the batch driver runs.
    fn tick(&mut self) {
        let ts = Ts::from_nanos(self.ts_ns);

        let flushed = self.engine.flush(ts);
        self.record_trades(ts, &flushed);

        let view = {
            let book = self.engine.book();
            let (best_bid, best_ask) = (book.best_bid(), book.best_ask());
            MarketView {
                ts,
                best_bid,
                best_ask,
                mid: midpoint(best_bid, best_ask),
                last_trade: self.engine.rules().last_trade_price(),
            }
        };

        let mut actions: Vec<Action> = Vec::new();
        for idx in 0..self.agents.len() {
            let owner = self.agents[idx].owner();
            let account = self.accounts.get(&owner).copied().unwrap_or_default();
            let agent_state = crate::agents::AgentState {
                owner,
                cash_ticks: account.cash_ticks,
                position: account.position,
            };

            actions.clear();
            self.agents[idx].step(ts, &view, &agent_state, &mut actions);

            for action in actions.drain(..) {
                match action {
                    Action::Submit(mut order) => {
                        order.ts = ts;
                        order.owner = owner;
                        self.order_meta
                            .insert(order.id, OrderMeta { owner, side: order.side });
                        let res = self.engine.process(order);
                        self.record_trades(ts, &res.trades);
                    }
                    Action::Cancel(id) => {
                        let _ = self.engine.book_mut().cancel(id);
                    }
                    Action::ModifyQty { id, new_qty } => {
                        let _ = self.engine.book_mut().modify_qty(id, new_qty);
                    }
                }
            }
        }

        let book = self.engine.book();
        let (best_bid, best_ask) = (book.best_bid(), book.best_ask());
        self.tops.push_back(BookTop {
            ts,
            best_bid,
            best_ask,
            mid: midpoint(best_bid, best_ask),
        });
        while self.tops.len() > self.history {
            self.tops.pop_front();
        }

        self.ts_ns += self.dt_ns;
    }
}

/// The live world: a request-serving surface over a ticking engine.
pub struct LiveWorld {
    state: Arc<Mutex<LiveState>>,
    running: Arc<AtomicBool>,
    pace: Option<Duration>,
    seed: u64,
    worker: Option<JoinHandle<()>>,
}

impl LiveWorld {
    /// Create a live world; add agents before calling [`start`](Self::start).
    #[must_use]
    pub fn new(engine: MatchingEngine, cfg: LiveConfig, seed: u64, horizon_seconds: f64) -> Self {
        let t_end_ns = (horizon_seconds * NS_PER_SEC as f64).round() as i64;
        let state = LiveState {
            engine,
            ts_ns: 0,
            t_end_ns,
            dt_ns: cfg.dt_ns.max(1),
            history: cfg.history.max(1),
            trades: VecDeque::new(),
            tops: VecDeque::new(),
            order_meta: HashMap::new(),
            accounts: HashMap::new(),
            agents: Vec::new(),
            manual_seq: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            running: Arc::new(AtomicBool::new(false)),
            pace: cfg.pace,
            seed,
            worker: None,
        }
    }

    /// Register an agent driven by the worker thread
    pub fn add_agent(&self, agent: Box<dyn Agent>) {
        self.state.lock().agents.push(agent);
    }

    /// Spawn the worker thread. Idempotent while running.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            // Same per-agent seed derivation as the batch driver
            let mut state = self.state.lock();
            let mut s = self.seed;
            for i in 0..state.agents.len() {
                let derived = crate::world::splitmix64(&mut s) ^ (i as u64 + 1);
                state.agents[i].seed(derived);
            }
        }

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        let pace = self.pace;

        self.worker = Some(std::thread::spawn(move || {
            tracing::info!("live world worker started");
            while running.load(Ordering::SeqCst) {
                {
                    let mut guard = state.lock();
                    if guard.ts_ns > guard.t_end_ns {
                        break;
                    }
                    guard.tick();
                }
                // Lock released before any sleep
                if let Some(p) = pace {
                    std::thread::sleep(p);
                }
            }
            running.store(false, Ordering::SeqCst);
            tracing::info!("live world worker stopped");
        }));
    }

    /// Stop the worker; the in-flight tick completes first.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    /// Whether the worker is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current market snapshot
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        let book = state.engine.book();
        let (best_bid, best_ask) = (book.best_bid(), book.best_ask());
        Snapshot {
            ts: Ts::from_nanos(state.ts_ns),
            best_bid,
            best_ask,
            mid: midpoint(best_bid, best_ask),
            last_trade: state.engine.rules().last_trade_price(),
        }
    }

    /// Most recent trades, newest first
    #[must_use]
    pub fn recent_trades(&self, limit: usize) -> Vec<Trade> {
        let state = self.state.lock();
        state.trades.iter().take(limit).copied().collect()
    }

    /// Last `points` top-of-book records, oldest first
    #[must_use]
    pub fn top_points(&self, points: usize) -> Vec<BookTop> {
        let state = self.state.lock();
        let skip = state.tops.len().saturating_sub(points);
        state.tops.iter().skip(skip).copied().collect()
    }

    /// Aggregated depth, top `levels` per side
    #[must_use]
    pub fn depth(&self, levels: usize) -> BookDepth {
        let state = self.state.lock();
        let book = state.engine.book();
        let to_levels = |side| {
            book.depth(side, levels)
                .into_iter()
                .map(|l| DepthLevel { price: l.price, qty: l.total_qty })
                .collect()
        };
        BookDepth {
            bids: to_levels(Side::Buy),
            asks: to_levels(Side::Sell),
        }
    }

    /// Submit an order at the current virtual time.
    ///
    /// A zero order id is replaced with a wrapper-scoped id.
    pub fn submit_order(&self, mut order: Order) -> OrderAck {
        let mut state = self.state.lock();
        let ts = Ts::from_nanos(state.ts_ns);

        if order.id.value() == 0 {
            // Manual ids carry a namespace bit so they never collide with
            // agent-generated sequences.
            state.manual_seq += 1;
            order.id = crate::agents::scoped_order_id(order.owner, state.manual_seq | (1 << 39));
        }
        order.ts = ts;

        state
            .order_meta
            .insert(order.id, OrderMeta { owner: order.owner, side: order.side });
        let res = state.engine.process(order);
        state.record_trades(ts, &res.trades);

        OrderAck {
            id: order.id,
            status: res.status,
            reject_reason: res.reject_reason,
            filled_qty: res.filled_qty,
        }
    }

    /// Cancel a resting order
    pub fn cancel_order(&self, id: OrderId) -> bool {
        self.state.lock().engine.book_mut().cancel(id)
    }

    /// Reduce a resting order's quantity
    pub fn modify_qty(&self, id: OrderId, new_qty: Qty) -> bool {
        self.state.lock().engine.book_mut().modify_qty(id, new_qty)
    }
}

impl Drop for LiveWorld {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{NoiseTrader, NoiseTraderConfig};
    use exsim_core::types::Side;
    use exsim_engine::{RuleSet, RulesConfig};

    fn live_world() -> LiveWorld {
        let rules = RulesConfig::default();
        let live = LiveWorld::new(
            MatchingEngine::new(RuleSet::new(rules)),
            LiveConfig {
                dt_ns: 100_000,
                pace: None,
                history: 128,
            },
            42,
            0.01,
        );
        live.add_agent(Box::new(NoiseTrader::new(
            OwnerId::new(1),
            NoiseTraderConfig {
                mean_gap_ns: 500_000,
                ..NoiseTraderConfig::default()
            },
            rules,
        )));
        live
    }

    #[test]
    fn test_worker_runs_to_horizon_and_stops() {
        let mut live = live_world();
        live.start();
        while live.is_running() {
            std::thread::yield_now();
        }
        live.stop();

        let snap = live.snapshot();
        assert!(snap.ts.as_nanos() >= 10_000_000);
        assert!(!live.top_points(16).is_empty());
    }

    #[test]
    fn test_manual_trading_api() {
        let live = live_world();

        let ask = Order::limit(
            OrderId::new(0),
            Ts::ZERO,
            Side::Sell,
            Price::from_ticks(105),
            Qty::new(5),
            OwnerId::new(50),
        );
        let ack = live.submit_order(ask);
        assert_eq!(ack.status, OrderStatus::Accepted);
        assert_ne!(ack.id.value(), 0);

        let buy = Order::market(OrderId::new(0), Ts::ZERO, Side::Buy, Qty::new(2), OwnerId::new(51));
        let ack2 = live.submit_order(buy);
        assert_eq!(ack2.filled_qty.raw(), 2);
        assert_eq!(live.recent_trades(8).len(), 1);

        let depth = live.depth(4);
        assert_eq!(depth.asks.len(), 1);
        assert_eq!(depth.asks[0].qty.raw(), 3);

        assert!(live.modify_qty(ack.id, Qty::new(1)));
        assert!(live.cancel_order(ack.id));
        assert!(!live.cancel_order(ack.id));
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let live = live_world();
        let ack = live.submit_order(Order::limit(
            OrderId::new(0),
            Ts::ZERO,
            Side::Sell,
            Price::from_ticks(105),
            Qty::new(5),
            OwnerId::new(50),
        ));
        assert_eq!(ack.status, OrderStatus::Accepted);

        let json = serde_json::to_string(&live.snapshot()).unwrap();
        assert!(json.contains("\"best_ask\":105"));
    }
}
