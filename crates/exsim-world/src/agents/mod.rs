//! Agent contract and built-in agents.
//!
//! Agents are pure functions of `(seed, sequence of views)`: no wall
//! clock, no global state. The driver invokes them in insertion order
//! each tick and processes their actions in emission order.

mod market_maker;
mod noise;

pub use market_maker::{MarketMaker, MarketMakerParams};
pub use noise::{NoiseTrader, NoiseTraderConfig};

use exsim_core::types::{Order, OrderId, OwnerId, Price, Qty, Ts};
use serde::{Deserialize, Serialize};

/// What an agent sees of the market each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarketView {
    /// Current virtual time
    pub ts: Ts,
    /// Best bid, if any
    pub best_bid: Option<Price>,
    /// Best ask, if any
    pub best_ask: Option<Price>,
    /// Midpoint when both sides exist (integer truncation)
    pub mid: Option<Price>,
    /// Last trade price, if any
    pub last_trade: Option<Price>,
}

/// An agent's own account, as the driver knows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentState {
    /// The agent's owner id
    pub owner: OwnerId,
    /// Cash in tick units
    pub cash_ticks: i64,
    /// Net inventory
    pub position: i64,
}

/// One agent instruction to the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Submit a new order
    Submit(Order),
    /// Cancel a resting order by id
    Cancel(OrderId),
    /// Reduce a resting order's quantity
    ModifyQty {
        /// Target order
        id: OrderId,
        /// New (smaller) quantity
        new_qty: Qty,
    },
}

/// A market participant driven by the simulation clock.
///
/// `Send` so the live wrapper can move agents onto its worker thread.
pub trait Agent: Send {
    /// The participant this agent trades as
    fn owner(&self) -> OwnerId;

    /// Reset the agent's randomness; called once before a run
    fn seed(&mut self, seed: u64);

    /// Produce actions for this tick
    fn step(&mut self, ts: Ts, view: &MarketView, state: &AgentState, out: &mut Vec<Action>);
}

/// Midpoint of a bid/ask pair (integer truncation), when both exist
#[must_use]
pub fn midpoint(best_bid: Option<Price>, best_ask: Option<Price>) -> Option<Price> {
    match (best_bid, best_ask) {
        (Some(bid), Some(ask)) => Some(Price::from_ticks((bid.raw() + ask.raw()) / 2)),
        _ => None,
    }
}

/// Order ids scoped per owner so concurrent agents never collide
#[must_use]
pub fn scoped_order_id(owner: OwnerId, seq: u64) -> OrderId {
    OrderId::new((owner.value() << 40) | seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        let bid = Some(Price::from_ticks(100));
        let ask = Some(Price::from_ticks(105));
        assert_eq!(midpoint(bid, ask), Some(Price::from_ticks(102)));
        assert_eq!(midpoint(bid, None), None);
        assert_eq!(midpoint(None, ask), None);
    }

    #[test]
    fn test_scoped_order_ids_do_not_collide() {
        let a = scoped_order_id(OwnerId::new(1), 5);
        let b = scoped_order_id(OwnerId::new(2), 5);
        assert_ne!(a, b);
        assert_ne!(scoped_order_id(OwnerId::new(1), 5), scoped_order_id(OwnerId::new(1), 6));
    }
}
