//! # exsim-engine
//!
//! Deterministic matching engine with admission rules, self-trade
//! prevention, price-band volatility auctions and session phases.
//!
//! This crate provides:
//! - `MatchingEngine`: the single `process(order)` entry point
//! - `RuleSet`: admission filter, phase state and reference price
//! - `SessionController`: timed TAL / closing-auction transitions
//! - Ledger: per-owner accounts and trade attribution
//!
//! ## Example
//!
//! ```rust
//! use exsim_core::types::{Order, OrderId, OwnerId, Price, Qty, Side, Ts};
//! use exsim_engine::{MatchingEngine, OrderStatus};
//!
//! let mut engine = MatchingEngine::default();
//! let ask = Order::limit(OrderId::new(1), Ts::from_nanos(10), Side::Sell,
//!                        Price::from_ticks(105), Qty::new(5), OwnerId::new(1));
//! assert!(engine.book_mut().add_resting_limit(ask));
//!
//! let buy = Order::market(OrderId::new(2), Ts::from_nanos(20), Side::Buy,
//!                         Qty::new(3), OwnerId::new(2));
//! let result = engine.process(buy);
//! assert_eq!(result.status, OrderStatus::Accepted);
//! assert_eq!(result.trades.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::missing_panics_doc
)]

pub mod engine;
pub mod ledger;
pub mod rules;
pub mod session;

pub use engine::{MatchResult, MatchingEngine, OrderStatus};
pub use ledger::{
    apply_trades_to_accounts, make_account_snapshots, Account, AccountSnapshot, OrderMeta,
};
pub use rules::{MarketPhase, RejectReason, RuleDecision, RuleSet, RulesConfig, StpMode};
pub use session::{SessionController, SessionSchedule};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::{MatchResult, MatchingEngine, OrderStatus};
    pub use crate::ledger::{Account, AccountSnapshot, OrderMeta};
    pub use crate::rules::{MarketPhase, RejectReason, RuleSet, RulesConfig, StpMode};
    pub use crate::session::{SessionController, SessionSchedule};
}
