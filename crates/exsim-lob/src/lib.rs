//! # exsim-lob
//!
//! Price-time priority limit order book.
//!
//! This crate provides:
//! - `OrderBook` with O(log P) best-price access and O(1) by-id cancel/modify
//! - FIFO queues per price level with cached totals
//! - Aggregated depth snapshots for market data views
//!
//! ## Example
//!
//! ```rust
//! use exsim_core::types::{Order, OrderId, OwnerId, Price, Qty, Side, Ts};
//! use exsim_lob::OrderBook;
//!
//! let mut book = OrderBook::new();
//! let ask = Order::limit(OrderId::new(1), Ts::from_nanos(10), Side::Sell,
//!                        Price::from_ticks(105), Qty::new(5), OwnerId::new(1));
//! assert!(book.add_resting_limit(ask));
//! assert_eq!(book.best_ask(), Some(Price::from_ticks(105)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::missing_panics_doc
)]

pub mod book;

pub use book::{LevelSummary, OrderBook};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::book::{LevelSummary, OrderBook};
}
