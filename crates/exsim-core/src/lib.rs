//! # exsim-core
//!
//! Core types for the exsim market exchange simulator.
//!
//! This crate provides:
//! - Domain types: `Price`, `Qty`, `Ts`, `OrderId`, `TradeId`, `OwnerId`
//! - Order and trade structures with integer-only arithmetic
//! - Common error types for the simulator
//!
//! ## Example
//!
//! ```rust
//! use exsim_core::types::{Order, OrderId, OwnerId, Price, Qty, Side, Ts};
//!
//! let order = Order::limit(OrderId::new(1), Ts::from_nanos(10), Side::Buy,
//!                          Price::from_ticks(10_000), Qty::new(5), OwnerId::new(7));
//! assert!(order.is_valid());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{Error, Result};
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::constants::*;
    pub use crate::error::{Error, Result};
    pub use crate::types::*;
}
