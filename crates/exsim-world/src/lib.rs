//! # exsim-world
//!
//! Discrete-event simulation driver for the exsim matching engine.
//!
//! This crate provides:
//! - The `World` tick loop: virtual time, agents, accounts, outputs
//! - Built-in agents: `NoiseTrader` and `MarketMaker`
//! - `LiveWorld`: a mutex-guarded wrapper with a ticking worker thread
//! - CSV writers for trades and top-of-book series
//!
//! The simulation result is a pure function of `(seed, horizon, dt_ns,
//! agent set)`: agents receive deterministic per-agent seeds and the
//! engine never reads the wall clock.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_panics_doc
)]

pub mod agents;
pub mod live;
pub mod output;
pub mod world;

pub use agents::{Action, Agent, AgentState, MarketMaker, MarketView, NoiseTrader};
pub use live::{BookDepth, LiveConfig, LiveWorld, OrderAck, Snapshot};
pub use world::{BookTop, World, WorldConfig, WorldResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agents::{Action, Agent, AgentState, MarketMaker, MarketView, NoiseTrader};
    pub use crate::live::{LiveConfig, LiveWorld};
    pub use crate::world::{BookTop, World, WorldConfig, WorldResult};
}
