//! Timed session transitions: trading-at-last and the closing auction.

use exsim_core::types::{Trade, Ts};
use serde::{Deserialize, Serialize};

use crate::engine::MatchingEngine;

/// When the late-session phases begin and end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSchedule {
    /// Trading-at-last start
    pub tal_start_ts: Ts,
    /// Trading-at-last end
    pub tal_end_ts: Ts,
    /// Closing auction start
    pub closing_auction_start_ts: Ts,
    /// Closing auction end
    pub closing_auction_end_ts: Ts,
}

/// External time driver for session phases.
///
/// Fires `start_trading_at_last` and `start_closing_auction` exactly once
/// each and flushes the engine on every call. The engine alone owns the
/// phase transitions.
#[derive(Debug, Clone)]
pub struct SessionController {
    schedule: SessionSchedule,
    tal_started: bool,
    close_started: bool,
}

impl SessionController {
    /// Create a controller for the given schedule
    #[must_use]
    pub fn new(schedule: SessionSchedule) -> Self {
        Self {
            schedule,
            tal_started: false,
            close_started: false,
        }
    }

    /// Advance session state to `ts`, returning trades produced by any
    /// transition the flush finalized.
    pub fn on_time(&mut self, engine: &mut MatchingEngine, ts: Ts) -> Vec<Trade> {
        let s = &self.schedule;

        if !self.tal_started && ts >= s.tal_start_ts && ts < s.tal_end_ts {
            engine.start_trading_at_last(s.tal_end_ts);
            self.tal_started = true;
        }

        if !self.close_started
            && ts >= s.closing_auction_start_ts
            && ts < s.closing_auction_end_ts
        {
            engine.start_closing_auction(s.closing_auction_end_ts);
            self.close_started = true;
        }

        engine.flush(ts)
    }

    /// The configured schedule
    #[must_use]
    pub fn schedule(&self) -> &SessionSchedule {
        &self.schedule
    }
}
