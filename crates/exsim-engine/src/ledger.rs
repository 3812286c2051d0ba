//! Per-owner accounts, trade attribution and mark-to-market snapshots.

use std::collections::HashMap;

use exsim_core::types::{OrderId, OwnerId, Price, Qty, Side, Trade, Ts};
use serde::{Deserialize, Serialize};

/// Owner and side of an order, captured at submission time.
///
/// Attribution happens after the resting order may already have been
/// destroyed, so this is keyed by order id in a separate map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMeta {
    /// Owning participant
    pub owner: OwnerId,
    /// Side the order was on
    pub side: Side,
}

/// Cash and inventory account of one participant.
///
/// Cash is measured in ticks times quantity; dollars are not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    /// Owning participant
    pub owner: OwnerId,
    /// Cash in tick units
    pub cash_ticks: i64,
    /// Net inventory (positive = long)
    pub position: i64,
    /// Total quantity traded
    pub traded_qty: i64,
    /// Total traded notional in tick units
    pub notional_ticks: i64,
}

impl Account {
    /// Apply one fill to the account.
    pub fn apply_fill(&mut self, side: Side, price: Price, qty: Qty) {
        let q = qty.raw();
        let notional = price.raw() * q;

        self.traded_qty += q;
        self.notional_ticks += notional;

        match side {
            Side::Buy => {
                self.position += q;
                self.cash_ticks -= notional;
            }
            Side::Sell => {
                self.position -= q;
                self.cash_ticks += notional;
            }
        }
    }

    /// Mark-to-market value: cash plus inventory at mid, or plain cash
    /// when no mid exists.
    #[must_use]
    pub fn mtm_ticks(&self, mid: Option<Price>) -> i64 {
        match mid {
            Some(m) => self.cash_ticks + m.raw() * self.position,
            None => self.cash_ticks,
        }
    }
}

/// Point-in-time view of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Snapshot timestamp
    pub ts: Ts,
    /// Owning participant
    pub owner: OwnerId,
    /// Cash in tick units
    pub cash_ticks: i64,
    /// Net inventory
    pub position: i64,
    /// Mark-to-market value at the snapshot mid
    pub mtm_ticks: i64,
}

/// Fold trades into per-owner accounts.
///
/// Both sides of every trade are attributed through `meta`; a trade whose
/// maker or taker meta is missing is skipped, which keeps the fold robust
/// against racing cancels. Accounts are created lazily on first fill.
pub fn apply_trades_to_accounts(
    _ts: Ts,
    trades: &[Trade],
    meta: &HashMap<OrderId, OrderMeta>,
    accounts: &mut HashMap<OwnerId, Account>,
    _mid_for_mtm: Option<Price>,
) {
    for trade in trades {
        let (Some(maker), Some(taker)) = (
            meta.get(&trade.maker_order_id),
            meta.get(&trade.taker_order_id),
        ) else {
            continue;
        };

        let maker_account = accounts.entry(maker.owner).or_default();
        maker_account.owner = maker.owner;
        maker_account.apply_fill(maker.side, trade.price, trade.qty);

        let taker_account = accounts.entry(taker.owner).or_default();
        taker_account.owner = taker.owner;
        taker_account.apply_fill(taker.side, trade.price, trade.qty);
    }
}

/// Snapshot every account at `ts`, in ascending owner order.
#[must_use]
pub fn make_account_snapshots(
    ts: Ts,
    accounts: &HashMap<OwnerId, Account>,
    mid: Option<Price>,
) -> Vec<AccountSnapshot> {
    let mut owners: Vec<OwnerId> = accounts.keys().copied().collect();
    owners.sort_unstable();

    owners
        .into_iter()
        .map(|owner| {
            let account = &accounts[&owner];
            AccountSnapshot {
                ts,
                owner,
                cash_ticks: account.cash_ticks,
                position: account.position,
                mtm_ticks: account.mtm_ticks(mid),
            }
        })
        .collect()
}
