use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One bettor's position on one tribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub amount: u64,
    /// Cumulative daily yield already credited for this stake.
    pub yield_paid: u64,
}

/// Stakes for the current game: bettor id -> tribute id -> stake.
///
/// `total_pot` is the sum of every amount ever staked in the game, including stakes on tributes
/// that have since been eliminated. It only ever grows until the ledger is cleared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub stakes: BTreeMap<String, BTreeMap<String, Stake>>,
    pub total_pot: u64,
}

impl Ledger {
    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    pub fn stake(&self, bettor: &str, tribute: &str) -> Option<&Stake> {
        self.stakes.get(bettor).and_then(|by_tribute| by_tribute.get(tribute))
    }

    /// Total amount staked on a single tribute across all bettors.
    pub fn staked_on(&self, tribute: &str) -> u64 {
        self.stakes
            .values()
            .filter_map(|by_tribute| by_tribute.get(tribute))
            .fold(0u64, |acc, stake| acc.saturating_add(stake.amount))
    }

    pub fn clear(&mut self) {
        self.stakes.clear();
        self.total_pot = 0;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayoutReason {
    DailyYield { tribute: String },
    WinningStake { tribute: String },
    WinnerBonus,
    StopRefund,
}

/// A credit the service must push to the balance service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub recipient: String,
    pub amount: u64,
    pub reason: PayoutReason,
}
