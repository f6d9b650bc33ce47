//! End-of-run summary shown on the victory screen.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::GameState;
use crate::variant::Variant;

/// Which win condition ended the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum VictoryReason {
    /// Enough distinct items sold.
    UniqueSales(usize),
    /// Enough sales overall.
    TotalSales(u32),
}

impl fmt::Display for VictoryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UniqueSales(count) => write!(f, "unique sales ({count})"),
            Self::TotalSales(count) => write!(f, "total sales ({count})"),
        }
    }
}

/// Snapshot of the final numbers of a won run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub reason: VictoryReason,
    pub balance: u64,
    pub day: u32,
    pub sold_unique: usize,
    pub sold_total: u32,
}

impl RunSummary {
    #[must_use]
    pub fn new(reason: VictoryReason, state: &GameState) -> Self {
        Self {
            reason,
            balance: state.balance,
            day: state.day,
            sold_unique: state.sold_unique.len(),
            sold_total: state.sold_total,
        }
    }

    /// Victory message for the given skin.
    #[must_use]
    pub fn headline(&self, variant: Variant) -> String {
        let noun = variant.item_noun();
        let lead = match self.reason {
            VictoryReason::UniqueSales(count) => format!("You sold {count} different {noun}s!"),
            VictoryReason::TotalSales(count) => format!("You sold {count} {noun}s!"),
        };
        format!("{lead} Balance: {}. Days: {}.", self.balance, self.day)
    }
}
