//! Persistent run state: money, progress counters, shelf and shop order.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::catalog::{Catalog, CatalogItem};
use crate::constants::{
    FIRST_DAY, SHELF_SLOTS, STARTING_BALANCE, TOTAL_SALES_TO_WIN, UNIQUE_SALES_TO_WIN,
};
use crate::result::VictoryReason;
use crate::rng::{RandomSource, shuffle};
use crate::shelf::Shelf;

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub slot: usize,
    pub item_id: String,
    /// Amount credited to the balance.
    pub earned: u64,
}

/// Why a purchase did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseRejection {
    #[error("item is already owned")]
    AlreadyOwned,
    #[error("not enough money")]
    InsufficientFunds,
    #[error("no empty shelf slot")]
    NoSpace,
}

/// Broken state invariant, reported by [`GameState::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("owned set does not match shelf contents")]
    OwnedMismatch,
    #[error("shop order is missing catalog id {0}")]
    ShopOrderMissing(String),
    #[error("shop order lists {0} more than once")]
    ShopOrderDuplicate(String),
    #[error("shop order lists unknown id {0}")]
    ShopOrderUnknown(String),
    #[error("shelf holds unknown id {0}")]
    ShelfUnknown(String),
    #[error("day must be at least 1")]
    DayZero,
}

/// Everything that survives between sessions.
///
/// `owned` always mirrors the shelf; both are only mutated together through
/// [`GameState::sell`] and [`GameState::buy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub balance: u64,
    pub day: u32,
    pub sold_unique: BTreeSet<String>,
    pub sold_total: u32,
    shelf: Shelf,
    owned: BTreeSet<String>,
    shop_order: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            balance: STARTING_BALANCE,
            day: FIRST_DAY,
            sold_unique: BTreeSet::new(),
            sold_total: 0,
            shelf: Shelf::empty(),
            owned: BTreeSet::new(),
            shop_order: Vec::new(),
        }
    }
}

impl GameState {
    /// Start a new run: shuffle the shop order and stock the shelf with its
    /// first ten entries.
    #[must_use]
    pub fn fresh_run(catalog: &Catalog, rng: &mut dyn RandomSource) -> Self {
        let mut shop_order: Vec<String> = catalog.ids().map(str::to_string).collect();
        shuffle(&mut shop_order, rng);
        let shelf = Shelf::from_slots(shop_order.iter().take(SHELF_SLOTS).cloned().map(Some));
        Self::from_shelf(shop_order, shelf)
    }

    /// Build a state around an existing shelf. The owned set is derived from it.
    #[must_use]
    pub fn from_shelf(shop_order: Vec<String>, shelf: Shelf) -> Self {
        let owned = shelf.occupied().map(|(_, id)| id.to_string()).collect();
        Self {
            shelf,
            owned,
            shop_order,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    #[must_use]
    pub const fn owned(&self) -> &BTreeSet<String> {
        &self.owned
    }

    #[must_use]
    pub fn shop_order(&self) -> &[String] {
        &self.shop_order
    }

    #[must_use]
    pub fn owns(&self, item_id: &str) -> bool {
        self.owned.contains(item_id)
    }

    /// Sell the item in `slot` at the marked-up price.
    ///
    /// Returns `None` when the slot is empty, out of range or holds an id the
    /// catalog does not know.
    pub fn sell(&mut self, slot: usize, catalog: &Catalog) -> Option<Sale> {
        let earned = catalog.get(self.shelf.get(slot)?)?.sale_price();
        let item_id = self.shelf.take(slot)?;
        self.owned.remove(&item_id);
        self.balance = self.balance.saturating_add(earned);
        self.sold_total = self.sold_total.saturating_add(1);
        self.sold_unique.insert(item_id.clone());
        Some(Sale {
            slot,
            item_id,
            earned,
        })
    }

    /// Check whether `item` could be bought right now.
    ///
    /// # Errors
    ///
    /// Returns the first failing condition: ownership, then funds, then space.
    pub fn can_buy(&self, item: &CatalogItem) -> Result<(), PurchaseRejection> {
        if self.owns(&item.id) {
            return Err(PurchaseRejection::AlreadyOwned);
        }
        if self.balance < u64::from(item.price) {
            return Err(PurchaseRejection::InsufficientFunds);
        }
        if self.shelf.is_full() {
            return Err(PurchaseRejection::NoSpace);
        }
        Ok(())
    }

    /// Buy `item` into the lowest empty slot, returning the slot index.
    ///
    /// # Errors
    ///
    /// Leaves the state untouched and returns a [`PurchaseRejection`] when the
    /// purchase is not allowed.
    pub fn buy(&mut self, item: &CatalogItem) -> Result<usize, PurchaseRejection> {
        self.can_buy(item)?;
        let slot = self
            .shelf
            .place(item.id.clone())
            .ok_or(PurchaseRejection::NoSpace)?;
        self.balance -= u64::from(item.price);
        self.owned.insert(item.id.clone());
        Ok(slot)
    }

    /// Win condition, unique sales taking precedence.
    #[must_use]
    pub fn victory(&self) -> Option<VictoryReason> {
        if self.sold_unique.len() >= UNIQUE_SALES_TO_WIN {
            Some(VictoryReason::UniqueSales(self.sold_unique.len()))
        } else if self.sold_total >= TOTAL_SALES_TO_WIN {
            Some(VictoryReason::TotalSales(self.sold_total))
        } else {
            None
        }
    }

    /// Whether the run has anything worth confirming before a restart.
    #[must_use]
    pub fn has_progress(&self) -> bool {
        self.sold_total > 0 || !self.sold_unique.is_empty() || self.day > FIRST_DAY
    }

    pub(crate) fn advance_day(&mut self) {
        self.day = self.day.saturating_add(1);
    }

    /// Verify shelf/owned agreement and that the shop order is a permutation
    /// of the catalog.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self, catalog: &Catalog) -> Result<(), InvariantViolation> {
        if self.day < FIRST_DAY {
            return Err(InvariantViolation::DayZero);
        }
        let on_shelf: BTreeSet<String> = self
            .shelf
            .item_ids()
            .into_iter()
            .map(String::from)
            .collect();
        if on_shelf != self.owned || on_shelf.len() != self.shelf.count() {
            return Err(InvariantViolation::OwnedMismatch);
        }
        if let Some(unknown) = on_shelf.iter().find(|id| !catalog.contains(id)) {
            return Err(InvariantViolation::ShelfUnknown(unknown.clone()));
        }
        let mut seen = HashSet::with_capacity(self.shop_order.len());
        for id in &self.shop_order {
            if !catalog.contains(id) {
                return Err(InvariantViolation::ShopOrderUnknown(id.clone()));
            }
            if !seen.insert(id.as_str()) {
                return Err(InvariantViolation::ShopOrderDuplicate(id.clone()));
            }
        }
        if let Some(missing) = catalog.ids().find(|id| !seen.contains(id)) {
            return Err(InvariantViolation::ShopOrderMissing(missing.to_string()));
        }
        Ok(())
    }
}
