//! Evening shop view: unowned catalog items in shop order.
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogItem, ShopFilter};
use crate::state::GameState;

/// Whether a listed item can be bought right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Purchasable,
    InsufficientFunds,
    NoSpace,
}

impl ListingStatus {
    /// Funds are checked before shelf space.
    #[must_use]
    pub fn for_item(state: &GameState, item: &CatalogItem) -> Self {
        if state.balance < u64::from(item.price) {
            Self::InsufficientFunds
        } else if state.shelf().is_full() {
            Self::NoSpace
        } else {
            Self::Purchasable
        }
    }

    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        matches!(self, Self::Purchasable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopListing<'a> {
    pub item: &'a CatalogItem,
    pub status: ListingStatus,
}

/// Items the player does not own, in the run's shop order, narrowed by `filter`.
#[must_use]
pub fn shop_listing<'a>(
    state: &GameState,
    catalog: &'a Catalog,
    filter: &ShopFilter,
) -> Vec<ShopListing<'a>> {
    state
        .shop_order()
        .iter()
        .filter(|id| !state.owns(id))
        .filter_map(|id| catalog.get(id))
        .filter(|item| filter.matches(item))
        .map(|item| ShopListing {
            item,
            status: ListingStatus::for_item(state, item),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PriceTier;
    use crate::shelf::Shelf;
    use crate::test_support::catalog_of;

    fn state_with(order: &[&str], shelf: &[&str]) -> GameState {
        GameState::from_shelf(
            order.iter().map(|id| (*id).to_string()).collect(),
            Shelf::from_slots(shelf.iter().map(|id| Some((*id).to_string()))),
        )
    }

    #[test]
    fn listing_follows_shop_order_and_hides_owned() {
        let catalog = catalog_of(&[("a", 100), ("b", 300), ("c", 500)]);
        let state = state_with(&["c", "a", "b"], &["a"]);
        let ids: Vec<&str> = shop_listing(&state, &catalog, &ShopFilter::any())
            .iter()
            .map(|listing| listing.item.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn tier_filter_narrows_listing() {
        let catalog = catalog_of(&[("a", 100), ("b", 300), ("c", 500)]);
        let state = state_with(&["a", "b", "c"], &[]);
        let filter = ShopFilter::any().with_tier(PriceTier::Medium);
        let listing = shop_listing(&state, &catalog, &filter);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].item.id, "b");
    }

    #[test]
    fn funds_are_reported_before_space() {
        let ids: Vec<String> = (0..11).map(|i| format!("i{i}")).collect();
        let items: Vec<(String, u32)> = ids.iter().map(|id| (id.clone(), 100)).collect();
        let catalog = catalog_of(&items);
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut state = state_with(&refs, &refs[..10]);
        let extra = catalog.get("i10").unwrap();
        assert_eq!(
            ListingStatus::for_item(&state, extra),
            ListingStatus::InsufficientFunds
        );
        state.balance = 100;
        assert_eq!(ListingStatus::for_item(&state, extra), ListingStatus::NoSpace);
    }
}
