use std::fmt;

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use shoptrader_game::{Customer, GameState, ShopListing};

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Shelf slot to offer the customer at the counter, or `None` to skip them.
    fn pick_offer(&mut self, state: &GameState, customer: &Customer) -> Option<usize>;

    /// Item to buy next in the evening shop, or `None` to close it.
    fn pick_purchase(&mut self, state: &GameState, listing: &[ShopListing<'_>]) -> Option<String>;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Serve matching items, restock cheapest never-sold items first.
    Greedy,
    /// Offer random shelf items and make random affordable purchases.
    Random,
    /// Skip every customer and never buy.
    Idle,
}

impl Strategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Greedy => "Greedy",
            Self::Random => "Random",
            Self::Idle => "Idle",
        }
    }

    /// Whether a run with this strategy must reach victory within the day cap.
    #[must_use]
    pub const fn expects_victory(self) -> bool {
        matches!(self, Self::Greedy)
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Idle => Box::new(IdlePolicy),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct GreedyPolicy;
struct IdlePolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn pick_offer(&mut self, state: &GameState, customer: &Customer) -> Option<usize> {
        state
            .shelf()
            .occupied()
            .find(|(_, id)| customer.accepts(id))
            .map(|(slot, _)| slot)
    }

    fn pick_purchase(&mut self, state: &GameState, listing: &[ShopListing<'_>]) -> Option<String> {
        listing
            .iter()
            .filter(|entry| entry.status.is_purchasable())
            .min_by_key(|entry| (state.sold_unique.contains(&entry.item.id), entry.item.price))
            .map(|entry| entry.item.id.clone())
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_offer(&mut self, state: &GameState, _customer: &Customer) -> Option<usize> {
        // One customer in five is turned away unserved.
        if self.rng.gen_ratio(1, 5) {
            return None;
        }
        let slots: Vec<usize> = state.shelf().occupied().map(|(slot, _)| slot).collect();
        if slots.is_empty() {
            return None;
        }
        Some(slots[self.rng.gen_range(0..slots.len())])
    }

    fn pick_purchase(&mut self, _state: &GameState, listing: &[ShopListing<'_>]) -> Option<String> {
        let affordable: Vec<&ShopListing<'_>> = listing
            .iter()
            .filter(|entry| entry.status.is_purchasable())
            .collect();
        if affordable.is_empty() || self.rng.gen_bool(0.25) {
            return None;
        }
        let pick = affordable[self.rng.gen_range(0..affordable.len())];
        Some(pick.item.id.clone())
    }
}

impl PlayerPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn pick_offer(&mut self, _state: &GameState, _customer: &Customer) -> Option<usize> {
        None
    }

    fn pick_purchase(
        &mut self,
        _state: &GameState,
        _listing: &[ShopListing<'_>],
    ) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoptrader_game::{Catalog, CatalogItem, RngBundle, ShopFilter, shop_listing};

    fn catalog() -> Catalog {
        Catalog::new(
            (0..14)
                .map(|i| CatalogItem {
                    id: format!("i{i}"),
                    title: format!("Item {i}"),
                    creator: String::new(),
                    price: 100 + i * 10,
                    genres: ["classic".to_string()].into_iter().collect(),
                    year: None,
                    cover_url: None,
                })
                .collect(),
        )
        .unwrap()
    }

    fn customer_for(id: &str) -> Customer {
        Customer {
            request_index: 0,
            text: format!("Do you have {id}?"),
            linked_item_ids: [id.to_string()].into_iter().collect(),
            avatar: "🙂".to_string(),
        }
    }

    #[test]
    fn greedy_offers_the_matching_slot() {
        let catalog = catalog();
        let mut rng = RngBundle::from_user_seed(4);
        let state = GameState::fresh_run(&catalog, rng.shop());
        let (slot, id) = state.shelf().occupied().nth(3).unwrap();
        let mut policy = Strategy::Greedy.create_policy(0);
        assert_eq!(policy.pick_offer(&state, &customer_for(id)), Some(slot));
        assert_eq!(policy.pick_offer(&state, &customer_for("missing")), None);
    }

    #[test]
    fn greedy_buys_cheapest_unsold_first() {
        let catalog = catalog();
        let mut rng = RngBundle::from_user_seed(4);
        let mut state = GameState::fresh_run(&catalog, rng.shop());
        let sold = state.sell(0, &catalog).unwrap();
        state.balance = 10_000;
        let listing = shop_listing(&state, &catalog, &ShopFilter::any());
        let mut policy = Strategy::Greedy.create_policy(0);
        let pick = policy.pick_purchase(&state, &listing).unwrap();
        assert_ne!(pick, sold.item_id);
        let cheapest_unsold = listing
            .iter()
            .filter(|l| l.item.id != sold.item_id)
            .map(|l| l.item.price)
            .min()
            .unwrap();
        assert_eq!(catalog.get(&pick).unwrap().price, cheapest_unsold);
    }

    #[test]
    fn idle_never_acts() {
        let catalog = catalog();
        let mut rng = RngBundle::from_user_seed(1);
        let state = GameState::fresh_run(&catalog, rng.shop());
        let id = state.shelf().get(0).unwrap().to_string();
        let mut policy = Strategy::Idle.create_policy(0);
        assert_eq!(policy.pick_offer(&state, &customer_for(&id)), None);
        let listing = shop_listing(&state, &catalog, &ShopFilter::any());
        assert_eq!(policy.pick_purchase(&state, &listing), None);
    }

    #[test]
    fn random_policy_is_reproducible() {
        let catalog = catalog();
        let mut rng = RngBundle::from_user_seed(9);
        let state = GameState::fresh_run(&catalog, rng.shop());
        let customer = customer_for("i0");
        let picks = |seed| {
            let mut policy = Strategy::Random.create_policy(seed);
            (0..20)
                .map(|_| policy.pick_offer(&state, &customer))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(3), picks(3));
        assert!(picks(3).iter().flatten().all(|slot| state.shelf().get(*slot).is_some()));
    }
}
