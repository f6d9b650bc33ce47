use std::collections::BTreeSet;

use shoptrader_game::constants::{SHELF_SLOTS, UNIQUE_SALES_TO_WIN};
use shoptrader_game::{Catalog, GameState, PriceTier, RequestPool, RngBundle, Variant};

fn assets(variant: Variant) -> (&'static str, &'static str) {
    match variant {
        Variant::BookTrader => (
            include_str!("../../shoptrader-web/static/assets/data/book_trader/catalog.json"),
            include_str!("../../shoptrader-web/static/assets/data/book_trader/requests.json"),
        ),
        Variant::GameTrader => (
            include_str!("../../shoptrader-web/static/assets/data/game_trader/catalog.json"),
            include_str!("../../shoptrader-web/static/assets/data/game_trader/requests.json"),
        ),
    }
}

fn load(variant: Variant) -> (Catalog, RequestPool) {
    let (catalog_json, requests_json) = assets(variant);
    let catalog = Catalog::from_json(catalog_json).unwrap();
    let requests = RequestPool::from_json(requests_json, &catalog).unwrap();
    (catalog, requests)
}

#[test]
fn bundled_catalogs_are_valid_and_large_enough() {
    for variant in Variant::ALL {
        let (catalog, requests) = load(variant);
        assert!(catalog.len() > SHELF_SLOTS, "{variant}: catalog too small");
        assert!(
            catalog.len() >= UNIQUE_SALES_TO_WIN,
            "{variant}: unique win must be reachable"
        );
        for item in catalog.items() {
            assert!(!item.title.is_empty(), "{variant}: {} has no title", item.id);
            assert!(!item.genres.is_empty(), "{variant}: {} has no genres", item.id);
            assert!(item.sale_price() >= u64::from(item.price));
        }
        assert!(requests.len() >= catalog.len());
    }
}

#[test]
fn every_item_can_be_requested() {
    for variant in Variant::ALL {
        let (catalog, requests) = load(variant);
        for id in catalog.ids() {
            assert!(
                requests.linked_to(id).next().is_some(),
                "{variant}: nobody ever asks for {id}"
            );
        }
        let texts: BTreeSet<&str> = requests
            .requests()
            .iter()
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(texts.len(), requests.len(), "{variant}: duplicate request text");
    }
}

#[test]
fn every_price_tier_is_stocked() {
    for variant in Variant::ALL {
        let (catalog, _) = load(variant);
        let tiers: BTreeSet<&str> = catalog.items().iter().map(|i| i.tier().as_str()).collect();
        for tier in [PriceTier::Cheap, PriceTier::Medium, PriceTier::Expensive] {
            assert!(tiers.contains(tier.as_str()), "{variant}: no {tier} items");
        }
        assert!(!catalog.genres().is_empty());
    }
}

#[test]
fn fresh_run_on_bundled_data_fills_the_shelf() {
    for variant in Variant::ALL {
        let (catalog, _) = load(variant);
        let mut rng = RngBundle::from_user_seed(0x5EED);
        let state = GameState::fresh_run(&catalog, rng.shop());
        assert!(state.shelf().is_full());
        assert_eq!(state.owned().len(), SHELF_SLOTS);
        assert_eq!(state.shop_order().len(), catalog.len());
        state.check_invariants(&catalog).unwrap();
    }
}
