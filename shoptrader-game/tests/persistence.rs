use serde_json::json;
use shoptrader_game::{
    Action, BootOutcome, Catalog, CatalogItem, CloudAccess, KeyValueStore, MemoryStore,
    MockPlatform, Platform, Request, RequestPool, SaveDecode, ShopController, Variant, decode,
    restore, snapshot,
};

fn item(id: &str, price: u32) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        title: id.to_string(),
        creator: "Anon".to_string(),
        price,
        genres: ["classic".to_string()].into_iter().collect(),
        year: None,
        cover_url: None,
    }
}

fn catalog(count: usize) -> Catalog {
    Catalog::new((0..count).map(|i| item(&format!("item-{i}"), 100)).collect()).unwrap()
}

fn pool(catalog: &Catalog) -> RequestPool {
    let requests = catalog
        .ids()
        .map(|id| Request {
            text: format!("Do you have {id}?"),
            linked_item_ids: [id.to_string()].into_iter().collect(),
        })
        .collect();
    RequestPool::new(requests, catalog).unwrap()
}

fn controller(
    variant: Variant,
    platform: MockPlatform<MemoryStore>,
    local: MemoryStore,
) -> ShopController<MockPlatform<MemoryStore>, MemoryStore> {
    let catalog = catalog(16);
    let requests = pool(&catalog);
    ShopController::new(variant, catalog, requests, platform, local, 11)
}

fn play_days(controller: &mut ShopController<MockPlatform<MemoryStore>, MemoryStore>, days: u32) {
    for _ in 0..days {
        controller.dispatch(Action::StartDay);
        while let Some(customer) = controller.session().current_customer() {
            let slot = controller
                .state()
                .shelf()
                .occupied()
                .find(|(_, id)| customer.accepts(id))
                .map(|(slot, _)| slot);
            match slot {
                Some(slot) => {
                    controller.dispatch(Action::OfferItem { slot });
                    controller.complete_advance();
                }
                None => {
                    controller.dispatch(Action::SkipCustomer);
                }
            }
        }
        let cheapest = controller
            .shop_listing(&Default::default())
            .first()
            .map(|listing| listing.item.id.clone());
        if let Some(item_id) = cheapest {
            controller.dispatch(Action::BuyItem { item_id });
        }
        controller.finish_shop();
    }
}

#[test]
fn progress_survives_a_reload() {
    let local = MemoryStore::new();
    let cloud = MemoryStore::new();
    let mut first = controller(
        Variant::BookTrader,
        MockPlatform::new(cloud.clone()),
        local.clone(),
    );
    first.boot();
    play_days(&mut first, 4);
    assert_eq!(first.state().day, 5);

    let mut second = controller(Variant::BookTrader, MockPlatform::new(cloud), local);
    assert_eq!(second.boot(), BootOutcome::Restored);
    assert_eq!(second.state(), first.state());
}

#[test]
fn legacy_save_starts_a_fresh_run() {
    let local = MemoryStore::new();
    local
        .set(
            Variant::BookTrader.storage_key(),
            &json!({"balance": 900, "day": 12, "ownedFilms": ["alien"], "shelf": ["alien"]})
                .to_string(),
        )
        .unwrap();
    let platform = MockPlatform::in_memory().with_cloud(CloudAccess::none());
    let mut controller = controller(Variant::BookTrader, platform, local);
    assert_eq!(controller.boot(), BootOutcome::DiscardedSave);
    assert_eq!(controller.state().day, 1);
    assert_eq!(controller.state().balance, 0);
    assert!(controller.state().shelf().is_full());
}

#[test]
fn game_trader_treats_book_saves_as_legacy() {
    let platform = MockPlatform::in_memory();
    platform
        .write_player_data(
            Variant::GameTrader.storage_key(),
            &json!({"balance": 300, "ownedBooks": ["dune"], "shopBookOrder": ["dune"]}),
        )
        .unwrap();
    let local = MemoryStore::new();
    let mut controller = controller(Variant::GameTrader, platform, local);
    assert_eq!(controller.boot(), BootOutcome::DiscardedSave);
    assert!(!controller.has_progress());
}

#[test]
fn variants_do_not_read_each_others_saves() {
    let local = MemoryStore::new();
    let cloud = MemoryStore::new();
    let mut books = controller(
        Variant::BookTrader,
        MockPlatform::new(cloud.clone()),
        local.clone(),
    );
    books.boot();
    play_days(&mut books, 2);

    let mut games = controller(Variant::GameTrader, MockPlatform::new(cloud), local);
    assert_eq!(games.boot(), BootOutcome::NewRun);
    assert_eq!(games.state().day, 1);
}

#[test]
fn unreadable_cloud_save_falls_back_to_local() {
    let local = MemoryStore::new();
    let mut first = controller(
        Variant::BookTrader,
        MockPlatform::in_memory().with_cloud(CloudAccess::none()),
        local.clone(),
    );
    first.boot();
    play_days(&mut first, 3);

    let cloud = MemoryStore::new();
    cloud
        .set(Variant::BookTrader.storage_key(), "{\"ownedIds\": \"oops\"}")
        .unwrap();
    let mut second = controller(Variant::BookTrader, MockPlatform::new(cloud), local);
    assert_eq!(second.boot(), BootOutcome::Restored);
    assert_eq!(second.state().day, 4);
}

#[test]
fn failing_storage_never_stops_play() {
    let local = MemoryStore::new();
    local.set_unavailable(true);
    let cloud = MemoryStore::with_quota(8);
    let mut controller = controller(Variant::GameTrader, MockPlatform::new(cloud), local);
    assert_eq!(controller.boot(), BootOutcome::NewRun);
    play_days(&mut controller, 3);
    assert_eq!(controller.state().day, 4);
}

#[test]
fn restore_against_a_shrunken_catalog_drops_missing_items() {
    let big = catalog(16);
    let mut rng = shoptrader_game::RngBundle::from_user_seed(3);
    let state = shoptrader_game::GameState::fresh_run(&big, rng.shop());
    let stored = snapshot(&state).to_value();

    let small = catalog(8);
    let SaveDecode::Found(saved) = decode(&stored, Variant::BookTrader) else {
        panic!("expected a current save");
    };
    let restored = restore(&saved, &small);
    restored.check_invariants(&small).unwrap();
    assert_eq!(restored.shop_order().len(), 8);
    assert!(restored.shelf().count() <= 8);
    for id in restored.owned() {
        assert!(small.contains(id));
    }
}
