use futures::executor::block_on;
use shoptrader_game::{
    Action, BootOutcome, KeyValueStore, MemoryStore, Phase, Platform, PlatformCall, ShopEngine,
    ShopFilter, Variant,
};
use shoptrader_web::view_model::{UiState, ViewModel};
use shoptrader_web::{StaticDataLoader, WebPlatform};

fn engine(store: &MemoryStore) -> ShopEngine<StaticDataLoader, MemoryStore> {
    ShopEngine::new(StaticDataLoader, store.clone())
}

fn platform(store: &MemoryStore, variant: Variant) -> WebPlatform<MemoryStore> {
    block_on(WebPlatform::connect(store.clone(), &[variant.storage_key()]))
}

#[test]
fn offline_shell_plays_a_day_and_reloads() {
    let store = MemoryStore::new();
    let variant = Variant::GameTrader;
    let platform = platform(&store, variant);
    let mut controller = engine(&store)
        .create_controller(variant, platform.clone(), 5)
        .unwrap();
    assert_eq!(controller.boot(), BootOutcome::NewRun);
    controller.signal_ready();

    controller.dispatch(Action::StartDay);
    while controller.session().current_customer().is_some() {
        controller.dispatch(Action::SkipCustomer);
    }
    assert_eq!(controller.session().phase(), &Phase::EveningShop);
    controller.finish_shop();
    assert_eq!(controller.state().day, 2);

    let mock = platform.mock().unwrap();
    assert_eq!(mock.count(&PlatformCall::Ready), 1);
    assert_eq!(mock.count(&PlatformCall::ShowInterstitial), 1);
    assert!(store.get(variant.storage_key()).unwrap().is_some());

    let mut reloaded = engine(&store)
        .create_controller(variant, self::platform(&store, variant), 6)
        .unwrap();
    assert_eq!(reloaded.boot(), BootOutcome::Restored);
    assert_eq!(reloaded.state(), controller.state());
}

#[test]
fn restart_wipes_offline_progress() {
    let store = MemoryStore::new();
    let variant = Variant::BookTrader;
    let mut controller = engine(&store)
        .create_controller(variant, platform(&store, variant), 8)
        .unwrap();
    controller.boot();
    controller.dispatch(Action::StartDay);
    controller.dispatch(Action::EndDay);
    controller.finish_shop();
    assert!(controller.has_progress());

    controller.dispatch(Action::Restart);
    assert!(!controller.has_progress());
    let cloud = controller.platform().read_player_data(variant.storage_key()).unwrap();
    assert_eq!(cloud, Some(serde_json::json!({})));
    assert!(engine(&store).load_local_state(variant).unwrap().is_none());
}

#[test]
fn view_tracks_a_purchase() {
    let store = MemoryStore::new();
    let variant = Variant::BookTrader;
    let mut controller = engine(&store)
        .create_controller(variant, platform(&store, variant), 21)
        .unwrap();
    controller.boot();
    controller.dispatch(Action::StartDay);
    let mut served = 0;
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
                served += 1;
            }
            None => {
                controller.dispatch(Action::SkipCustomer);
            }
        }
    }
    assert!(served > 0, "shelf items are always requested");

    let view = ViewModel::build(&controller, &UiState::default());
    let shop = view.shop.expect("evening shop is open");
    assert_eq!(shop.empty_slots, served);
    let cheapest = controller
        .shop_listing(&ShopFilter::any())
        .into_iter()
        .filter(|listing| listing.status.is_purchasable())
        .min_by_key(|listing| listing.item.price)
        .map(|listing| listing.item.id.clone())
        .expect("sales pay for at least one restock");
    controller.dispatch(Action::BuyItem {
        item_id: cheapest.clone(),
    });

    let view = ViewModel::build(&controller, &UiState::default());
    let shop = view.shop.unwrap();
    assert_eq!(shop.empty_slots, served - 1);
    assert!(shop.entries.iter().all(|entry| entry.item.id != cheapest));
    assert!(view
        .shelf
        .iter()
        .any(|card| card.item.as_ref().is_some_and(|item| item.id == cheapest)));
}
