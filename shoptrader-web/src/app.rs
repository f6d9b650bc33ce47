//! JavaScript-facing game object.
//!
//! The page calls into [`ShopApp`] for every button press and re-renders from
//! the returned view. Delayed work (customer advances, the shelf fade-out and
//! the interstitial) runs on the browser's event loop and reports back
//! through the `onChange` callback.
use js_sys::{Function, Promise};
use log::{info, warn};
use serde::Serialize;
use shoptrader_game::constants::SHELF_CLEAR_DELAY;
use shoptrader_game::{
    Action, Effect, Phase, PriceTier, ShopController, ShopEngine, ShopFilter, Variant,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;

use crate::loader::StaticDataLoader;
use crate::loading::{LoadingClock, LoadingStage};
use crate::platform::WebPlatform;
use crate::storage::WebStore;
use crate::view_model::{Reply, UiState, ViewModel};
use crate::{LOG_TARGET, dom};

type Controller = ShopController<WebPlatform<WebStore>, WebStore>;

struct Shell {
    controller: Controller,
    ui: UiState,
    /// Bumped whenever a scheduled advance is superseded.
    advance_epoch: u64,
    closing_shop: bool,
    on_change: Option<Function>,
}

impl Shell {
    fn absorb(&mut self, effects: &[Effect]) {
        if let Some(reply) = Reply::from_effects(effects) {
            self.ui.reply = Some(reply);
        }
        for effect in effects {
            match effect {
                Effect::Sold(sale) => self.ui.sold_slot = Some(sale.slot),
                Effect::ClearProgress => {
                    self.advance_epoch += 1;
                    self.ui.reply = None;
                    self.ui.sold_slot = None;
                }
                Effect::DayStarted { .. } | Effect::ShopOpened | Effect::DayFinished { .. } => {
                    self.ui.reply = None;
                }
                _ => {}
            }
        }
    }
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn notify(callback: Option<&Function>) {
    if let Some(callback) = callback {
        if let Err(err) = callback.call0(&JsValue::UNDEFINED) {
            dom::console_error(&dom::js_error_message(&err));
        }
    }
}

fn report(callback: Option<&Function>, stage: LoadingStage, variant: Variant) {
    if let Some(callback) = callback {
        let message = JsValue::from_str(stage.message(variant));
        if let Err(err) = callback.call1(&JsValue::UNDEFINED, &message) {
            warn!(
                target: LOG_TARGET,
                "loading callback failed at {stage:?}: {}",
                dom::js_error_message(&err)
            );
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn random_seed() -> u64 {
    let half = || (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
    (half() << 32) | half()
}

#[wasm_bindgen]
pub struct ShopApp {
    shell: Rc<RefCell<Shell>>,
    platform: WebPlatform<WebStore>,
}

#[wasm_bindgen]
impl ShopApp {
    /// Connect to the platform, load or start a run and keep the loading
    /// overlay up for its minimum time. `on_loading` receives status lines.
    ///
    /// # Errors
    ///
    /// Fails for an unknown variant or broken bundled data.
    #[allow(clippy::future_not_send)]
    pub async fn boot(variant: String, on_loading: Option<Function>) -> Result<ShopApp, JsValue> {
        let clock = LoadingClock::started_at(dom::now_ms());
        let variant: Variant = variant
            .parse()
            .map_err(|()| JsValue::from_str(&format!("unknown variant: {variant}")))?;
        report(on_loading.as_ref(), LoadingStage::Connecting, variant);

        let store = WebStore::open();
        let platform = WebPlatform::connect(store.clone(), &[variant.storage_key()]).await;
        report(on_loading.as_ref(), LoadingStage::Unpacking, variant);

        let engine = ShopEngine::new(StaticDataLoader, store);
        let mut controller = engine
            .create_controller(variant, platform.clone(), random_seed())
            .map_err(to_js_error)?;
        let outcome = controller.boot();
        info!(
            target: LOG_TARGET,
            "{variant} started: {outcome:?}, offline: {}, seed {}",
            platform.is_offline(),
            controller.seed()
        );
        report(on_loading.as_ref(), LoadingStage::Opening, variant);

        let wait = clock.remaining(dom::now_ms());
        if !wait.is_zero() {
            if let Err(err) = dom::sleep(wait).await {
                warn!(target: LOG_TARGET, "loading timer failed: {}", dom::js_error_message(&err));
            }
        }
        report(on_loading.as_ref(), LoadingStage::Welcome, variant);
        controller.signal_ready();

        Ok(ShopApp {
            shell: Rc::new(RefCell::new(Shell {
                controller,
                ui: UiState::default(),
                advance_epoch: 0,
                closing_shop: false,
                on_change: None,
            })),
            platform,
        })
    }

    /// Register the callback run after every change the page did not ask for.
    #[wasm_bindgen(js_name = setOnChange)]
    pub fn set_on_change(&self, callback: Option<Function>) {
        self.shell.borrow_mut().on_change = callback;
    }

    /// # Errors
    ///
    /// Fails if the view cannot be converted to a JavaScript value.
    pub fn view(&self) -> Result<JsValue, JsValue> {
        let shell = self.shell.borrow();
        ViewModel::build(&shell.controller, &shell.ui)
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = startDay)]
    pub fn start_day(&self) -> Result<JsValue, JsValue> {
        self.act(Action::StartDay)
    }

    pub fn offer(&self, slot: usize) -> Result<JsValue, JsValue> {
        self.act(Action::OfferItem { slot })
    }

    pub fn skip(&self) -> Result<JsValue, JsValue> {
        self.act(Action::SkipCustomer)
    }

    #[wasm_bindgen(js_name = endDay)]
    pub fn end_day(&self) -> Result<JsValue, JsValue> {
        self.act(Action::EndDay)
    }

    pub fn buy(&self, item_id: String) -> Result<JsValue, JsValue> {
        self.act(Action::BuyItem { item_id })
    }

    pub fn restart(&self) -> Result<JsValue, JsValue> {
        self.act(Action::Restart)
    }

    /// Narrow the shop listing. Empty or unknown values mean "any".
    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(
        &self,
        genre: Option<String>,
        tier: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let mut filter = ShopFilter::any();
        if let Some(genre) = genre.filter(|g| !g.is_empty()) {
            filter = filter.with_genre(genre);
        }
        if let Some(tier) = tier.and_then(|t| t.parse::<PriceTier>().ok()) {
            filter = filter.with_tier(tier);
        }
        self.shell.borrow_mut().ui.filter = filter;
        self.view()
    }

    /// Close the evening shop: show an interstitial, then open the next day.
    /// Resolves to whether the ad was shown; repeated calls while one is
    /// running resolve to `false`.
    #[wasm_bindgen(js_name = finishShop)]
    pub fn finish_shop(&self) -> Promise {
        let shell = Rc::clone(&self.shell);
        let platform = self.platform.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            {
                let mut guard = shell.borrow_mut();
                if guard.closing_shop || guard.controller.session().phase() != &Phase::EveningShop {
                    return Ok(JsValue::FALSE);
                }
                guard.closing_shop = true;
            }
            let shown = platform.show_interstitial_async().await;
            let callback = {
                let mut guard = shell.borrow_mut();
                guard.closing_shop = false;
                let effects = guard.controller.dispatch(Action::FinishShop);
                guard.absorb(&effects);
                guard.on_change.clone()
            };
            notify(callback.as_ref());
            Ok(JsValue::from_bool(shown))
        })
    }

    #[wasm_bindgen(js_name = hasProgress)]
    pub fn has_progress(&self) -> bool {
        self.shell.borrow().controller.has_progress()
    }

    #[wasm_bindgen(js_name = isOffline)]
    pub fn is_offline(&self) -> bool {
        self.platform.is_offline()
    }

    pub fn variant(&self) -> String {
        self.shell.borrow().controller.variant().to_string()
    }
}

impl ShopApp {
    fn act(&self, action: Action) -> Result<JsValue, JsValue> {
        let effects = {
            let mut shell = self.shell.borrow_mut();
            if shell.closing_shop {
                drop(shell);
                return self.view();
            }
            let effects = shell.controller.dispatch(action);
            shell.absorb(&effects);
            effects
        };
        for effect in &effects {
            match effect {
                Effect::ScheduleAdvance(delay) => self.schedule_advance(*delay),
                Effect::Sold(sale) => self.schedule_shelf_clear(sale.slot),
                _ => {}
            }
        }
        self.view()
    }

    fn schedule_advance(&self, delay: Duration) {
        let epoch = {
            let mut shell = self.shell.borrow_mut();
            shell.advance_epoch += 1;
            shell.advance_epoch
        };
        let shell = Rc::clone(&self.shell);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = dom::sleep(delay).await {
                warn!(target: LOG_TARGET, "advance timer failed: {}", dom::js_error_message(&err));
            }
            let callback = {
                let mut guard = shell.borrow_mut();
                if guard.advance_epoch != epoch {
                    return;
                }
                let effects = guard.controller.complete_advance();
                guard.ui.reply = None;
                guard.absorb(&effects);
                guard.on_change.clone()
            };
            notify(callback.as_ref());
        });
    }

    fn schedule_shelf_clear(&self, slot: usize) {
        let shell = Rc::clone(&self.shell);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = dom::sleep(SHELF_CLEAR_DELAY).await {
                warn!(target: LOG_TARGET, "shelf timer failed: {}", dom::js_error_message(&err));
            }
            let callback = {
                let mut guard = shell.borrow_mut();
                if guard.ui.sold_slot != Some(slot) {
                    return;
                }
                guard.ui.sold_slot = None;
                guard.on_change.clone()
            };
            notify(callback.as_ref());
        });
    }
}
