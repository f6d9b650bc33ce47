//! Bindings to the platform SDK the hosting page exposes as `YaGames`.
//!
//! The SDK is a dynamic object whose features vary between builds, so every
//! member is looked up by name and missing optional features are skipped.
use js_sys::{Array, Function, Object, Promise, Reflect};
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use shoptrader_game::{CloudAccess, PlatformError};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::{LOG_TARGET_PLATFORM, dom};

const SDK_GLOBAL: &str = "YaGames";

fn sdk_error(err: &JsValue) -> PlatformError {
    PlatformError::Sdk(dom::js_error_message(err))
}

/// Follow a dotted property path, stopping at `undefined` or `null`.
fn prop(target: &JsValue, path: &str) -> Option<JsValue> {
    path.split('.').try_fold(target.clone(), |value, name| {
        Reflect::get(&value, &JsValue::from_str(name))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
    })
}

/// Resolve a dotted path to a function together with its `this`.
fn method(target: &JsValue, path: &str) -> Option<(JsValue, Function)> {
    let (owner, name) = match path.rsplit_once('.') {
        Some((owner_path, name)) => (prop(target, owner_path)?, name),
        None => (target.clone(), path),
    };
    let func = prop(&owner, name)?.dyn_into::<Function>().ok()?;
    Some((owner, func))
}

fn call(target: &JsValue, path: &str, args: &Array) -> Result<JsValue, PlatformError> {
    let (owner, func) = method(target, path).ok_or(PlatformError::Unavailable)?;
    func.apply(&owner, args).map_err(|err| sdk_error(&err))
}

/// Await the value when it is a promise, pass it through otherwise.
#[allow(clippy::future_not_send)]
async fn settle(value: JsValue) -> Result<JsValue, PlatformError> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await.map_err(|err| sdk_error(&err)),
        Err(value) => Ok(value),
    }
}

fn set(target: &Object, name: &str, value: &JsValue) -> Result<(), PlatformError> {
    Reflect::set(target, &JsValue::from_str(name), value)
        .map(drop)
        .map_err(|err| sdk_error(&err))
}

fn to_js(value: &impl Serialize) -> Result<JsValue, PlatformError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| PlatformError::Sdk(err.to_string()))
}

pub struct Sdk {
    handle: JsValue,
}

pub struct Player {
    handle: JsValue,
}

pub fn is_present() -> bool {
    prop(&JsValue::from(js_sys::global()), SDK_GLOBAL).is_some()
}

#[allow(clippy::future_not_send)]
pub async fn init() -> Result<Sdk, PlatformError> {
    let global = prop(&JsValue::from(js_sys::global()), SDK_GLOBAL)
        .ok_or(PlatformError::Unavailable)?;
    let handle = settle(call(&global, "init", &Array::new())?).await?;
    Ok(Sdk { handle })
}

impl Sdk {
    /// Ask the SDK to localise its own UI; the setter is a function on some
    /// builds and a plain property on others.
    pub fn set_language(&self, lang: &str) {
        let Some(i18n) = prop(&self.handle, "environment.i18n") else {
            return;
        };
        let lang = JsValue::from_str(lang);
        let result = match prop(&i18n, "lang").and_then(|v| v.dyn_into::<Function>().ok()) {
            Some(setter) => setter.call1(&i18n, &lang).map(drop),
            None => Reflect::set(&i18n, &JsValue::from_str("lang"), &lang).map(drop),
        };
        if let Err(err) = result {
            warn!(target: LOG_TARGET_PLATFORM, "language not set: {}", dom::js_error_message(&err));
        }
    }

    pub fn has_player_api(&self) -> bool {
        method(&self.handle, "getPlayer").is_some()
    }

    #[allow(clippy::future_not_send)]
    pub async fn player(&self, scoped: bool) -> Result<Player, PlatformError> {
        let options = Object::new();
        set(&options, "scopes", &JsValue::from_bool(scoped))?;
        let handle = settle(call(&self.handle, "getPlayer", &Array::of1(&options))?).await?;
        Ok(Player { handle })
    }

    pub fn loading_ready(&self) -> Result<(), PlatformError> {
        self.optional_feature("features.LoadingAPI.ready")
    }

    pub fn gameplay_start(&self) -> Result<(), PlatformError> {
        self.optional_feature("features.GameplayAPI.start")
    }

    pub fn gameplay_stop(&self) -> Result<(), PlatformError> {
        self.optional_feature("features.GameplayAPI.stop")
    }

    fn optional_feature(&self, path: &str) -> Result<(), PlatformError> {
        match method(&self.handle, path) {
            Some((owner, func)) => func.call0(&owner).map(drop).map_err(|err| sdk_error(&err)),
            None => Ok(()),
        }
    }

    /// Show a fullscreen ad and wait until it closes or fails.
    #[allow(clippy::future_not_send)]
    pub async fn show_fullscreen_adv(&self) -> Result<bool, PlatformError> {
        let (owner, show) =
            method(&self.handle, "adv.showFullscreenAdv").ok_or(PlatformError::Unavailable)?;

        let mut resolve_slot: Option<Function> = None;
        let closed = Promise::new(&mut |resolve, _reject| {
            resolve_slot = Some(resolve);
        });
        let resolve = resolve_slot
            .ok_or_else(|| PlatformError::Sdk("resolve function should be set".to_string()))?;

        let on_close = {
            let resolve = resolve.clone();
            Closure::once_into_js(move |was_shown: JsValue| {
                let shown = JsValue::from_bool(was_shown.as_bool().unwrap_or(false));
                let _ = resolve.call1(&JsValue::UNDEFINED, &shown);
            })
        };
        let on_error = {
            let resolve = resolve.clone();
            Closure::once_into_js(move |err: JsValue| {
                warn!(
                    target: LOG_TARGET_PLATFORM,
                    "interstitial error: {}",
                    dom::js_error_message(&err)
                );
                let _ = resolve.call1(&JsValue::UNDEFINED, &JsValue::FALSE);
            })
        };

        let callbacks = Object::new();
        set(&callbacks, "onClose", &on_close)?;
        set(&callbacks, "onError", &on_error)?;
        let options = Object::new();
        set(&options, "callbacks", &callbacks)?;
        let returned = show.call1(&owner, &options).map_err(|err| sdk_error(&err))?;
        // Some builds reject the returned promise without calling onError.
        if returned.is_instance_of::<Promise>() {
            let on_reject = Closure::once_into_js(move |err: JsValue| {
                warn!(
                    target: LOG_TARGET_PLATFORM,
                    "interstitial rejected: {}",
                    dom::js_error_message(&err)
                );
                let _ = resolve.call1(&JsValue::UNDEFINED, &JsValue::FALSE);
            });
            call(&returned, "catch", &Array::of1(&on_reject))?;
        }

        let shown = JsFuture::from(closed).await.map_err(|err| sdk_error(&err))?;
        Ok(shown.as_bool().unwrap_or(false))
    }
}

impl Player {
    pub fn cloud_access(&self) -> CloudAccess {
        CloudAccess {
            read: method(&self.handle, "getData").is_some(),
            write: method(&self.handle, "setData").is_some(),
        }
    }

    #[allow(clippy::future_not_send)]
    pub async fn get_data(&self, key: &str) -> Result<Option<Value>, PlatformError> {
        let keys = Array::of1(&JsValue::from_str(key));
        let data = settle(call(&self.handle, "getData", &Array::of1(&keys))?).await?;
        if data.is_undefined() || data.is_null() {
            return Ok(None);
        }
        let data: Value = serde_wasm_bindgen::from_value(data)
            .map_err(|err| PlatformError::Sdk(err.to_string()))?;
        Ok(data.get(key).filter(|value| !value.is_null()).cloned())
    }

    /// Write one key with the SDK's flush flag set.
    #[allow(clippy::future_not_send)]
    pub async fn set_data(&self, key: &str, data: &Value) -> Result<(), PlatformError> {
        let mut payload = Map::new();
        payload.insert(key.to_string(), data.clone());
        let payload = to_js(&Value::Object(payload))?;
        let pending = call(&self.handle, "setData", &Array::of2(&payload, &JsValue::TRUE))?;
        settle(pending).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fake_sdk(body: &str) -> Sdk {
        let handle = Function::new_no_args(body)
            .call0(&JsValue::NULL)
            .expect("fake sdk");
        Sdk { handle }
    }

    #[wasm_bindgen_test]
    async fn rejected_ad_promise_counts_as_not_shown() {
        let sdk = fake_sdk(
            "return { adv: { showFullscreenAdv: () => Promise.reject(new Error('blocked')) } };",
        );
        assert!(!sdk.show_fullscreen_adv().await.unwrap());
    }

    #[wasm_bindgen_test]
    async fn closed_ad_reports_whether_it_was_shown() {
        let sdk = fake_sdk(
            "return { adv: { showFullscreenAdv: (o) => { o.callbacks.onClose(true); } } };",
        );
        assert!(sdk.show_fullscreen_adv().await.unwrap());
    }

    #[wasm_bindgen_test]
    async fn ad_error_callback_counts_as_not_shown() {
        let sdk = fake_sdk(
            "return { adv: { showFullscreenAdv: (o) => { o.callbacks.onError('no fill'); } } };",
        );
        assert!(!sdk.show_fullscreen_adv().await.unwrap());
    }
}
