use js_sys::{Function, Promise};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Storage, Window};

/// Retrieve the global `window` object.
///
/// # Errors
/// Returns an error outside of a browser context where `window` is unavailable.
pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("`window` is unavailable"))
}

/// Convert a JavaScript value into a readable string for error reporting.
#[must_use]
pub fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| err.message().into())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Name of a thrown JavaScript error, such as `QuotaExceededError`.
#[must_use]
pub fn js_error_name(value: &JsValue) -> Option<String> {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.name()))
}

/// Log an error message to the browser console.
pub fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from(message));
}

/// Milliseconds since page load from `performance.now()`, or zero when the
/// clock is unavailable.
#[must_use]
pub fn now_ms() -> f64 {
    window()
        .ok()
        .and_then(|w| w.performance())
        .map_or(0.0, |perf| perf.now())
}

/// Clamp a duration into the `i32` millisecond range `setTimeout` accepts.
#[must_use]
pub fn timeout_ms(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

/// Yield execution for the requested number of milliseconds.
///
/// # Errors
/// Returns an error if the timer cannot be scheduled or the underlying JavaScript promise rejects.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn sleep_ms(duration_ms: i32) -> Result<(), JsValue> {
    let mut resolve_slot: Option<Function> = None;
    let promise = Promise::new(&mut |resolve, _reject| {
        resolve_slot = Some(resolve);
    });

    let resolve =
        resolve_slot.ok_or_else(|| JsValue::from_str("resolve function should be set"))?;
    let closure = Closure::once(move || {
        let _ = resolve.call0(&JsValue::UNDEFINED);
    });

    let _ = window()?.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        duration_ms,
    )?;
    closure.forget();

    JsFuture::from(promise).await?;
    Ok(())
}

/// [`sleep_ms`] for a [`Duration`].
///
/// # Errors
/// Returns an error if the timer cannot be scheduled.
#[allow(clippy::future_not_send)]
pub async fn sleep(duration: Duration) -> Result<(), JsValue> {
    sleep_ms(timeout_ms(duration)).await
}

/// Access the browser `localStorage` handle.
///
/// # Errors
/// Returns an error if the browser window cannot be accessed or `localStorage` is unavailable.
pub fn local_storage() -> Result<Storage, JsValue> {
    window()?
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("localStorage unavailable"))
}
