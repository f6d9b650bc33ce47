#![forbid(unsafe_code)]
//! Browser shell for Shop Trader.
//!
//! Wires the platform-agnostic engine to `localStorage`, the hosting
//! platform's SDK and a JavaScript page that renders [`view_model::ViewModel`].
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub mod app;
pub mod console;
pub mod dom;
pub mod loader;
pub mod loading;
pub mod platform;
pub mod storage;
pub mod view_model;

pub use loader::{StaticDataLoader, WebDataError};
pub use platform::WebPlatform;
pub use storage::{BrowserStore, WebStore};

pub(crate) const LOG_TARGET: &str = "shoptrader::web";
pub(crate) const LOG_TARGET_SAVE: &str = "shoptrader::save";
pub(crate) const LOG_TARGET_PLATFORM: &str = "shoptrader::platform";

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console::init(log::LevelFilter::Info);
}
