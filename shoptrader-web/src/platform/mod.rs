//! Platform adapter over the hosting page's SDK.
//!
//! When the SDK is missing or fails to initialise, the adapter wraps the
//! engine's [`MockPlatform`] over the local store instead, so the game always
//! has a platform to talk to.
#[cfg(not(target_arch = "wasm32"))]
mod stub;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use stub as sdk;
#[cfg(target_arch = "wasm32")]
use wasm as sdk;

use log::{debug, info, warn};
use serde_json::Value;
use shoptrader_game::constants::MOCK_AD_DURATION;
use shoptrader_game::{CloudAccess, KeyValueStore, MockPlatform, Platform, PlatformError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{LOG_TARGET_PLATFORM, dom};

/// Language requested from the SDK's own UI.
pub const UI_LANGUAGE: &str = "en";

enum Backend<S> {
    Sdk {
        sdk: Rc<sdk::Sdk>,
        player: Option<Rc<sdk::Player>>,
    },
    Mock(Rc<MockPlatform<S>>),
}

impl<S> Clone for Backend<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Sdk { sdk, player } => Self::Sdk {
                sdk: Rc::clone(sdk),
                player: player.clone(),
            },
            Self::Mock(mock) => Self::Mock(Rc::clone(mock)),
        }
    }
}

/// [`Platform`] for the browser. Clones share the same SDK handles.
///
/// Cloud reads are served from data fetched once in [`WebPlatform::connect`];
/// cloud writes update that copy and are sent in the background.
pub struct WebPlatform<S> {
    backend: Backend<S>,
    cloud_cache: Rc<RefCell<HashMap<String, Option<Value>>>>,
}

impl<S> Clone for WebPlatform<S> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            cloud_cache: Rc::clone(&self.cloud_cache),
        }
    }
}

impl<S: KeyValueStore + 'static> WebPlatform<S> {
    /// Mock-backed platform keeping "cloud" data in `store`.
    #[must_use]
    pub fn offline(store: S) -> Self {
        Self {
            backend: Backend::Mock(Rc::new(MockPlatform::new(store))),
            cloud_cache: Rc::default(),
        }
    }

    /// Detect and initialise the SDK, falling back to [`WebPlatform::offline`].
    ///
    /// Cloud data for `keys` is fetched up front.
    #[allow(clippy::future_not_send)]
    pub async fn connect(store: S, keys: &[&str]) -> Self {
        if !sdk::is_present() {
            warn!(target: LOG_TARGET_PLATFORM, "platform SDK not found, running offline");
            return Self::offline(store);
        }
        let sdk = match sdk::init().await {
            Ok(sdk) => sdk,
            Err(err) => {
                warn!(target: LOG_TARGET_PLATFORM, "SDK init failed, running offline: {err}");
                return Self::offline(store);
            }
        };
        sdk.set_language(UI_LANGUAGE);

        let player = if sdk.has_player_api() {
            match Self::acquire_player(&sdk).await {
                Some(player) => Some(Rc::new(player)),
                None => return Self::offline(store),
            }
        } else {
            None
        };
        info!(
            target: LOG_TARGET_PLATFORM,
            "SDK ready, cloud {:?}",
            player.as_ref().map(|p| p.cloud_access())
        );

        let platform = Self {
            backend: Backend::Sdk {
                sdk: Rc::new(sdk),
                player,
            },
            cloud_cache: Rc::default(),
        };
        platform.prefetch(keys).await;
        platform
    }

    #[allow(clippy::future_not_send)]
    async fn acquire_player(sdk: &sdk::Sdk) -> Option<sdk::Player> {
        match sdk.player(true).await {
            Ok(player) => Some(player),
            Err(err) => {
                warn!(
                    target: LOG_TARGET_PLATFORM,
                    "full player access denied, retrying limited: {err}"
                );
                match sdk.player(false).await {
                    Ok(player) => Some(player),
                    Err(err) => {
                        warn!(
                            target: LOG_TARGET_PLATFORM,
                            "player unavailable, running offline: {err}"
                        );
                        None
                    }
                }
            }
        }
    }

    #[allow(clippy::future_not_send)]
    async fn prefetch(&self, keys: &[&str]) {
        let Backend::Sdk {
            player: Some(player),
            ..
        } = &self.backend
        else {
            return;
        };
        if !player.cloud_access().read {
            return;
        }
        for key in keys {
            let data = player.get_data(key).await.unwrap_or_else(|err| {
                warn!(target: LOG_TARGET_PLATFORM, "cloud read of {key} failed: {err}");
                None
            });
            self.cloud_cache.borrow_mut().insert((*key).to_string(), data);
        }
    }

    #[must_use]
    pub const fn is_offline(&self) -> bool {
        matches!(self.backend, Backend::Mock(_))
    }

    /// The mock behind an offline platform.
    #[must_use]
    pub fn mock(&self) -> Option<&MockPlatform<S>> {
        match &self.backend {
            Backend::Mock(mock) => Some(mock),
            Backend::Sdk { .. } => None,
        }
    }

    /// Show an interstitial and wait for it to close, pausing the gameplay
    /// session around it. Returns whether the ad was shown.
    #[allow(clippy::future_not_send)]
    pub async fn show_interstitial_async(&self) -> bool {
        if let Err(err) = self.session_stop() {
            warn!(target: LOG_TARGET_PLATFORM, "gameplay stop failed: {err}");
        }
        let shown = match &self.backend {
            Backend::Sdk { sdk, .. } => sdk.show_fullscreen_adv().await,
            Backend::Mock(mock) => {
                let shown = mock.show_interstitial();
                if let Err(err) = dom::sleep(MOCK_AD_DURATION).await {
                    debug!(
                        target: LOG_TARGET_PLATFORM,
                        "mock ad timer failed: {}",
                        dom::js_error_message(&err)
                    );
                }
                shown
            }
        }
        .unwrap_or_else(|err| {
            warn!(target: LOG_TARGET_PLATFORM, "interstitial failed: {err}");
            false
        });
        if let Err(err) = self.session_start() {
            warn!(target: LOG_TARGET_PLATFORM, "gameplay start failed: {err}");
        }
        shown
    }
}

impl<S: KeyValueStore + 'static> Platform for WebPlatform<S> {
    fn ready(&self) -> Result<(), PlatformError> {
        match &self.backend {
            Backend::Sdk { sdk, .. } => sdk.loading_ready(),
            Backend::Mock(mock) => mock.ready(),
        }
    }

    fn session_start(&self) -> Result<(), PlatformError> {
        match &self.backend {
            Backend::Sdk { sdk, .. } => sdk.gameplay_start(),
            Backend::Mock(mock) => mock.session_start(),
        }
    }

    fn session_stop(&self) -> Result<(), PlatformError> {
        match &self.backend {
            Backend::Sdk { sdk, .. } => sdk.gameplay_stop(),
            Backend::Mock(mock) => mock.session_stop(),
        }
    }

    /// With a real SDK the ad runs in the background and this reports `false`;
    /// use [`WebPlatform::show_interstitial_async`] to wait for it.
    fn show_interstitial(&self) -> Result<bool, PlatformError> {
        match &self.backend {
            Backend::Sdk { sdk, .. } => {
                let sdk = Rc::clone(sdk);
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(err) = sdk.show_fullscreen_adv().await {
                        warn!(target: LOG_TARGET_PLATFORM, "interstitial failed: {err}");
                    }
                });
                Ok(false)
            }
            Backend::Mock(mock) => mock.show_interstitial(),
        }
    }

    fn read_player_data(&self, key: &str) -> Result<Option<Value>, PlatformError> {
        match &self.backend {
            Backend::Sdk {
                player: Some(_), ..
            } => Ok(self.cloud_cache.borrow().get(key).cloned().flatten()),
            Backend::Sdk { player: None, .. } => Err(PlatformError::Unavailable),
            Backend::Mock(mock) => mock.read_player_data(key),
        }
    }

    fn write_player_data(&self, key: &str, data: &Value) -> Result<(), PlatformError> {
        match &self.backend {
            Backend::Sdk {
                player: Some(player),
                ..
            } => {
                self.cloud_cache
                    .borrow_mut()
                    .insert(key.to_string(), Some(data.clone()));
                let player = Rc::clone(player);
                let key = key.to_string();
                let data = data.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(err) = player.set_data(&key, &data).await {
                        warn!(target: LOG_TARGET_PLATFORM, "cloud write of {key} failed: {err}");
                    }
                });
                Ok(())
            }
            Backend::Sdk { player: None, .. } => Err(PlatformError::Unavailable),
            Backend::Mock(mock) => mock.write_player_data(key, data),
        }
    }

    fn cloud_access(&self) -> CloudAccess {
        match &self.backend {
            Backend::Sdk {
                player: Some(player),
                ..
            } => player.cloud_access(),
            Backend::Sdk { player: None, .. } => CloudAccess::none(),
            Backend::Mock(mock) => mock.cloud_access(),
        }
    }

    fn is_mock(&self) -> bool {
        self.is_offline()
    }
}
