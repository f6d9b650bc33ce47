//! Native builds have no platform SDK. Detection always fails, so only the
//! offline mock is ever constructed; these types exist to keep the adapter
//! target-independent.
use serde_json::Value;
use shoptrader_game::{CloudAccess, PlatformError};
use std::convert::Infallible;

pub struct Sdk {
    never: Infallible,
}

pub struct Player {
    never: Infallible,
}

pub const fn is_present() -> bool {
    false
}

#[allow(clippy::unused_async)]
pub async fn init() -> Result<Sdk, PlatformError> {
    Err(PlatformError::Unavailable)
}

impl Sdk {
    pub fn set_language(&self, _lang: &str) {
        match self.never {}
    }

    pub fn has_player_api(&self) -> bool {
        match self.never {}
    }

    #[allow(clippy::unused_async)]
    pub async fn player(&self, _scoped: bool) -> Result<Player, PlatformError> {
        match self.never {}
    }

    pub fn loading_ready(&self) -> Result<(), PlatformError> {
        match self.never {}
    }

    pub fn gameplay_start(&self) -> Result<(), PlatformError> {
        match self.never {}
    }

    pub fn gameplay_stop(&self) -> Result<(), PlatformError> {
        match self.never {}
    }

    #[allow(clippy::unused_async)]
    pub async fn show_fullscreen_adv(&self) -> Result<bool, PlatformError> {
        match self.never {}
    }
}

impl Player {
    pub fn cloud_access(&self) -> CloudAccess {
        match self.never {}
    }

    #[allow(clippy::unused_async)]
    pub async fn get_data(&self, _key: &str) -> Result<Option<Value>, PlatformError> {
        match self.never {}
    }

    #[allow(clippy::unused_async)]
    pub async fn set_data(&self, _key: &str, _data: &Value) -> Result<(), PlatformError> {
        match self.never {}
    }
}
