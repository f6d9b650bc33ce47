//! Capability interface to the hosting game platform, plus a mock used when
//! no platform SDK is present.
use log::{debug, info, warn};
use serde_json::Value;
use std::cell::RefCell;

use crate::constants::LOG_TARGET_PLATFORM;
use crate::persistence::{KeyValueStore, MemoryStore, StorageError};

/// Which cloud player-data operations the platform supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloudAccess {
    pub read: bool,
    pub write: bool,
}

impl CloudAccess {
    #[must_use]
    pub const fn full() -> Self {
        Self {
            read: true,
            write: true,
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self {
            read: false,
            write: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("platform is unavailable")]
    Unavailable,
    #[error("platform SDK error: {0}")]
    Sdk(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("player data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Platform SDK surface used by the game.
///
/// Every call may fail; callers log and carry on.
pub trait Platform {
    /// Tell the platform the game finished loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK rejects the call.
    fn ready(&self) -> Result<(), PlatformError>;

    /// # Errors
    ///
    /// Returns an error if the SDK rejects the call.
    fn session_start(&self) -> Result<(), PlatformError>;

    /// # Errors
    ///
    /// Returns an error if the SDK rejects the call.
    fn session_stop(&self) -> Result<(), PlatformError>;

    /// Show a fullscreen ad, returning whether it was displayed.
    ///
    /// # Errors
    ///
    /// Returns an error if the ad could not be requested.
    fn show_interstitial(&self) -> Result<bool, PlatformError>;

    /// # Errors
    ///
    /// Returns an error if cloud data cannot be fetched.
    fn read_player_data(&self, key: &str) -> Result<Option<Value>, PlatformError>;

    /// # Errors
    ///
    /// Returns an error if cloud data cannot be written.
    fn write_player_data(&self, key: &str, data: &Value) -> Result<(), PlatformError>;

    fn cloud_access(&self) -> CloudAccess;

    /// Whether this is the stand-in used without a real SDK.
    fn is_mock(&self) -> bool {
        false
    }
}

/// Show an interstitial with the gameplay session paused around it.
///
/// The session is restarted even when the ad fails. Returns whether the ad
/// was shown.
pub fn run_interstitial<P: Platform + ?Sized>(platform: &P) -> bool {
    if let Err(err) = platform.session_stop() {
        warn!(target: LOG_TARGET_PLATFORM, "gameplay stop failed: {err}");
    }
    let shown = platform.show_interstitial().unwrap_or_else(|err| {
        warn!(target: LOG_TARGET_PLATFORM, "interstitial failed: {err}");
        false
    });
    if let Err(err) = platform.session_start() {
        warn!(target: LOG_TARGET_PLATFORM, "gameplay start failed: {err}");
    }
    shown
}

/// One recorded call against a [`MockPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Ready,
    SessionStart,
    SessionStop,
    ShowInterstitial,
    ReadPlayerData(String),
    WritePlayerData(String),
}

/// Local stand-in for the platform SDK.
///
/// Logs every call, reports ads as shown and keeps player data in a
/// key-value store.
#[derive(Debug)]
pub struct MockPlatform<S> {
    store: S,
    cloud: CloudAccess,
    fail_ads: bool,
    calls: RefCell<Vec<PlatformCall>>,
}

impl MockPlatform<MemoryStore> {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: KeyValueStore> MockPlatform<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cloud: CloudAccess::full(),
            fail_ads: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_cloud(mut self, cloud: CloudAccess) -> Self {
        self.cloud = cloud;
        self
    }

    /// Make every interstitial request fail.
    #[must_use]
    pub fn with_failing_ads(mut self) -> Self {
        self.fail_ads = true;
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn count(&self, call: &PlatformCall) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn record(&self, call: PlatformCall) {
        debug!(target: LOG_TARGET_PLATFORM, "[mock] {call:?}");
        self.calls.borrow_mut().push(call);
    }
}

impl<S: KeyValueStore> Platform for MockPlatform<S> {
    fn ready(&self) -> Result<(), PlatformError> {
        self.record(PlatformCall::Ready);
        info!(target: LOG_TARGET_PLATFORM, "[mock] game ready");
        Ok(())
    }

    fn session_start(&self) -> Result<(), PlatformError> {
        self.record(PlatformCall::SessionStart);
        Ok(())
    }

    fn session_stop(&self) -> Result<(), PlatformError> {
        self.record(PlatformCall::SessionStop);
        Ok(())
    }

    fn show_interstitial(&self) -> Result<bool, PlatformError> {
        self.record(PlatformCall::ShowInterstitial);
        if self.fail_ads {
            return Err(PlatformError::Sdk("mock ad failure".to_string()));
        }
        Ok(true)
    }

    fn read_player_data(&self, key: &str) -> Result<Option<Value>, PlatformError> {
        self.record(PlatformCall::ReadPlayerData(key.to_string()));
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_player_data(&self, key: &str, data: &Value) -> Result<(), PlatformError> {
        self.record(PlatformCall::WritePlayerData(key.to_string()));
        self.store.set(key, &data.to_string())?;
        Ok(())
    }

    fn cloud_access(&self) -> CloudAccess {
        self.cloud
    }

    fn is_mock(&self) -> bool {
        true
    }
}
