//! Best-effort persistence over a local key-value store and the platform's
//! cloud player data.
use log::{debug, warn};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::constants::LOG_TARGET_SAVE;
use crate::platform::Platform;
use crate::snapshot::{SaveDecode, Snapshot, decode, decode_str};
use crate::variant::Variant;

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value storage, e.g. the browser's `localStorage`.
pub trait KeyValueStore {
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns an error if the value cannot be stored.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
    unavailable: Rc<Cell<bool>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes pushing the total size past `max_bytes`.
    #[must_use]
    pub fn with_quota(max_bytes: usize) -> Self {
        Self {
            quota: Some(max_bytes),
            ..Self::default()
        }
    }

    /// Make every operation fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.get() {
            Err(StorageError::Unavailable("memory store disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let mut entries = self.entries.borrow_mut();
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Which backends accepted a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOutcome {
    pub local: bool,
    pub cloud: bool,
}

/// Reads and writes one variant's save through both backends.
///
/// Nothing here fails: every backend error is logged and the operation moves on.
#[derive(Debug, Clone)]
pub struct SaveAdapter<S> {
    variant: Variant,
    local: S,
}

impl<S: KeyValueStore> SaveAdapter<S> {
    pub const fn new(variant: Variant, local: S) -> Self {
        Self { variant, local }
    }

    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.variant.storage_key()
    }

    #[must_use]
    pub const fn local(&self) -> &S {
        &self.local
    }

    /// Load the save, preferring cloud data.
    ///
    /// An empty or unreadable cloud save falls back to the local store; a
    /// legacy cloud save wins outright so the run starts fresh.
    pub fn load<P: Platform + ?Sized>(&self, platform: &P) -> SaveDecode {
        if platform.cloud_access().read {
            match platform.read_player_data(self.key()) {
                Ok(Some(value)) => match decode(&value, self.variant) {
                    SaveDecode::Absent => {
                        debug!(target: LOG_TARGET_SAVE, "cloud save empty, trying local");
                    }
                    SaveDecode::Malformed(_) => {
                        warn!(target: LOG_TARGET_SAVE, "cloud save unreadable, trying local");
                    }
                    decoded => return decoded,
                },
                Ok(None) => debug!(target: LOG_TARGET_SAVE, "no cloud save"),
                Err(err) => warn!(target: LOG_TARGET_SAVE, "cloud load failed: {err}"),
            }
        }
        self.load_local()
    }

    fn load_local(&self) -> SaveDecode {
        match self.local.get(self.key()) {
            Ok(Some(raw)) => decode_str(&raw, self.variant),
            Ok(None) => SaveDecode::Absent,
            Err(err) => {
                warn!(target: LOG_TARGET_SAVE, "local load failed: {err}");
                SaveDecode::Absent
            }
        }
    }

    /// Write to the local store, then to the cloud when writable.
    pub fn save<P: Platform + ?Sized>(&self, platform: &P, snapshot: &Snapshot) -> SaveOutcome {
        let value = match serde_json::to_value(snapshot) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: LOG_TARGET_SAVE, "could not encode save: {err}");
                return SaveOutcome::default();
            }
        };
        let local = match self.local.set(self.key(), &value.to_string()) {
            Ok(()) => true,
            Err(err) => {
                warn!(target: LOG_TARGET_SAVE, "local save failed: {err}");
                false
            }
        };
        let cloud = self.write_cloud(platform, &value);
        SaveOutcome { local, cloud }
    }

    /// Remove the local save and blank the cloud entry.
    pub fn clear<P: Platform + ?Sized>(&self, platform: &P) {
        if let Err(err) = self.local.remove(self.key()) {
            warn!(target: LOG_TARGET_SAVE, "local clear failed: {err}");
        }
        self.write_cloud(platform, &Value::Object(serde_json::Map::new()));
    }

    fn write_cloud<P: Platform + ?Sized>(&self, platform: &P, value: &Value) -> bool {
        if !platform.cloud_access().write {
            return false;
        }
        match platform.write_player_data(self.key(), value) {
            Ok(()) => true,
            Err(err) => {
                warn!(target: LOG_TARGET_SAVE, "cloud save failed: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{CloudAccess, MockPlatform, PlatformCall};
    use crate::snapshot::snapshot;
    use crate::state::GameState;

    fn saved_state(day: u32) -> Snapshot {
        let mut state = GameState::default();
        state.day = day;
        snapshot(&state)
    }

    #[test]
    fn quota_rejects_oversized_values() {
        let store = MemoryStore::with_quota(16);
        store.set("k", "short").unwrap();
        let err = store.set("other", "far too long for this").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { key } if key == "other"));
        store.set("k", "replaced-value").unwrap();
    }

    #[test]
    fn save_writes_local_and_cloud() {
        let local = MemoryStore::new();
        let platform = MockPlatform::in_memory();
        let adapter = SaveAdapter::new(Variant::BookTrader, local.clone());
        let outcome = adapter.save(&platform, &saved_state(3));
        assert_eq!(outcome, SaveOutcome { local: true, cloud: true });
        assert!(local.get("book_trader_save_v1").unwrap().is_some());
        assert!(
            platform
                .calls()
                .contains(&PlatformCall::WritePlayerData("book_trader_save_v1".into()))
        );
    }

    #[test]
    fn cloud_save_wins_over_local() {
        let local = MemoryStore::new();
        let platform = MockPlatform::in_memory();
        let adapter = SaveAdapter::new(Variant::GameTrader, local.clone());
        local
            .set(adapter.key(), &saved_state(2).to_value().to_string())
            .unwrap();
        platform
            .write_player_data(adapter.key(), &saved_state(7).to_value())
            .unwrap();
        let loaded = adapter.load(&platform).into_snapshot().unwrap();
        assert_eq!(loaded.day, 7);
    }

    #[test]
    fn empty_or_broken_cloud_falls_back_to_local() {
        let local = MemoryStore::new();
        let adapter = SaveAdapter::new(Variant::BookTrader, local.clone());
        local
            .set(adapter.key(), &saved_state(5).to_value().to_string())
            .unwrap();
        for cloud in [serde_json::json!({}), serde_json::json!({"ownedIds": 3})] {
            let platform = MockPlatform::in_memory();
            platform.write_player_data(adapter.key(), &cloud).unwrap();
            assert_eq!(adapter.load(&platform).into_snapshot().unwrap().day, 5);
        }
    }

    #[test]
    fn legacy_cloud_save_means_fresh_run() {
        let local = MemoryStore::new();
        let adapter = SaveAdapter::new(Variant::BookTrader, local.clone());
        local
            .set(adapter.key(), &saved_state(5).to_value().to_string())
            .unwrap();
        let platform = MockPlatform::in_memory();
        platform
            .write_player_data(adapter.key(), &serde_json::json!({"ownedFilms": ["alien"]}))
            .unwrap();
        assert_eq!(adapter.load(&platform), SaveDecode::Legacy);
    }

    #[test]
    fn storage_failures_are_absorbed() {
        let local = MemoryStore::new();
        local.set_unavailable(true);
        let platform = MockPlatform::in_memory().with_cloud(CloudAccess::none());
        let adapter = SaveAdapter::new(Variant::BookTrader, local.clone());
        assert_eq!(adapter.save(&platform, &saved_state(1)), SaveOutcome::default());
        assert_eq!(adapter.load(&platform), SaveDecode::Absent);
        adapter.clear(&platform);
    }

    #[test]
    fn clear_removes_local_and_blanks_cloud() {
        let local = MemoryStore::new();
        let cloud = MemoryStore::new();
        let platform = MockPlatform::new(cloud.clone());
        let adapter = SaveAdapter::new(Variant::GameTrader, local.clone());
        adapter.save(&platform, &saved_state(4));
        adapter.clear(&platform);
        assert_eq!(local.get(adapter.key()).unwrap(), None);
        assert_eq!(cloud.get(adapter.key()).unwrap().as_deref(), Some("{}"));
        assert_eq!(adapter.load(&platform), SaveDecode::Absent);
    }
}
