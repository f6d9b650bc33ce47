//! `localStorage`-backed key-value store.
use log::warn;
use shoptrader_game::{KeyValueStore, MemoryStore, StorageError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::{LOG_TARGET_SAVE, dom};

/// Thin wrapper over the browser's `localStorage`.
#[derive(Debug, Clone)]
pub struct BrowserStore {
    storage: Storage,
}

impl BrowserStore {
    /// Open the page's `localStorage`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when storage is disabled, e.g. in
    /// some private browsing modes.
    pub fn open() -> Result<Self, StorageError> {
        dom::local_storage()
            .map(|storage| Self { storage })
            .map_err(|err| StorageError::Unavailable(dom::js_error_message(&err)))
    }
}

/// Map a failed `setItem` to a storage error, recognising quota failures.
#[must_use]
pub fn classify_write_failure(key: &str, name: Option<&str>, message: &str) -> StorageError {
    let quota = name.is_some_and(|name| {
        name == "QuotaExceededError" || name == "NS_ERROR_DOM_QUOTA_REACHED"
    }) || message.to_ascii_lowercase().contains("quota");
    if quota {
        StorageError::QuotaExceeded {
            key: key.to_string(),
        }
    } else {
        StorageError::Backend(message.to_string())
    }
}

fn backend_error(err: &JsValue) -> StorageError {
    StorageError::Backend(dom::js_error_message(err))
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(|err| backend_error(&err))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).map_err(|err| {
            classify_write_failure(
                key,
                dom::js_error_name(&err).as_deref(),
                &dom::js_error_message(&err),
            )
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(|err| backend_error(&err))
    }
}

/// Local store used by the shell: `localStorage` when the page has it,
/// otherwise an in-memory map that lasts for the page's lifetime.
#[derive(Debug, Clone)]
pub enum WebStore {
    Browser(BrowserStore),
    Memory(MemoryStore),
}

impl WebStore {
    /// Open `localStorage`, falling back to memory when it is unavailable.
    #[must_use]
    pub fn open() -> Self {
        match BrowserStore::open() {
            Ok(store) => Self::Browser(store),
            Err(err) => {
                warn!(target: LOG_TARGET_SAVE, "{err}; progress will not survive a reload");
                Self::Memory(MemoryStore::new())
            }
        }
    }

    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::Browser(_))
    }
}

impl KeyValueStore for WebStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Browser(store) => store.get(key),
            Self::Memory(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::Browser(store) => store.set(key, value),
            Self::Memory(store) => store.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Browser(store) => store.remove(key),
            Self::Memory(store) => store.remove(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_failures_are_recognised_by_name_or_message() {
        assert!(matches!(
            classify_write_failure("k", Some("QuotaExceededError"), "boom"),
            StorageError::QuotaExceeded { key } if key == "k"
        ));
        assert!(matches!(
            classify_write_failure("k", None, "The quota has been exceeded."),
            StorageError::QuotaExceeded { .. }
        ));
        assert!(matches!(
            classify_write_failure("k", Some("SecurityError"), "denied"),
            StorageError::Backend(msg) if msg == "denied"
        ));
    }

    #[test]
    fn memory_fallback_behaves_like_a_store() {
        let store = WebStore::Memory(MemoryStore::new());
        assert!(!store.is_persistent());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }
}
