//! Save-data codec.
//!
//! The persisted shape is a flat camelCase JSON object. Decoding is lenient
//! about missing counters but strict about the ownership list, which is what
//! distinguishes a current save from one written by an older skin.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::constants::{FIRST_DAY, LOG_TARGET_SAVE, SHELF_SLOTS};
use crate::shelf::Shelf;
use crate::state::GameState;
use crate::variant::Variant;

const OWNED_FIELD: &str = "ownedIds";

/// Persisted form of a [`GameState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub balance: u64,
    #[serde(default = "first_day")]
    pub day: u32,
    #[serde(default)]
    pub sold_total: u32,
    #[serde(default)]
    pub sold_unique: Vec<String>,
    #[serde(default)]
    pub shelf: Vec<Option<String>>,
    pub owned_ids: Vec<String>,
    #[serde(default)]
    pub shop_order: Vec<String>,
}

const fn first_day() -> u32 {
    FIRST_DAY
}

impl Snapshot {
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Capture `state` for storage.
#[must_use]
pub fn snapshot(state: &GameState) -> Snapshot {
    Snapshot {
        balance: state.balance,
        day: state.day,
        sold_total: state.sold_total,
        sold_unique: state.sold_unique.iter().cloned().collect(),
        shelf: state.shelf().slots().to_vec(),
        owned_ids: state.owned().iter().cloned().collect(),
        shop_order: state.shop_order().to_vec(),
    }
}

/// Rebuild a state from a snapshot, re-resolving every id against `catalog`.
///
/// Unknown or repeated shelf ids leave the slot empty and the owned set is
/// recomputed from the shelf. The shop order keeps each known id once and
/// gains any catalog id it was missing, in catalog order.
#[must_use]
pub fn restore(snapshot: &Snapshot, catalog: &Catalog) -> GameState {
    let mut placed = HashSet::with_capacity(SHELF_SLOTS);
    let shelf = Shelf::from_slots(snapshot.shelf.iter().take(SHELF_SLOTS).map(|slot| {
        match slot {
            Some(id) if catalog.contains(id) && placed.insert(id.as_str()) => Some(id.clone()),
            _ => None,
        }
    }));

    let mut seen = HashSet::with_capacity(catalog.len());
    let mut shop_order = Vec::with_capacity(catalog.len());
    for id in &snapshot.shop_order {
        if catalog.contains(id) && seen.insert(id.as_str()) {
            shop_order.push(id.clone());
        }
    }
    for id in catalog.ids() {
        if !seen.contains(id) {
            shop_order.push(id.to_string());
        }
    }

    let mut state = GameState::from_shelf(shop_order, shelf);
    state.balance = snapshot.balance;
    state.day = snapshot.day.max(FIRST_DAY);
    state.sold_total = snapshot.sold_total;
    state.sold_unique = snapshot.sold_unique.iter().cloned().collect();
    if state.owned().len() != snapshot.owned_ids.len() {
        info!(
            target: LOG_TARGET_SAVE,
            "owned set rebuilt from shelf ({} saved, {} kept)",
            snapshot.owned_ids.len(),
            state.owned().len()
        );
    }
    state
}

/// Outcome of decoding stored save data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecode {
    /// Nothing stored, or an explicitly cleared save.
    Absent,
    /// Save written by an older skin of the game.
    Legacy,
    /// Unreadable data; the message says why.
    Malformed(String),
    Found(Snapshot),
}

impl SaveDecode {
    #[must_use]
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            Self::Found(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Classify a stored JSON value.
#[must_use]
pub fn decode(value: &Value, variant: Variant) -> SaveDecode {
    let Some(object) = value.as_object() else {
        return SaveDecode::Absent;
    };
    if object.is_empty() {
        return SaveDecode::Absent;
    }
    if !object.contains_key(OWNED_FIELD) {
        if let Some(field) = variant
            .legacy_ownership_fields()
            .iter()
            .find(|field| object.contains_key(**field))
        {
            info!(
                target: LOG_TARGET_SAVE,
                "save for {variant} carries legacy field {field}, starting fresh"
            );
            return SaveDecode::Legacy;
        }
        return malformed(format!("missing {OWNED_FIELD}"));
    }
    match Snapshot::deserialize(value) {
        Ok(snapshot) => SaveDecode::Found(snapshot),
        Err(err) => malformed(err.to_string()),
    }
}

/// Classify a raw stored string, as read from a key-value store.
#[must_use]
pub fn decode_str(raw: &str, variant: Variant) -> SaveDecode {
    if raw.trim().is_empty() {
        return SaveDecode::Absent;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => decode(&value, variant),
        Err(err) => malformed(err.to_string()),
    }
}

fn malformed(reason: String) -> SaveDecode {
    warn!(target: LOG_TARGET_SAVE, "discarding unreadable save: {reason}");
    SaveDecode::Malformed(reason)
}
