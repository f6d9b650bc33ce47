//! Fixed-size display shelf holding the player's stock.
use serde::{Deserialize, Serialize};

use crate::constants::SHELF_SLOTS;

/// Ten slots, each holding at most one catalog id. Always scanned by ascending index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    slots: [Option<String>; SHELF_SLOTS],
}

impl Shelf {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a shelf from arbitrary slot data, padding or truncating to the shelf size.
    #[must_use]
    pub fn from_slots<I>(slots: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut shelf = Self::default();
        for (slot, value) in shelf.slots.iter_mut().zip(slots) {
            *slot = value;
        }
        shelf
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&str> {
        self.slots.get(slot).and_then(Option::as_deref)
    }

    /// Lowest-index empty slot.
    #[must_use]
    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.first_empty().is_none()
    }

    #[must_use]
    pub fn contains(&self, item_id: &str) -> bool {
        self.occupied().any(|(_, id)| id == item_id)
    }

    /// Occupied slots as `(index, id)` pairs in ascending order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_deref().map(|id| (index, id)))
    }

    /// Ids on the shelf in slot order.
    #[must_use]
    pub fn item_ids(&self) -> Vec<&str> {
        self.occupied().map(|(_, id)| id).collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.occupied().count()
    }

    pub(crate) fn take(&mut self, slot: usize) -> Option<String> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Put an item in the first empty slot, returning its index.
    pub(crate) fn place(&mut self, item_id: String) -> Option<usize> {
        let slot = self.first_empty()?;
        self.slots[slot] = Some(item_id);
        Some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_fills_lowest_empty_slot() {
        let mut shelf = Shelf::from_slots([Some("a".into()), None, Some("c".into()), None]);
        assert_eq!(shelf.place("b".into()), Some(1));
        assert_eq!(shelf.place("d".into()), Some(3));
        assert_eq!(shelf.item_ids(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn from_slots_pads_and_truncates() {
        let short = Shelf::from_slots([Some("a".to_string())]);
        assert_eq!(short.slots().len(), SHELF_SLOTS);
        assert_eq!(short.count(), 1);

        let long = Shelf::from_slots((0..15).map(|i| Some(format!("i{i}"))));
        assert!(long.is_full());
        assert_eq!(long.get(9), Some("i9"));
        assert!(!long.contains("i10"));
    }

    #[test]
    fn take_clears_only_occupied_slots() {
        let mut shelf = Shelf::from_slots([Some("a".to_string())]);
        assert_eq!(shelf.take(1), None);
        assert_eq!(shelf.take(42), None);
        assert_eq!(shelf.take(0).as_deref(), Some("a"));
        assert_eq!(shelf.count(), 0);
        assert_eq!(shelf.first_empty(), Some(0));
    }
}
