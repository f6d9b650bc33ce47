//! Static catalog of tradeable items and the shop's price tiers.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    CHEAP_MAX_PRICE, MEDIUM_MAX_PRICE, SALE_MARKUP_DENOMINATOR, SALE_MARKUP_NUMERATOR,
};

/// Errors raised while loading or validating catalog data.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog item at position {0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate catalog id: {0}")]
    DuplicateId(String),
    #[error("catalog item {0} must have a positive price")]
    ZeroPrice(String),
    #[error("request at position {0} has no text")]
    EmptyRequest(usize),
}

/// A single book or game on sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    /// Author for books, studio for games.
    #[serde(default, alias = "author", alias = "developer")]
    pub creator: String,
    /// Purchase price in whole currency units.
    pub price: u32,
    #[serde(default)]
    pub genres: SmallVec<[String; 4]>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl CatalogItem {
    /// Price a customer pays for this item.
    #[must_use]
    pub fn sale_price(&self) -> u64 {
        sale_price(self.price)
    }

    #[must_use]
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    #[must_use]
    pub const fn tier(&self) -> PriceTier {
        PriceTier::from_price(self.price)
    }
}

/// Selling price for a purchase price: the floor of one and a half times the price.
#[must_use]
pub const fn sale_price(price: u32) -> u64 {
    (price as u64) * SALE_MARKUP_NUMERATOR / SALE_MARKUP_DENOMINATOR
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    items: Vec<CatalogItem>,
}

/// Validated, id-indexed catalog. Order follows the source data.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting empty ids, duplicates and zero prices.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] describing the first invalid item.
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if item.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(pos));
            }
            if item.price == 0 {
                return Err(CatalogError::ZeroPrice(item.id.clone()));
            }
            if index.insert(item.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Self { items, index })
    }

    /// Load a catalog from its JSON asset (`{"items": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the items fail validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.items)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.index.get(id).and_then(|&pos| self.items.get(pos))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sorted, de-duplicated genre list for the shop's genre filter.
    #[must_use]
    pub fn genres(&self) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|item| item.genres.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Price bracket used by the shop's price filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    /// Up to 200 inclusive.
    Cheap,
    /// 201 to 450 inclusive.
    Medium,
    /// Above 450.
    Expensive,
}

impl PriceTier {
    #[must_use]
    pub const fn from_price(price: u32) -> Self {
        if price <= CHEAP_MAX_PRICE {
            Self::Cheap
        } else if price <= MEDIUM_MAX_PRICE {
            Self::Medium
        } else {
            Self::Expensive
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cheap => "cheap",
            Self::Medium => "medium",
            Self::Expensive => "expensive",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cheap" => Ok(Self::Cheap),
            "medium" => Ok(Self::Medium),
            "expensive" => Ok(Self::Expensive),
            _ => Err(()),
        }
    }
}

/// Genre and price predicates applied to the shop view. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopFilter {
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub tier: Option<PriceTier>,
}

impl ShopFilter {
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    #[must_use]
    pub fn with_tier(mut self, tier: PriceTier) -> Self {
        self.tier = Some(tier);
        self
    }

    #[must_use]
    pub fn matches(&self, item: &CatalogItem) -> bool {
        let genre_ok = self
            .genre
            .as_deref()
            .is_none_or(|genre| genre.is_empty() || item.has_genre(genre));
        let tier_ok = self.tier.is_none_or(|tier| item.tier() == tier);
        genre_ok && tier_ok
    }
}
