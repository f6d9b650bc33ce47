//! Shop Trader Game Engine
//!
//! Platform-agnostic core logic for the Shop Trader shop simulation (book and
//! game trader skins). This crate holds every rule of the game without UI or
//! platform-specific dependencies.

pub mod catalog;
pub mod constants;
pub mod controller;
pub mod persistence;
pub mod platform;
pub mod requests;
pub mod result;
pub mod rng;
pub mod session;
pub mod shelf;
pub mod shop;
pub mod snapshot;
pub mod state;
pub mod variant;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, CatalogItem, PriceTier, ShopFilter, sale_price};
pub use controller::{BootOutcome, ShopController};
pub use persistence::{KeyValueStore, MemoryStore, SaveAdapter, SaveOutcome, StorageError};
pub use platform::{
    CloudAccess, MockPlatform, Platform, PlatformCall, PlatformError, run_interstitial,
};
pub use requests::{Customer, Request, RequestPool, generate_customers};
pub use result::{RunSummary, VictoryReason};
pub use rng::{CountingRng, RandomSource, RngBundle, ScriptedRandom};
pub use session::{
    Action, DayState, Effect, Effects, Phase, ReduceCtx, Session, Transition, reduce,
};
pub use shelf::Shelf;
pub use shop::{ListingStatus, ShopListing, shop_listing};
pub use snapshot::{SaveDecode, Snapshot, decode, decode_str, restore, snapshot};
pub use state::{GameState, InvariantViolation, PurchaseRejection, Sale};
pub use variant::Variant;

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the item catalog of a variant
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_catalog(&self, variant: Variant) -> Result<Catalog, Self::Error>;

    /// Load the customer request pool of a variant, validated against its catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the requests cannot be loaded or parsed.
    fn load_requests(&self, variant: Variant, catalog: &Catalog)
    -> Result<RequestPool, Self::Error>;
}

/// Entry point tying a data loader to a local key-value store
pub struct ShopEngine<L, S>
where
    L: DataLoader,
    S: KeyValueStore + Clone,
{
    data_loader: L,
    storage: S,
}

impl<L, S> ShopEngine<L, S>
where
    L: DataLoader,
    S: KeyValueStore + Clone,
{
    /// Create a new engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Load a variant's data and build a controller around it. The controller
    /// is not booted yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or request data cannot be loaded.
    pub fn create_controller<P: Platform>(
        &self,
        variant: Variant,
        platform: P,
        seed: u64,
    ) -> Result<ShopController<P, S>, L::Error> {
        let catalog = self.data_loader.load_catalog(variant)?;
        let requests = self.data_loader.load_requests(variant, &catalog)?;
        Ok(ShopController::new(
            variant,
            catalog,
            requests,
            platform,
            self.storage.clone(),
            seed,
        ))
    }

    /// Read the locally stored progress of a variant, re-resolved against
    /// fresh catalog data
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the catalog cannot be read.
    pub fn load_local_state(&self, variant: Variant) -> Result<Option<GameState>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let Some(raw) = self.storage.get(variant.storage_key())? else {
            return Ok(None);
        };
        let Some(saved) = decode_str(&raw, variant).into_snapshot() else {
            return Ok(None);
        };
        let catalog = self.data_loader.load_catalog(variant).map_err(Into::into)?;
        Ok(Some(restore(&saved, &catalog)))
    }
}
