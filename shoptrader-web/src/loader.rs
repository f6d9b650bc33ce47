//! Catalog and request data bundled into the wasm binary.
use shoptrader_game::{Catalog, CatalogError, DataLoader, RequestPool, Variant};

/// Data loader serving the JSON assets under `static/assets/data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

#[derive(Debug, thiserror::Error)]
pub enum WebDataError {
    #[error("{variant} {asset} is invalid: {source}")]
    Asset {
        variant: Variant,
        asset: &'static str,
        #[source]
        source: CatalogError,
    },
}

impl StaticDataLoader {
    /// Raw `(catalog, requests)` JSON of a variant.
    #[must_use]
    pub const fn assets(variant: Variant) -> (&'static str, &'static str) {
        match variant {
            Variant::BookTrader => (
                include_str!("../static/assets/data/book_trader/catalog.json"),
                include_str!("../static/assets/data/book_trader/requests.json"),
            ),
            Variant::GameTrader => (
                include_str!("../static/assets/data/game_trader/catalog.json"),
                include_str!("../static/assets/data/game_trader/requests.json"),
            ),
        }
    }
}

impl DataLoader for StaticDataLoader {
    type Error = WebDataError;

    fn load_catalog(&self, variant: Variant) -> Result<Catalog, Self::Error> {
        let (json, _) = Self::assets(variant);
        Catalog::from_json(json).map_err(|source| WebDataError::Asset {
            variant,
            asset: "catalog",
            source,
        })
    }

    fn load_requests(
        &self,
        variant: Variant,
        catalog: &Catalog,
    ) -> Result<RequestPool, Self::Error> {
        let (_, json) = Self::assets(variant);
        RequestPool::from_json(json, catalog).map_err(|source| WebDataError::Asset {
            variant,
            asset: "requests",
            source,
        })
    }
}
