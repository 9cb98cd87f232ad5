//! src/providers/mod.rs
//! ============================================================================
//! # Collaborator seams
//!
//! The assistant never talks to the network itself. Search results, admin
//! search results and the holdings list come from these traits; string
//! lookup goes through [`Translate`]. Implementations must be `Send + Sync`
//! because dispatches run on spawned tokio tasks.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::ProviderError,
    model::{DateRange, Holding, SearchResultItem, SearchResultSet},
};

pub mod fixture;
pub use fixture::FixtureProvider;

/// Primary search provider. Always queried for non-empty terms.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn fetch_search_results(&self, term: &str) -> Result<SearchResultSet, ProviderError>;
}

/// Auxiliary provider, only queried when the caller holds admin access.
#[async_trait]
pub trait AdminSearchProvider: Send + Sync {
    async fn fetch_admin_search_results(
        &self,
        term: &str,
    ) -> Result<Vec<SearchResultItem>, ProviderError>;
}

#[async_trait]
pub trait HoldingsProvider: Send + Sync {
    async fn fetch_holdings(&self, range: DateRange) -> Result<Vec<Holding>, ProviderError>;
}

/// Synchronous string lookup.
pub trait Translate: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// Returns every key unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translate for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Table-backed translator; unknown keys fall back to the key.
#[derive(Debug, Clone, Default)]
pub struct MapTranslator {
    entries: HashMap<String, String>,
}

impl MapTranslator {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Translate for MapTranslator {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
