//! JSON-backed provider used by the `palette` binary and tests.
//!
//! Fixture layout:
//! ```json
//! {
//!   "assetProfiles": [{ "symbol": "AAPL", "name": "Apple Inc." }],
//!   "holdings":      [{ "symbol": "VT",   "name": "Vanguard Total World" }],
//!   "user":          { "accounts": [], "tags": [], "settings": {} }
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{AdminSearchProvider, HoldingsProvider, SearchProvider};
use crate::{
    error::{AppError, ProviderError},
    model::{DateRange, Holding, SearchResultItem, SearchResultSet, User},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureProvider {
    #[serde(default)]
    asset_profiles: Vec<SearchResultItem>,

    #[serde(default)]
    holdings: Vec<SearchResultItem>,

    #[serde(default)]
    user: User,
}

impl FixtureProvider {
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(text)?)
    }

    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AppError::ConfigIo {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&text)
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    fn matching(items: &[SearchResultItem], term: &str) -> Vec<SearchResultItem> {
        let needle = term.to_lowercase();
        items
            .iter()
            .filter(|item| {
                item.symbol.to_lowercase().contains(&needle)
                    || item.name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SearchProvider for FixtureProvider {
    async fn fetch_search_results(&self, term: &str) -> Result<SearchResultSet, ProviderError> {
        let set = SearchResultSet {
            asset_profiles: Self::matching(&self.asset_profiles, term),
            holdings: Self::matching(&self.holdings, term),
        };
        debug!("Fixture search '{}' matched {} row(s)", term, set.len());
        Ok(set)
    }
}

#[async_trait]
impl AdminSearchProvider for FixtureProvider {
    async fn fetch_admin_search_results(
        &self,
        term: &str,
    ) -> Result<Vec<SearchResultItem>, ProviderError> {
        Ok(Self::matching(&self.asset_profiles, term))
    }
}

#[async_trait]
impl HoldingsProvider for FixtureProvider {
    async fn fetch_holdings(&self, _range: DateRange) -> Result<Vec<Holding>, ProviderError> {
        Ok(self
            .holdings
            .iter()
            .map(|item| Holding {
                symbol: item.symbol.clone(),
                name: item.name.clone(),
                data_source: item.data_source.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "assetProfiles": [
            {"symbol": "AAPL", "name": "Apple Inc."},
            {"symbol": "MSFT", "name": "Microsoft"}
        ],
        "holdings": [{"symbol": "AAPL", "name": "Apple Inc."}]
    }"#;

    #[tokio::test]
    async fn search_matches_symbol_and_name_case_insensitively() {
        let provider = FixtureProvider::from_json(FIXTURE).unwrap();

        let by_symbol = provider.fetch_search_results("aap").await.unwrap();
        assert_eq!(by_symbol.asset_profiles.len(), 1);
        assert_eq!(by_symbol.holdings.len(), 1);

        let by_name = provider.fetch_search_results("micro").await.unwrap();
        assert_eq!(by_name.asset_profiles[0].symbol, "MSFT");
        assert!(by_name.holdings.is_empty());
    }

    #[tokio::test]
    async fn holdings_come_from_fixture_rows() {
        let provider = FixtureProvider::from_json(FIXTURE).unwrap();
        let holdings = provider.fetch_holdings(DateRange::Max).await.unwrap();

        assert_eq!(holdings, vec![Holding::new("AAPL", "Apple Inc.")]);
    }

    #[test]
    fn rejects_malformed_fixture() {
        let err = FixtureProvider::from_json("{\"holdings\": 3}").unwrap_err();
        assert!(matches!(err, AppError::Serde(_)));
    }
}
