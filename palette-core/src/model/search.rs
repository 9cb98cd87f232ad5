//!
//!  ``src/model/search.rs``
//!

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One row returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub symbol: CompactString,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CompactString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<CompactString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_sub_class: Option<String>,
}

impl SearchResultItem {
    #[must_use]
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            name: name.to_string(),
            currency: None,
            data_source: None,
            asset_sub_class: None,
        }
    }
}

/// Asset profile match. Shares the row shape with holdings.
pub type AssetProfileHit = SearchResultItem;

/// Holding match.
pub type HoldingHit = SearchResultItem;

/// Result set as delivered by the primary provider. Insertion order is
/// the provider's order and is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultSet {
    #[serde(default)]
    pub asset_profiles: Vec<AssetProfileHit>,

    #[serde(default)]
    pub holdings: Vec<HoldingHit>,
}

impl SearchResultSet {
    /// The canonical empty result set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            asset_profiles: Vec::new(),
            holdings: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.asset_profiles.is_empty() && self.holdings.is_empty()
    }

    /// Number of rows the view renders: asset profiles first, then holdings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.asset_profiles.len() + self.holdings.len()
    }

    /// Rows in render order.
    pub fn rows(&self) -> impl Iterator<Item = &SearchResultItem> {
        self.asset_profiles.iter().chain(self.holdings.iter())
    }
}

/// What the view observes: the current result set and the loading flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnapshot {
    pub results: SearchResultSet,
    pub is_loading: bool,
}
