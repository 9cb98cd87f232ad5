//!
//!  ``src/model/holding.rs``
//!

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A position the user owns, as offered by the holding filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: CompactString,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<CompactString>,
}

impl Holding {
    #[must_use]
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            name: name.to_string(),
            data_source: None,
        }
    }
}
