//!
//!  ``src/model/filter.rs``
//!

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::providers::Translate;

/// Filter category. The four categories are mutually exclusive axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    Account,
    AssetClass,
    Tag,
    Symbol,
}

impl FilterType {
    /// Emission order of the apply action.
    pub const ORDER: [Self; 4] = [Self::Account, Self::AssetClass, Self::Tag, Self::Symbol];

    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::AssetClass => "assetClass",
            Self::Tag => "tag",
            Self::Symbol => "holding",
        }
    }
}

/// Current selection of one category; `id == None` means "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(rename = "type")]
    pub filter_type: FilterType,

    pub id: Option<CompactString>,
}

/// A selectable entry offered to the user for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub id: CompactString,
    pub label: String,

    #[serde(rename = "type")]
    pub filter_type: FilterType,
}

/// Asset class catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    AlternativeInvestment,
    Commodity,
    Equity,
    FixedIncome,
    Liquidity,
    RealEstate,
}

impl AssetClass {
    pub const ALL: [Self; 6] = [
        Self::AlternativeInvestment,
        Self::Commodity,
        Self::Equity,
        Self::FixedIncome,
        Self::Liquidity,
        Self::RealEstate,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::AlternativeInvestment => "ALTERNATIVE_INVESTMENT",
            Self::Commodity => "COMMODITY",
            Self::Equity => "EQUITY",
            Self::FixedIncome => "FIXED_INCOME",
            Self::Liquidity => "LIQUIDITY",
            Self::RealEstate => "REAL_ESTATE",
        }
    }
}

/// Every asset class as a filter option, labelled through `t`.
pub fn asset_class_options(t: &dyn Translate) -> Vec<FilterOption> {
    AssetClass::ALL
        .into_iter()
        .map(|class| FilterOption {
            id: CompactString::const_new(class.id()),
            label: t.translate(class.id()),
            filter_type: FilterType::AssetClass,
        })
        .collect()
}
