//!
//!  ``src/model/user.rs``
//!
//!  Host-supplied user object and permission flags. The host owns
//!  persistence; the assistant only reads these.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::date_range::DateRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: CompactString,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: CompactString,
    pub name: String,

    /// Only tags attached to at least one activity are offered as filters.
    #[serde(default)]
    pub is_used: bool,
}

/// Persisted settings relevant to the assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "dateRange", default)]
    pub date_range: Option<DateRange>,

    #[serde(rename = "filters.accounts", default)]
    pub filter_accounts: Vec<CompactString>,

    #[serde(rename = "filters.assetClasses", default)]
    pub filter_asset_classes: Vec<CompactString>,

    #[serde(rename = "filters.tags", default)]
    pub filter_tags: Vec<CompactString>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub accounts: Vec<Account>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub settings: UserSettings,
}

/// Permission and device flags supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub access_admin_control: bool,
    pub change_date_range: bool,
    pub change_filters: bool,

    #[serde(default)]
    pub device_type: String,
}

impl Permissions {
    /// Every permission granted, as for an administrator on desktop.
    #[must_use]
    pub fn all() -> Self {
        Self {
            access_admin_control: true,
            change_date_range: true,
            change_filters: true,
            device_type: "desktop".to_string(),
        }
    }
}
