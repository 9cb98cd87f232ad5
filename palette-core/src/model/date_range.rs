//!
//!  ``src/model/date_range.rs``
//!

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::providers::Translate;

/// Range codes understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DateRange {
    #[serde(rename = "1d")]
    Today,

    #[serde(rename = "wtd")]
    WeekToDate,

    #[serde(rename = "mtd")]
    MonthToDate,

    #[serde(rename = "ytd")]
    YearToDate,

    #[serde(rename = "1y")]
    OneYear,

    #[serde(rename = "5y")]
    FiveYears,

    #[default]
    #[serde(rename = "max")]
    Max,
}

impl DateRange {
    pub const ALL: [Self; 7] = [
        Self::Today,
        Self::WeekToDate,
        Self::MonthToDate,
        Self::YearToDate,
        Self::OneYear,
        Self::FiveYears,
        Self::Max,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Today => "1d",
            Self::WeekToDate => "wtd",
            Self::MonthToDate => "mtd",
            Self::YearToDate => "ytd",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRangeOption {
    pub label: String,
    pub value: DateRange,
}

/// The fixed, ordered date range catalog with translated labels.
pub fn date_range_options(t: &dyn Translate) -> Vec<DateRangeOption> {
    let to_date = |long: &str, short: &str| format!("{} ({})", t.translate(long), t.translate(short));
    let span = |n: u8, unit: &str, short: &str| {
        format!("{n} {} ({})", t.translate(unit), t.translate(short))
    };

    DateRange::ALL
        .into_iter()
        .map(|value| {
            let label = match value {
                DateRange::Today => t.translate("Today"),
                DateRange::WeekToDate => to_date("Week to date", "WTD"),
                DateRange::MonthToDate => to_date("Month to date", "MTD"),
                DateRange::YearToDate => to_date("Year to date", "YTD"),
                DateRange::OneYear => span(1, "year", "1Y"),
                DateRange::FiveYears => span(5, "years", "5Y"),
                DateRange::Max => t.translate("Max"),
            };
            DateRangeOption { label, value }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::IdentityTranslator;

    #[test]
    fn catalog_is_ordered_and_labelled() {
        let options = date_range_options(&IdentityTranslator);

        let codes: Vec<&str> = options.iter().map(|o| o.value.code()).collect();
        assert_eq!(codes, ["1d", "wtd", "mtd", "ytd", "1y", "5y", "max"]);
        assert_eq!(options[1].label, "Week to date (WTD)");
        assert_eq!(options[5].label, "5 years (5Y)");
    }

    #[test]
    fn serde_uses_range_codes() {
        let range: DateRange = serde_json::from_str("\"ytd\"").unwrap();
        assert_eq!(range, DateRange::YearToDate);
        assert_eq!(serde_json::to_string(&DateRange::FiveYears).unwrap(), "\"5y\"");
    }
}
