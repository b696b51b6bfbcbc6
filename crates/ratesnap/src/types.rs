use std::{fmt::Display, str::FromStr, sync::LazyLock};

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::parser::normalize_whitespace;

static RE_TREASURY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*year").expect("invalid regex: treasury label")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Treasury,
    Sofr,
}

impl Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Treasury => write!(f, "Treasury"),
            Family::Sofr => write!(f, "SOFR"),
        }
    }
}

/// A closed set of canonical row keys for one dataset family.
///
/// `ALL` is in enumeration order, which is also the order used when reporting the
/// first missing key of an incomplete dataset.
pub trait TermKey: Copy + Ord + Display + Serialize + JsonSchema + 'static {
    const FAMILY: Family;
    const ALL: &'static [Self];

    /// Maps a free-text row label to a key, or `None` when the label is not one we track.
    fn from_label(label: &str) -> Option<Self>;

    fn key(&self) -> &'static str;
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum TreasuryTerm {
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYear,
    #[serde(rename = "3y")]
    ThreeYear,
    #[serde(rename = "5y")]
    FiveYear,
    #[serde(rename = "7y")]
    SevenYear,
    #[serde(rename = "10y")]
    TenYear,
    #[serde(rename = "30y")]
    ThirtyYear,
}

impl TermKey for TreasuryTerm {
    const FAMILY: Family = Family::Treasury;
    const ALL: &'static [Self] = &[
        TreasuryTerm::OneYear,
        TreasuryTerm::TwoYear,
        TreasuryTerm::ThreeYear,
        TreasuryTerm::FiveYear,
        TreasuryTerm::SevenYear,
        TreasuryTerm::TenYear,
        TreasuryTerm::ThirtyYear,
    ];

    fn from_label(label: &str) -> Option<Self> {
        let label = normalize_whitespace(label).to_lowercase();
        let caps = RE_TREASURY_LABEL.captures(&label)?;
        match caps[1].parse::<u32>().ok()? {
            1 => Some(TreasuryTerm::OneYear),
            2 => Some(TreasuryTerm::TwoYear),
            3 => Some(TreasuryTerm::ThreeYear),
            5 => Some(TreasuryTerm::FiveYear),
            7 => Some(TreasuryTerm::SevenYear),
            10 => Some(TreasuryTerm::TenYear),
            30 => Some(TreasuryTerm::ThirtyYear),
            _ => None,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            TreasuryTerm::OneYear => "1y",
            TreasuryTerm::TwoYear => "2y",
            TreasuryTerm::ThreeYear => "3y",
            TreasuryTerm::FiveYear => "5y",
            TreasuryTerm::SevenYear => "7y",
            TreasuryTerm::TenYear => "10y",
            TreasuryTerm::ThirtyYear => "30y",
        }
    }
}

impl Display for TreasuryTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.key())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum SofrTerm {
    #[serde(rename = "sofr")]
    Overnight,
    #[serde(rename = "30d-avg")]
    ThirtyDayAverage,
    #[serde(rename = "90d-avg")]
    NinetyDayAverage,
    #[serde(rename = "1m-term")]
    OneMonthTerm,
    #[serde(rename = "3m-term")]
    ThreeMonthTerm,
}

impl TermKey for SofrTerm {
    const FAMILY: Family = Family::Sofr;
    const ALL: &'static [Self] = &[
        SofrTerm::Overnight,
        SofrTerm::ThirtyDayAverage,
        SofrTerm::NinetyDayAverage,
        SofrTerm::OneMonthTerm,
        SofrTerm::ThreeMonthTerm,
    ];

    fn from_label(label: &str) -> Option<Self> {
        let label = normalize_whitespace(label).to_lowercase();
        let has = |a: &str, b: &str| label.contains(a) && label.contains(b);

        if label == "sofr" {
            Some(SofrTerm::Overnight)
        } else if has("30-day", "average") {
            Some(SofrTerm::ThirtyDayAverage)
        } else if has("90-day", "average") {
            Some(SofrTerm::NinetyDayAverage)
        } else if has("1-month", "term") {
            Some(SofrTerm::OneMonthTerm)
        } else if has("3-month", "term") {
            Some(SofrTerm::ThreeMonthTerm)
        } else {
            None
        }
    }

    fn key(&self) -> &'static str {
        match self {
            SofrTerm::Overnight => "sofr",
            SofrTerm::ThirtyDayAverage => "30d-avg",
            SofrTerm::NinetyDayAverage => "90d-avg",
            SofrTerm::OneMonthTerm => "1m-term",
            SofrTerm::ThreeMonthTerm => "3m-term",
        }
    }
}

impl Display for SofrTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid schema version '{0}'. Accepted values: 'full', 'latest'")]
pub struct SchemaVersionParseError(String);

/// Shape of every rate record in a payload, fixed once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    /// `{ "col1": n, "col2": n, "col3": n }` per key plus the column dates.
    #[default]
    Full,
    /// A bare number per key, taken from the first (most recent) column.
    Latest,
}

impl FromStr for SchemaVersion {
    type Err = SchemaVersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" | "three-column" => Ok(SchemaVersion::Full),
            "latest" | "latest-only" => Ok(SchemaVersion::Latest),
            _ => Err(SchemaVersionParseError(s.to_string())),
        }
    }
}

impl Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaVersion::Full => write!(f, "full"),
            SchemaVersion::Latest => write!(f, "latest"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnRates {
    pub col1: f64,
    pub col2: f64,
    pub col3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RateRecord {
    Latest(f64),
    Columns(ColumnRates),
}

impl RateRecord {
    /// The most recent value, i.e. the left-most column.
    pub fn latest(&self) -> f64 {
        match self {
            RateRecord::Latest(value) => *value,
            RateRecord::Columns(cols) => cols.col1,
        }
    }
}

impl Display for RateRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateRecord::Latest(value) => write!(f, "{value:>8.3}"),
            RateRecord::Columns(c) => {
                write!(f, "{:>8.3} {:>8.3} {:>8.3}", c.col1, c.col2, c.col3)
            }
        }
    }
}

/// The three column dates of a table, left to right as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateTriple {
    pub col1: String,
    pub col2: String,
    pub col3: String,
}

impl DateTriple {
    pub fn as_array(&self) -> [&str; 3] {
        [&self.col1, &self.col2, &self.col3]
    }
}

impl Display for DateTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | {} | {}", self.col1, self.col2, self.col3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_treasury_labels_map_to_every_key() {
        let cases = [
            ("1 Year", TreasuryTerm::OneYear),
            ("2Year", TreasuryTerm::TwoYear),
            ("3 year", TreasuryTerm::ThreeYear),
            ("5  YEAR", TreasuryTerm::FiveYear),
            ("7 Year Note", TreasuryTerm::SevenYear),
            (" 10 Year ", TreasuryTerm::TenYear),
            ("30\u{a0}Year Bond", TreasuryTerm::ThirtyYear),
        ];
        for (label, expected) in cases {
            assert_eq!(
                TreasuryTerm::from_label(label),
                Some(expected),
                "label {label:?} should map to {expected}"
            );
        }
    }

    #[test]
    fn test_treasury_unlisted_maturities_are_unrecognized() {
        assert_eq!(TreasuryTerm::from_label("20 Year"), None);
        assert_eq!(TreasuryTerm::from_label("6 Month"), None);
        assert_eq!(TreasuryTerm::from_label("Year 10"), None);
        assert_eq!(TreasuryTerm::from_label(""), None);
    }

    #[test]
    fn test_sofr_labels_map_to_every_key() {
        let cases = [
            ("SOFR", SofrTerm::Overnight),
            ("30-Day Average SOFR", SofrTerm::ThirtyDayAverage),
            ("90-Day  Average SOFR", SofrTerm::NinetyDayAverage),
            ("1-Month Term SOFR", SofrTerm::OneMonthTerm),
            ("CME 3-Month Term SOFR", SofrTerm::ThreeMonthTerm),
        ];
        for (label, expected) in cases {
            assert_eq!(
                SofrTerm::from_label(label),
                Some(expected),
                "label {label:?} should map to {expected}"
            );
        }
    }

    #[test]
    fn test_sofr_unrelated_labels_are_unrecognized() {
        assert_eq!(SofrTerm::from_label("Fed Funds"), None);
        assert_eq!(SofrTerm::from_label("SOFR Index"), None);
        assert_eq!(SofrTerm::from_label("180-Day Average SOFR"), None);
        assert_eq!(SofrTerm::from_label("6-Month Term SOFR"), None);
        assert_eq!(TreasuryTerm::from_label("Fed Funds"), None);
    }

    #[test]
    fn test_term_keys_serialize_as_canonical_strings() {
        for term in TreasuryTerm::ALL {
            let json = serde_json::to_string(term).unwrap();
            assert_eq!(json, format!("\"{}\"", term.key()));
        }
        for term in SofrTerm::ALL {
            let json = serde_json::to_string(term).unwrap();
            assert_eq!(json, format!("\"{}\"", term.key()));
        }
    }

    #[test]
    fn test_rate_record_shapes() {
        let latest = serde_json::to_value(RateRecord::Latest(3.65)).unwrap();
        assert_eq!(latest, serde_json::json!(3.65));

        let cols = RateRecord::Columns(ColumnRates {
            col1: 4.1,
            col2: 4.2,
            col3: 4.3,
        });
        assert_eq!(
            serde_json::to_value(cols).unwrap(),
            serde_json::json!({"col1": 4.1, "col2": 4.2, "col3": 4.3})
        );
        assert_eq!(cols.latest(), 4.1);
    }

    #[test]
    fn test_schema_version_from_str() {
        assert_eq!("full".parse::<SchemaVersion>().unwrap(), SchemaVersion::Full);
        assert_eq!("latest".parse::<SchemaVersion>().unwrap(), SchemaVersion::Latest);
        assert!("weekly".parse::<SchemaVersion>().is_err());
    }
}
