use std::collections::BTreeMap;
use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::extract::Dataset;
use crate::types::{DateTriple, RateRecord, SofrTerm, TermKey, TreasuryTerm};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UpdatedDates {
    pub treasury: String,
    pub sofr: String,
}

/// The document POSTed to the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Payload {
    pub dates: UpdatedDates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treasury_dates: Option<DateTriple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sofr_dates: Option<DateTriple>,
    pub treasury: BTreeMap<TreasuryTerm, RateRecord>,
    pub sofr: BTreeMap<SofrTerm, RateRecord>,
}

impl Payload {
    pub fn assemble(treasury: Dataset<TreasuryTerm>, sofr: Dataset<SofrTerm>) -> Self {
        Self {
            dates: UpdatedDates {
                treasury: treasury.updated,
                sofr: sofr.updated,
            },
            treasury_dates: treasury.header_dates,
            sofr_dates: sofr.header_dates,
            treasury: treasury.rates,
            sofr: sofr.rates,
        }
    }

    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Payload)
    }
}

fn write_dataset<K: TermKey>(
    f: &mut std::fmt::Formatter<'_>,
    updated: &str,
    dates: Option<&DateTriple>,
    rates: &BTreeMap<K, RateRecord>,
) -> std::fmt::Result {
    writeln!(f, "┌─ {} ─ updated {}", K::FAMILY, updated)?;
    if let Some(dates) = dates {
        writeln!(f, "│  Columns: {}", dates)?;
    }
    for (key, record) in rates {
        writeln!(f, "│  {:<8} {}", key, record)?;
    }
    writeln!(f, "└─ {} term(s)", rates.len())
}

impl Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_dataset(
            f,
            &self.dates.treasury,
            self.treasury_dates.as_ref(),
            &self.treasury,
        )?;
        writeln!(f)?;
        write_dataset(f, &self.dates.sofr, self.sofr_dates.as_ref(), &self.sofr)
    }
}
