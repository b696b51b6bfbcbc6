pub mod card;
pub mod dates;
pub mod rows;

use std::collections::BTreeMap;

use crate::config::Headings;
use crate::dom::Dom;
use crate::payload::Payload;
use crate::types::{DateTriple, Family, RateRecord, SchemaVersion, SofrTerm, TermKey, TreasuryTerm};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Could not locate {what} for '{heading}'")]
    NotFound { what: &'static str, heading: String },
    #[error("Could not extract {what} for '{heading}' from: {context}")]
    ExtractionError {
        what: &'static str,
        heading: String,
        context: String,
    },
    #[error("Header dates for '{heading}' are not distinct: {dates}")]
    DuplicateDates { heading: String, dates: DateTriple },
    #[error("{family} dataset is missing required key '{key}'")]
    IncompleteDataset { family: Family, key: &'static str },
    #[error("Unparseable value: '{0}'")]
    UnparseableValue(String),
}

impl ExtractError {
    pub(crate) fn not_found(what: &'static str, heading: &str) -> Self {
        ExtractError::NotFound {
            what,
            heading: heading.to_string(),
        }
    }

    pub(crate) fn extraction(what: &'static str, heading: &str, context: impl Into<String>) -> Self {
        ExtractError::ExtractionError {
            what,
            heading: heading.to_string(),
            context: context.into(),
        }
    }
}

/// One card's worth of validated data.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<K: TermKey> {
    pub updated: String,
    /// Only collected for [`SchemaVersion::Full`].
    pub header_dates: Option<DateTriple>,
    pub rates: BTreeMap<K, RateRecord>,
}

pub fn extract_dataset<D: Dom, K: TermKey>(
    dom: &D,
    heading: &str,
    schema: SchemaVersion,
) -> Result<Dataset<K>, ExtractError> {
    let card = card::locate_card(dom, heading)?;
    let table = card::locate_table(dom, card, heading)?;

    let header_dates = match schema {
        SchemaVersion::Full => {
            let triple = dates::extract_header_dates(dom, card, table, heading)?;
            dates::validate_distinct(&triple, heading)?;
            Some(triple)
        }
        SchemaVersion::Latest => None,
    };
    let updated = dates::extract_updated_date(dom, card, heading)?;

    let rows = rows::read_rows(dom, table);
    let rates = rows::build_rates::<K>(&rows, schema);
    rows::validate_complete(&rates)?;

    log::info!(
        "Extracted {} {} rates from '{}' (updated {})",
        rates.len(),
        K::FAMILY,
        heading,
        updated
    );

    Ok(Dataset {
        updated,
        header_dates,
        rates,
    })
}

/// Extracts both datasets and assembles the payload. Any failure aborts the whole thing.
pub fn extract_payload<D: Dom>(
    dom: &D,
    headings: &Headings,
    schema: SchemaVersion,
) -> Result<Payload, ExtractError> {
    let treasury = extract_dataset::<D, TreasuryTerm>(dom, &headings.treasury, schema)?;
    let sofr = extract_dataset::<D, SofrTerm>(dom, &headings.sofr, schema)?;
    Ok(Payload::assemble(treasury, sofr))
}
