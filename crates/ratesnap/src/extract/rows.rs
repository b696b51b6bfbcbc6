use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::ExtractError;
use crate::dom::Dom;
use crate::parser::parse_rate;
use crate::types::{ColumnRates, RateRecord, SchemaVersion, TermKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub values: [String; 3],
}

/// Body rows with at least four cells; anything shorter is a separator or caption row.
pub fn read_rows<'a, D: Dom>(dom: &'a D, table: D::Node<'a>) -> Vec<Row> {
    dom.body_rows(table)
        .into_iter()
        .filter_map(|cells| {
            if cells.len() < 4 {
                return None;
            }
            let mut cells = cells.into_iter();
            Some(Row {
                label: cells.next()?,
                values: [cells.next()?, cells.next()?, cells.next()?],
            })
        })
        .collect()
}

fn parse_record(row: &Row, schema: SchemaVersion) -> Result<RateRecord, ExtractError> {
    let [col1, col2, col3] = &row.values;
    match schema {
        SchemaVersion::Latest => Ok(RateRecord::Latest(parse_rate(col1)?)),
        SchemaVersion::Full => Ok(RateRecord::Columns(ColumnRates {
            col1: parse_rate(col1)?,
            col2: parse_rate(col2)?,
            col3: parse_rate(col3)?,
        })),
    }
}

/// Maps rows onto `K` keys, dropping unrecognized labels and rows with unparseable values.
/// When two rows map to the same key the first one is kept.
pub fn build_rates<K: TermKey>(rows: &[Row], schema: SchemaVersion) -> BTreeMap<K, RateRecord> {
    let mut rates = BTreeMap::new();

    for row in rows {
        let Some(key) = K::from_label(&row.label) else {
            log::debug!("Skipping unrecognized {} row '{}'", K::FAMILY, row.label);
            continue;
        };

        let record = match parse_record(row, schema) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Dropping {} row '{}': {}", K::FAMILY, row.label, e);
                continue;
            }
        };

        match rates.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(_) => {
                log::warn!(
                    "Ignoring repeated {} row '{}' for key {}",
                    K::FAMILY,
                    row.label,
                    key
                );
            }
        }
    }

    rates
}

pub fn validate_complete<K: TermKey>(rates: &BTreeMap<K, RateRecord>) -> Result<(), ExtractError> {
    match K::ALL.iter().find(|key| !rates.contains_key(*key)) {
        Some(key) => Err(ExtractError::IncompleteDataset {
            family: K::FAMILY,
            key: key.key(),
        }),
        None => Ok(()),
    }
}
