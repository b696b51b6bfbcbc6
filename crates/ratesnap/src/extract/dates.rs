use super::ExtractError;
use crate::dom::Dom;
use crate::parser::{find_dates, first_date};
use crate::types::DateTriple;

/// Characters after the last "Updated" that may hold the as-of date.
pub const UPDATED_WINDOW: usize = 140;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDateStrategy {
    /// Dates printed in the table's own header cells.
    FormalHeaders,
    /// Dates printed as free text above the table, inside the card.
    PrecedingText,
}

/// Tried in order; the first strategy that yields three dates wins.
pub const HEADER_DATE_STRATEGIES: &[HeaderDateStrategy] = &[
    HeaderDateStrategy::FormalHeaders,
    HeaderDateStrategy::PrecedingText,
];

impl HeaderDateStrategy {
    fn apply<'a, D: Dom>(self, dom: &'a D, card: D::Node<'a>, table: D::Node<'a>) -> Vec<String> {
        match self {
            HeaderDateStrategy::FormalHeaders => {
                let cells = dom.header_cells(table);
                cells.iter().flat_map(|c| find_dates(c)).take(3).collect()
            }
            HeaderDateStrategy::PrecedingText => {
                // Only text above the table: the body and the updated footer carry dates too.
                let text = dom.texts_before(card, table).join(" ");
                let mut dates: Vec<String> = Vec::with_capacity(3);
                for date in find_dates(&text) {
                    if !dates.contains(&date) {
                        dates.push(date);
                    }
                    if dates.len() == 3 {
                        break;
                    }
                }
                dates
            }
        }
    }
}

fn into_triple(dates: Vec<String>) -> Option<DateTriple> {
    let [col1, col2, col3]: [String; 3] = dates.try_into().ok()?;
    Some(DateTriple { col1, col2, col3 })
}

pub fn extract_header_dates<'a, D: Dom>(
    dom: &'a D,
    card: D::Node<'a>,
    table: D::Node<'a>,
    heading: &str,
) -> Result<DateTriple, ExtractError> {
    let mut found = Vec::new();
    for strategy in HEADER_DATE_STRATEGIES {
        found = strategy.apply(dom, card, table);
        if let Some(triple) = into_triple(found.clone()) {
            log::debug!("Header dates for '{}' via {:?}: {}", heading, strategy, triple);
            return Ok(triple);
        }
        log::debug!(
            "{:?} found {} header date(s) for '{}'",
            strategy,
            found.len(),
            heading
        );
    }

    Err(ExtractError::extraction(
        "three header dates",
        heading,
        format!("only found {:?}", found),
    ))
}

pub fn validate_distinct(dates: &DateTriple, heading: &str) -> Result<(), ExtractError> {
    let [a, b, c] = dates.as_array();
    if a == b || a == c || b == c {
        return Err(ExtractError::DuplicateDates {
            heading: heading.to_string(),
            dates: dates.clone(),
        });
    }
    Ok(())
}

/// The card's as-of date, looked for right after its last "Updated" label.
///
/// `card` must be scoped to a single dataset, otherwise the last "Updated" on the page may
/// belong to a neighbouring card.
pub fn extract_updated_date<'a, D: Dom>(
    dom: &'a D,
    card: D::Node<'a>,
    heading: &str,
) -> Result<String, ExtractError> {
    const LABEL: &str = "updated";

    let text = dom.text_content(card);
    let window: String = match text.to_ascii_lowercase().rfind(LABEL) {
        Some(pos) => text[pos + LABEL.len()..].chars().take(UPDATED_WINDOW).collect(),
        None => {
            log::debug!("No 'Updated' label in '{}' card, scanning all of it", heading);
            text
        }
    };

    first_date(&window).ok_or_else(|| ExtractError::extraction("updated date", heading, window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlPage;
    use crate::extract::card::{locate_card, locate_table};
    use std::fs;

    fn header_dates_for(page: &HtmlPage, heading: &str) -> Result<DateTriple, ExtractError> {
        let card = locate_card(page, heading)?;
        let table = locate_table(page, card, heading)?;
        extract_header_dates(page, card, table, heading)
    }

    #[test]
    fn test_header_dates_from_formal_headers() {
        let html = fs::read_to_string("fixtures/two_cards_header_dates.html")
            .expect("Failed to read fixture");
        let page = HtmlPage::parse(&html);

        let dates = header_dates_for(&page, "U.S. Treasuries").unwrap();
        assert_eq!(dates.as_array(), ["20 Jan 2026", "16 Jan 2026", "15 Jan 2026"]);

        let dates = header_dates_for(&page, "SOFR Rates").unwrap();
        assert_eq!(dates.as_array(), ["20 Jan 2026", "16 Jan 2026", "15 Jan 2026"]);
    }

    #[test]
    fn test_header_dates_fall_back_to_preceding_text_in_encounter_order() {
        let html = fs::read_to_string("fixtures/free_text_dates.html")
            .expect("Failed to read fixture");
        let page = HtmlPage::parse(&html);

        let dates = header_dates_for(&page, "U.S. Treasuries").unwrap();
        assert_eq!(
            dates,
            DateTriple {
                col1: "16 Jan 2026".into(),
                col2: "9 Jan 2026".into(),
                col3: "2 Jan 2026".into(),
            }
        );
    }

    #[test]
    fn test_header_dates_ignore_table_body_and_footer() {
        let page = HtmlPage::parse(
            r#"<div class="card">
                 <h3>U.S. Treasuries</h3>
                 <p>16 Jan 2026</p>
                 <table><tbody>
                   <tr><td>1 Year</td><td>9 Jan 2026</td><td>2 Jan 2026</td><td>1</td></tr>
                 </tbody></table>
                 <p>Updated 21 Jan 2026</p>
               </div>"#,
        );
        let err = header_dates_for(&page, "U.S. Treasuries").expect_err("only one date above");
        assert!(matches!(err, ExtractError::ExtractionError { .. }));
        assert!(err.to_string().contains("16 Jan 2026"));
    }

    #[test]
    fn test_preceding_text_deduplicates() {
        let page = HtmlPage::parse(
            r#"<div>
                 <h3>SOFR Rates</h3>
                 <span>16 Jan 2026</span><span>16 Jan 2026</span>
                 <span>15 Jan 2026</span><span>14 Jan 2026</span>
                 <table><tr><td>SOFR</td></tr></table>
               </div>"#,
        );
        let dates = header_dates_for(&page, "SOFR Rates").unwrap();
        assert_eq!(dates.as_array(), ["16 Jan 2026", "15 Jan 2026", "14 Jan 2026"]);
    }

    #[test]
    fn test_formal_headers_keep_duplicates_for_validation() {
        let page = HtmlPage::parse(
            r#"<div>
                 <h3>SOFR Rates</h3>
                 <table>
                   <thead><tr><th>Rate</th><th>16 Jan 2026</th><th>16 Jan 2026</th><th>9 Jan 2026</th></tr></thead>
                   <tbody><tr><td>SOFR</td><td>1</td><td>2</td><td>3</td></tr></tbody>
                 </table>
               </div>"#,
        );
        let dates = header_dates_for(&page, "SOFR Rates").unwrap();
        let err = validate_distinct(&dates, "SOFR Rates").expect_err("duplicates");
        assert!(matches!(err, ExtractError::DuplicateDates { .. }));
    }

    #[test]
    fn test_validate_distinct() {
        let dup = DateTriple {
            col1: "16 Jan 2026".into(),
            col2: "16 Jan 2026".into(),
            col3: "9 Jan 2026".into(),
        };
        assert!(matches!(
            validate_distinct(&dup, "x"),
            Err(ExtractError::DuplicateDates { .. })
        ));

        let ok = DateTriple {
            col1: "16 Jan 2026".into(),
            col2: "9 Jan 2026".into(),
            col3: "2 Jan 2026".into(),
        };
        assert!(validate_distinct(&ok, "x").is_ok());
    }

    #[test]
    fn test_updated_date_is_scoped_to_each_card() {
        let html = fs::read_to_string("fixtures/two_cards_header_dates.html")
            .expect("Failed to read fixture");
        let page = HtmlPage::parse(&html);

        let treasury = locate_card(&page, "U.S. Treasuries").unwrap();
        let sofr = locate_card(&page, "SOFR Rates").unwrap();

        assert_eq!(
            extract_updated_date(&page, treasury, "U.S. Treasuries").unwrap(),
            "21 Jan 2026"
        );
        assert_eq!(
            extract_updated_date(&page, sofr, "SOFR Rates").unwrap(),
            "20 Jan 2026"
        );
    }

    #[test]
    fn test_updated_date_uses_last_label() {
        let page = HtmlPage::parse(
            r#"<div>
                 <p>Recently updated methodology (see 1 Mar 2025 notice)</p>
                 <table><tr><td>x</td></tr></table>
                 <footer>Last Updated: 21 Jan 2026 | 18:45 ET</footer>
               </div>"#,
        );
        let card = page.find_by_text("Last Updated").and_then(|f| page.parent(f)).unwrap();
        assert_eq!(extract_updated_date(&page, card, "x").unwrap(), "21 Jan 2026");
    }

    #[test]
    fn test_updated_date_window_is_bounded() {
        let filler = "x".repeat(UPDATED_WINDOW + 10);
        let page = HtmlPage::parse(&format!(
            "<div><p>Updated {filler} 21 Jan 2026</p><table></table></div>"
        ));
        let card = page.find_by_text("Updated").and_then(|p| page.parent(p)).unwrap();
        let err = extract_updated_date(&page, card, "Far").expect_err("date outside window");
        assert!(matches!(err, ExtractError::ExtractionError { what: "updated date", .. }));
    }

    #[test]
    fn test_updated_date_without_label_scans_whole_card() {
        let page = HtmlPage::parse(
            "<div><h3>SOFR Rates</h3><table></table><small>As of 20 Jan 2026</small></div>",
        );
        let card = locate_card(&page, "SOFR Rates").unwrap();
        assert_eq!(
            extract_updated_date(&page, card, "SOFR Rates").unwrap(),
            "20 Jan 2026"
        );
    }

    #[test]
    fn test_hidden_stale_card_is_skipped() {
        let page = HtmlPage::parse(
            r#"<main>
                 <div hidden>
                   <div class="card">
                     <h2>U.S. Treasuries</h2>
                     <table><tbody><tr><td>1 Year</td><td>1</td><td>2</td><td>3</td></tr></tbody></table>
                     <small>Updated 1 Jan 2020</small>
                   </div>
                 </div>
                 <div class="card">
                   <h2>U.S. Treasuries</h2>
                   <table><tbody><tr><td>1 Year</td><td>1</td><td>2</td><td>3</td></tr></tbody></table>
                   <small>Updated 21 Jan 2026 | 18:45 ET</small>
                 </div>
               </main>"#,
        );
        let card = locate_card(&page, "U.S. Treasuries").unwrap();
        assert_eq!(
            extract_updated_date(&page, card, "U.S. Treasuries").unwrap(),
            "21 Jan 2026"
        );
    }

    #[test]
    fn test_too_few_formal_header_dates_fall_back_to_preceding_text() {
        let page = HtmlPage::parse(
            r#"<div>
                 <h3>U.S. Treasuries</h3>
                 <p>Columns: 16 Jan 2026, 9 Jan 2026, 2 Jan 2026</p>
                 <table>
                   <thead><tr><th>Maturity</th><th>20 Jan 2026</th><th>1W</th><th>15 Jan 2026</th></tr></thead>
                   <tbody><tr><td>1 Year</td><td>1</td><td>2</td><td>3</td></tr></tbody>
                 </table>
               </div>"#,
        );
        let dates = header_dates_for(&page, "U.S. Treasuries").unwrap();
        assert_eq!(dates.as_array(), ["16 Jan 2026", "9 Jan 2026", "2 Jan 2026"]);
    }

    #[test]
    fn test_header_dates_from_thead_td_cells() {
        let page = HtmlPage::parse(
            r#"<div>
                 <h3>SOFR Rates</h3>
                 <p>As published 1 Feb 2026</p>
                 <table>
                   <thead><tr><td>Rate</td><td>20 Jan 2026</td><td>16 Jan 2026</td><td>15 Jan 2026</td></tr></thead>
                   <tbody><tr><td>SOFR</td><td>1</td><td>2</td><td>3</td></tr></tbody>
                 </table>
               </div>"#,
        );
        let dates = header_dates_for(&page, "SOFR Rates").unwrap();
        assert_eq!(dates.as_array(), ["20 Jan 2026", "16 Jan 2026", "15 Jan 2026"]);
    }
}
