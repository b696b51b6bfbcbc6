use super::ExtractError;
use crate::dom::Dom;

/// How many parents above the heading element we are willing to climb.
pub const MAX_CARD_DEPTH: usize = 25;

/// Finds the region scoped to exactly one dataset: the closest ancestor-or-self of the
/// heading element that contains exactly one table.
///
/// Zero tables means the heading's data is not in scope yet. Two or more means we have
/// climbed into a container shared with another dataset, and every further ancestor is at
/// least as broad, so the search stops there.
pub fn locate_card<'a, D: Dom>(dom: &'a D, heading: &str) -> Result<D::Node<'a>, ExtractError> {
    let mut node = dom
        .find_by_text(heading)
        .ok_or_else(|| ExtractError::not_found("heading", heading))?;

    for depth in 0..=MAX_CARD_DEPTH {
        match dom.count_tables(node) {
            0 => {}
            1 => {
                log::debug!("Card for '{}' found {} level(s) above heading", heading, depth);
                return Ok(node);
            }
            n => {
                log::debug!(
                    "Ancestor {} level(s) above '{}' already holds {} tables",
                    depth,
                    heading,
                    n
                );
                break;
            }
        }
        let Some(parent) = dom.parent(node) else {
            break;
        };
        node = parent;
    }

    Err(ExtractError::not_found("card", heading))
}

pub fn locate_table<'a, D: Dom>(
    dom: &'a D,
    card: D::Node<'a>,
    heading: &str,
) -> Result<D::Node<'a>, ExtractError> {
    dom.tables(card)
        .into_iter()
        .next()
        .ok_or_else(|| ExtractError::not_found("table", heading))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlPage;
    use std::fs;

    fn two_card_page() -> HtmlPage {
        let html = fs::read_to_string("fixtures/two_cards_header_dates.html")
            .expect("Failed to read fixture");
        HtmlPage::parse(&html)
    }

    #[test]
    fn test_locate_card_scopes_each_heading_to_its_own_table() {
        let page = two_card_page();

        let treasury = locate_card(&page, "U.S. Treasuries").expect("treasury card");
        let sofr = locate_card(&page, "SOFR Rates").expect("sofr card");

        let treasury_table = locate_table(&page, treasury, "U.S. Treasuries").unwrap();
        let sofr_table = locate_table(&page, sofr, "SOFR Rates").unwrap();
        assert_ne!(treasury_table.id(), sofr_table.id());

        assert_eq!(page.count_tables(treasury), 1);
        assert!(
            page.tables(treasury).iter().all(|t| t.id() != sofr_table.id()),
            "Treasury card must not contain the SOFR table"
        );
        assert!(
            !page.text_content(treasury).contains("30-Day Average"),
            "Treasury card must not contain SOFR rows"
        );
        assert!(!page.text_content(sofr).contains("10 Year"));
    }

    #[test]
    fn test_locate_card_missing_heading() {
        let page = two_card_page();
        let err = locate_card(&page, "Corporate Bonds").expect_err("should not find heading");
        assert!(matches!(err, ExtractError::NotFound { what: "heading", .. }));
        assert!(err.to_string().contains("Corporate Bonds"));
    }

    #[test]
    fn test_locate_card_heading_sharing_container_with_two_tables() {
        let page = HtmlPage::parse(
            r#"<div>
                 <h2>Yields</h2>
                 <table><tr><td>a</td></tr></table>
                 <table><tr><td>b</td></tr></table>
               </div>"#,
        );
        let err = locate_card(&page, "Yields").expect_err("ambiguous card");
        assert!(matches!(err, ExtractError::NotFound { what: "card", .. }));
    }

    #[test]
    fn test_locate_card_gives_up_beyond_depth_bound() {
        let mut html = String::from("<div><table><tr><td>x</td></tr></table>");
        for _ in 0..=MAX_CARD_DEPTH {
            html.push_str("<div>");
        }
        html.push_str("<p>Deep Heading</p>");
        for _ in 0..=MAX_CARD_DEPTH {
            html.push_str("</div>");
        }
        html.push_str("</div>");

        let page = HtmlPage::parse(&html);
        assert!(matches!(
            locate_card(&page, "Deep Heading"),
            Err(ExtractError::NotFound { what: "card", .. })
        ));
    }

    #[test]
    fn test_locate_table_without_table() {
        let page = HtmlPage::parse("<div><h2>Empty</h2></div>");
        let heading = page.find_by_text("Empty").unwrap();
        assert!(matches!(
            locate_table(&page, heading, "Empty"),
            Err(ExtractError::NotFound { what: "table", .. })
        ));
    }
}
