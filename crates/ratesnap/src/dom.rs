//! Read-only document capability used by the extractors.
//!
//! The extraction algorithms only ever ask a handful of questions of a page: where is the
//! element carrying this text, what is its parent, which tables sit below it, and what text
//! does a node render. [`Dom`] captures exactly that, so the algorithms can run against any
//! rendered tree. [`HtmlPage`] answers them over a parsed HTML snapshot.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::parser::normalize_whitespace;

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("invalid selector: table"));

static HEADER_CELL_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("th, thead td").expect("invalid selector: header cells")
});

static BODY_ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("invalid selector: body rows"));

static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("invalid selector: cells"));

/// Elements whose text never reaches the screen.
const INVISIBLE: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Inline style declarations that hide an element, compared with whitespace removed.
const HIDING_STYLES: &[&str] = &["display:none", "visibility:hidden"];

pub trait Dom {
    type Node<'a>: Copy
    where
        Self: 'a;

    /// The deepest element, first in document order, whose visible text contains `text`.
    /// Matching is case-insensitive and whitespace-normalized.
    fn find_by_text(&self, text: &str) -> Option<Self::Node<'_>>;

    fn parent<'a>(&'a self, node: Self::Node<'a>) -> Option<Self::Node<'a>>;

    /// Visible tables below `node` (or `node` itself), in document order.
    fn tables<'a>(&'a self, node: Self::Node<'a>) -> Vec<Self::Node<'a>>;

    fn count_tables<'a>(&'a self, node: Self::Node<'a>) -> usize {
        self.tables(node).len()
    }

    /// Visible text of `node`, text nodes joined by single spaces.
    fn text_content<'a>(&'a self, node: Self::Node<'a>) -> String;

    /// Text of the table's formal header cells, in document order.
    fn header_cells<'a>(&'a self, table: Self::Node<'a>) -> Vec<String>;

    /// Cell texts of every visible body row of the table.
    fn body_rows<'a>(&'a self, table: Self::Node<'a>) -> Vec<Vec<String>>;

    /// Visible text nodes inside `scope` that come before `stop` in document order.
    fn texts_before<'a>(&'a self, scope: Self::Node<'a>, stop: Self::Node<'a>) -> Vec<String>;
}

pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }
}

/// Whether this element alone hides itself and its subtree, ignoring its ancestors.
fn hides_subtree(element: ElementRef) -> bool {
    let value = element.value();
    if INVISIBLE.contains(&value.name()) || value.attr("hidden").is_some() {
        return true;
    }
    if value
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        style
            .split(';')
            .any(|decl| HIDING_STYLES.contains(&decl.trim_end_matches("!important")))
    })
}

fn is_visible(node: ElementRef) -> bool {
    !node
        .ancestors()
        .chain(std::iter::once(*node))
        .filter_map(ElementRef::wrap)
        .any(hides_subtree)
}

fn visible_texts(element: ElementRef) -> Vec<String> {
    if !is_visible(element) {
        return Vec::new();
    }
    element
        .descendants()
        .filter_map(|node| {
            let text: &str = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .take_while(|a| a.id() != element.id())
                .filter_map(ElementRef::wrap)
                .any(hides_subtree);
            (!hidden).then(|| text.to_string())
        })
        .collect()
}

fn elem_text(element: ElementRef) -> String {
    normalize_whitespace(&visible_texts(element).join(" "))
}

impl Dom for HtmlPage {
    type Node<'a> = ElementRef<'a>;

    fn find_by_text(&self, text: &str) -> Option<ElementRef<'_>> {
        let needle = normalize_whitespace(text).to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let contains = |e: ElementRef| elem_text(e).to_lowercase().contains(&needle);

        let mut current = self.document.root_element();
        if !contains(current) {
            return None;
        }
        while let Some(child) = current
            .children()
            .filter_map(ElementRef::wrap)
            .find(|c| contains(*c))
        {
            current = child;
        }
        Some(current)
    }

    fn parent<'a>(&'a self, node: ElementRef<'a>) -> Option<ElementRef<'a>> {
        node.parent().and_then(ElementRef::wrap)
    }

    fn tables<'a>(&'a self, node: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        if node.value().name() == "table" {
            return if is_visible(node) { vec![node] } else { Vec::new() };
        }
        node.select(&TABLE_SEL).filter(|t| is_visible(*t)).collect()
    }

    fn text_content<'a>(&'a self, node: ElementRef<'a>) -> String {
        elem_text(node)
    }

    fn header_cells<'a>(&'a self, table: ElementRef<'a>) -> Vec<String> {
        table.select(&HEADER_CELL_SEL).map(elem_text).collect()
    }

    fn body_rows<'a>(&'a self, table: ElementRef<'a>) -> Vec<Vec<String>> {
        table
            .select(&BODY_ROW_SEL)
            .filter(|row| is_visible(*row))
            .map(|row| row.select(&CELL_SEL).map(elem_text).collect())
            .collect()
    }

    fn texts_before<'a>(&'a self, scope: ElementRef<'a>, stop: ElementRef<'a>) -> Vec<String> {
        let mut texts = Vec::new();
        for node in scope.descendants() {
            if node.id() == stop.id() {
                break;
            }
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(hides_subtree);
            let text = normalize_whitespace(text);
            if !hidden && !text.is_empty() {
                texts.push(text);
            }
        }
        texts
    }
}
