use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::extract::ExtractError;

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(\d{4})\b")
        .expect("invalid regex: display date")
});

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a percentage cell such as `"3.65000%"` or `"4,072.37"` into a number.
pub fn parse_rate(token: &str) -> Result<f64, ExtractError> {
    let cleaned: String = token
        .chars()
        .filter(|c| *c != '%' && *c != ',' && !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ExtractError::UnparseableValue(token.to_string())),
    }
}

/// All `16 Jan 2026` style dates in `text`, in order of appearance.
///
/// Matches that are not real calendar dates (`31 Feb 2026`) are skipped. Returned strings are
/// re-joined with single spaces so `16&nbsp;Jan 2026` and `16 Jan 2026` compare equal.
pub fn find_dates(text: &str) -> impl Iterator<Item = String> + '_ {
    RE_DATE.captures_iter(text).filter_map(|caps| {
        let date = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
        NaiveDate::parse_from_str(&date, "%d %b %Y")
            .is_ok()
            .then_some(date)
    })
}

pub fn first_date(text: &str) -> Option<String> {
    find_dates(text).next()
}
