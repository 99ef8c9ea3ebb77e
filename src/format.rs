//! Cell text handling: extracting the printed text of a cell's markup and
//! normalizing it into a value that can be ordered.
//!
//! Cells carry no schema, so the kind of a value is inferred from its text:
//! - Plain and thousands-separated numbers: "123.45", "1,234,567"
//! - Percentages: "15%" (compares as 15, not 0.15)
//! - Magnitude suffixes: "1.2M", "3B"
//! - Calendar dates: "2023-01-05", "01/05/2023", "Jan 05, 2023"
//! - Anything else is text

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

const MILLION: f64 = 1_000_000.0;
const BILLION: f64 = 1_000_000_000.0;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid")
});

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b[^>]*>(.*?)</a\s*>").expect("anchor pattern is valid")
});

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%d %b %Y"];

/// Printed text of a cell: tags stripped, entities decoded, whitespace trimmed
pub fn text_content(markup: &str) -> String {
    let stripped = TAG_RE.replace_all(markup, "");
    decode_entities(&stripped).trim().to_string()
}

/// Text of the first link in a cell, or the whole cell text when it has none
pub fn link_text(markup: &str) -> String {
    match ANCHOR_RE.captures(markup).and_then(|caps| caps.get(1)) {
        Some(inner) => text_content(inner.as_str()),
        None => text_content(markup),
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    // &amp; last so "&amp;lt;" stays "&lt;"
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Escape text for use inside element content or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Parse a number as printed in a screener table.
///
/// Thousands separators and percent signs are dropped, and a trailing
/// "M"/"B" scales the value to millions/billions. Non-finite results are
/// rejected so "NaN" and "inf" stay text.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return None;
    }

    let mut cleaned: String = trimmed.chars().filter(|c| *c != ',' && *c != '%').collect();

    let multiplier = match trimmed.chars().last() {
        Some('M') => {
            cleaned.pop();
            MILLION
        }
        Some('B') => {
            cleaned.pop();
            BILLION
        }
        _ => 1.0,
    };

    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n * multiplier)
}

/// Parse a calendar date or timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A cell's text classified into something that can be ordered.
///
/// Numbers win over dates, so "20230105" is a number. Across kinds the
/// order is `Text < Date < Number`, which keeps blank and "N/A" cells at the
/// bottom of a descending sort.
#[derive(Debug, Clone)]
pub enum SortValue {
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl SortValue {
    pub fn classify(raw: &str) -> Self {
        if let Some(n) = parse_numeric(raw) {
            SortValue::Number(n)
        } else if let Some(d) = parse_date(raw) {
            SortValue::Date(d)
        } else {
            SortValue::Text(raw.to_string())
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Text(_) => 0,
            SortValue::Date(_) => 1,
            SortValue::Number(_) => 2,
        }
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortValue {}
