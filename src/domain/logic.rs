// src/domain/logic.rs

use crate::domain::auction::AuctionStatus;
use regex::Regex;
use std::sync::LazyLock;

/// Phrase tokens of the BOE status line, checked in order.
/// Anything that matches none of them is `Unknown`.
const STATUS_PHRASES: &[(&str, AuctionStatus)] = &[
    ("Celebrándose", AuctionStatus::Live),
    ("Próxima apertura", AuctionStatus::Upcoming),
    ("Concluida", AuctionStatus::Closed),
    ("Cancelada", AuctionStatus::Closed),
    ("Suspendida", AuctionStatus::Closed),
];

static GEO_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-ZÁÉÍÓÚÑÜ'\s\-]+)\s+\(([A-ZÁÉÍÓÚÑÜ\s\-]+)\)$").expect("valid regex")
});
static LABELED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Valor\s+subasta\s+([\d.]+)").expect("valid regex"));
static DECIMAL_EUROS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+,\d{2})\s+€").expect("valid regex"));
static BARE_EUROS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s+€").expect("valid regex"));

/// Map a free-text status line to an [`AuctionStatus`].
pub fn classify_status(status_line: &str) -> AuctionStatus {
    STATUS_PHRASES
        .iter()
        .find(|(phrase, _)| status_line.contains(phrase))
        .map(|(_, status)| *status)
        .unwrap_or(AuctionStatus::Unknown)
}

/// Split a trailing `"<CITY> (<PROVINCE>)"` off a detail line.
///
/// Returns empty strings when the line has no parenthetical suffix.
pub fn extract_geography(detail_line: &str) -> (String, String) {
    GEO_SUFFIX
        .captures(detail_line.trim())
        .map(|caps| (caps[1].trim().to_string(), caps[2].trim().to_string()))
        .unwrap_or_default()
}

/// Parse a Spanish-formatted amount: `.` groups thousands, `,` is the decimal mark.
///
/// `"1.234,56 €"` gives `1234.56`, `"90.000 €"` gives `90000.0`. Anything without
/// digits gives `None`.
pub fn parse_money(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    let mut parts = cleaned.splitn(2, ',');
    let int_part = parts.next().unwrap_or("");
    let frac_part: String = parts
        .next()
        .unwrap_or("")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = if frac_part.is_empty() { "0" } else { &frac_part };
    format!("{int_part}.{frac_part}").parse().ok()
}

type AmountExtractor = fn(status_line: &str, detail_line: &str) -> Option<f64>;

fn labeled_auction_value(status_line: &str, _detail_line: &str) -> Option<f64> {
    first_capture(&LABELED_VALUE, status_line).and_then(parse_money)
}

fn decimal_euros(_status_line: &str, detail_line: &str) -> Option<f64> {
    first_capture(&DECIMAL_EUROS, detail_line).and_then(parse_money)
}

fn bare_euros(_status_line: &str, detail_line: &str) -> Option<f64> {
    first_capture(&BARE_EUROS, detail_line).and_then(parse_money)
}

/// Tried in order; the first extractor that yields a value wins.
const AMOUNT_EXTRACTORS: &[AmountExtractor] = &[labeled_auction_value, decimal_euros, bare_euros];

pub fn extract_amount(status_line: &str, detail_line: &str) -> Option<f64> {
    AMOUNT_EXTRACTORS
        .iter()
        .find_map(|extract| extract(status_line, detail_line))
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
