// src/geocoder/query.rs

use crate::domain::auction::GeocodeCandidate;
use regex::Regex;
use std::sync::LazyLock;

/// Queries shorter than this are degenerate and never sent.
pub const MIN_QUERY_LEN: usize = 10;

const COUNTRY: &str = "Spain";

/// Legal-ownership and property-type lead-ins that the result page glues in
/// front of the municipality. Stripped repeatedly, longest forms first.
const BOILERPLATE_PREFIXES: &[&str] = &[
    "DEL PLENO DOMINIO DE",
    "PLENO DOMINIO DE",
    "DE LA NUDA PROPIEDAD DE",
    "NUDA PROPIEDAD DE",
    "DEL USUFRUCTO DE",
    "USUFRUCTO DE",
    "PARTE INDIVISA DE",
    "MITAD INDIVISA DE",
    "INDIVISA DE",
    "VIVIENDA UNIFAMILIAR EN",
    "VIVIENDA EN",
    "PISO EN",
    "FINCA URBANA EN",
    "FINCA RÚSTICA EN",
    "FINCA RUSTICA EN",
    "LOCAL COMERCIAL EN",
    "LOCAL EN",
    "PLAZA DE GARAJE EN",
    "GARAJE EN",
    "TRASTERO EN",
    "NAVE INDUSTRIAL EN",
    "SOLAR EN",
    "PARCELA EN",
    "TERRENO EN",
];

static DESCRIPTION_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-ZÁÉÍÓÚÑÜ\s]+),\s+([A-ZÁÉÍÓÚÑÜ\s]+)\s*$").expect("valid regex")
});

type QueryBuilder = fn(&GeocodeCandidate) -> Option<String>;

/// Tried in order; the first builder with enough input wins.
const QUERY_BUILDERS: &[QueryBuilder] = &[from_structured_location, from_description_tail];

/// Build the free-text query for a record, or `None` when nothing usable
/// (or only a degenerate string) can be derived.
pub fn build_query(candidate: &GeocodeCandidate) -> Option<String> {
    QUERY_BUILDERS
        .iter()
        .find_map(|build| build(candidate))
        .filter(|query| query.chars().count() >= MIN_QUERY_LEN)
}

fn from_structured_location(candidate: &GeocodeCandidate) -> Option<String> {
    let city = clean_city(non_empty(candidate.location_city.as_deref())?);
    let province = non_empty(candidate.location_province.as_deref())?;

    if city.is_empty() {
        return None;
    }
    Some(format!("{city}, {province}, {COUNTRY}"))
}

fn from_description_tail(candidate: &GeocodeCandidate) -> Option<String> {
    let description = non_empty(candidate.description.as_deref())?;
    let caps = DESCRIPTION_TAIL.captures(description)?;

    let city = caps[1].trim();
    let province = caps[2].trim();
    if city.is_empty() || province.is_empty() {
        return None;
    }
    Some(format!("{city}, {province}, {COUNTRY}"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Strip ownership-share annotations and property-type prefixes from a
/// parsed city name.
pub fn clean_city(raw: &str) -> String {
    let mut rest = raw.trim_start_matches(|c: char| !c.is_alphabetic()).trim();

    loop {
        let stripped = BOILERPLATE_PREFIXES
            .iter()
            .find_map(|prefix| strip_prefix_ci(rest, prefix));

        match stripped {
            Some(tail) => rest = tail.trim_start_matches(|c: char| !c.is_alphabetic()).trim(),
            None => break,
        }
    }

    rest.to_string()
}

/// Case-insensitive `strip_prefix` that only matches on a word boundary.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut text_chars = text.char_indices();

    for p in prefix.chars() {
        let (_, t) = text_chars.next()?;
        if !t.to_uppercase().eq(p.to_uppercase()) {
            return None;
        }
    }

    let tail = match text_chars.next() {
        Some((idx, c)) if c.is_whitespace() => &text[idx..],
        Some(_) => return None,
        None => "",
    };
    Some(tail)
}
