// src/geocoder/mod.rs
mod query;

pub use query::build_query;

use crate::db::auctions::{apply_coordinates, mark_geocode_skipped, select_pending_geocode};
use crate::db::connection::Database;
use crate::domain::auction::GeocodeCandidate;
use crate::errors::ServerError;
use crate::pacing::Pacer;
use crate::scraper::{Fetch, ScraperError};
use serde::Deserialize;
use std::time::Duration;

/// Restricts lookups to Spain.
const COUNTRY_CODES: &str = "es";

/// One place from a Nominatim-style `/search?format=json` response.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Free-text geocoding against a Nominatim-compatible endpoint.
pub struct Geocoder<F> {
    fetch: F,
    endpoint: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeocodeReport {
    pub resolved: usize,
    pub not_found: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct GeocodeSettings {
    pub delay: Duration,
    pub error_cooldown: Duration,
    pub retry_skipped: bool,
}

impl<F: Fetch> Geocoder<F> {
    pub fn new(fetch: F, endpoint: impl Into<String>) -> Self {
        Self {
            fetch,
            endpoint: endpoint.into(),
        }
    }

    /// Resolve `query` to the provider's single best match, if any.
    pub fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>, ScraperError> {
        let params = [
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
            ("countrycodes", COUNTRY_CODES.to_string()),
        ];

        let body = self.fetch.get(&self.endpoint, &params)?;
        parse_lookup_response(&body)
    }
}

fn parse_lookup_response(body: &str) -> Result<Option<(f64, f64)>, ScraperError> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| ScraperError::JsonParse(e.to_string()))?;

    let Some(place) = places.first() else {
        return Ok(None);
    };

    let lat = parse_coordinate("latitude", &place.lat, 90.0)?;
    let lng = parse_coordinate("longitude", &place.lon, 180.0)?;

    Ok(Some((lat, lng)))
}

/// A finite decimal degree within `±limit`.
fn parse_coordinate(axis: &str, raw: &str, limit: f64) -> Result<f64, ScraperError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| ScraperError::JsonParse(format!("invalid {axis} {raw:?}: {e}")))?;

    if !value.is_finite() || value.abs() > limit {
        return Err(ScraperError::JsonParse(format!("{axis} out of range: {raw:?}")));
    }
    Ok(value)
}

/// Geocode every record that still has no coordinates.
///
/// Records without a usable query, or for which the provider has no match,
/// are marked skipped and keep null coordinates. Lookup errors leave the
/// record untouched and trigger a longer cooldown before the next call. A
/// failed store write for one record is logged and counted as a failure.
pub fn run_geocoding<F: Fetch>(
    db: &Database,
    geocoder: &Geocoder<F>,
    settings: &GeocodeSettings,
) -> Result<GeocodeReport, ServerError> {
    let pending = select_pending_geocode(db, settings.retry_skipped)?;
    let mut report = GeocodeReport::default();
    let mut pacer = Pacer::new(settings.delay);

    tracing::info!(pending = pending.len(), "Auctions to geocode");

    for auction in &pending {
        if let Err(e) = geocode_one(db, geocoder, auction, settings, &mut pacer, &mut report) {
            report.failed += 1;
            tracing::warn!(id = %auction.id, error = %e, "Failed to store geocoding result");
        }
    }

    tracing::info!(
        resolved = report.resolved,
        not_found = report.not_found,
        skipped = report.skipped,
        failed = report.failed,
        "Geocoding finished"
    );
    Ok(report)
}

/// One record: build the query, look it up and store the outcome. Only store
/// writes are returned as errors; lookup errors are counted and cooled down here.
fn geocode_one<F: Fetch>(
    db: &Database,
    geocoder: &Geocoder<F>,
    auction: &GeocodeCandidate,
    settings: &GeocodeSettings,
    pacer: &mut Pacer,
    report: &mut GeocodeReport,
) -> Result<(), ServerError> {
    let Some(query) = build_query(auction) else {
        tracing::info!(
            id = %auction.id,
            title = auction.title.as_deref().unwrap_or(""),
            "Skipping: query too short or empty"
        );
        mark_geocode_skipped(db, &auction.id)?;
        report.skipped += 1;
        return Ok(());
    };

    pacer.wait();
    tracing::debug!(id = %auction.id, %query, "Geocoding");

    match geocoder.lookup(&query) {
        Ok(Some((lat, lng))) => {
            apply_coordinates(db, &auction.id, lat, lng)?;
            report.resolved += 1;
            tracing::debug!(id = %auction.id, lat, lng, "Geocoded");
        }
        Ok(None) => {
            mark_geocode_skipped(db, &auction.id)?;
            report.not_found += 1;
            tracing::info!(id = %auction.id, %query, "No results found");
        }
        Err(e) => {
            report.failed += 1;
            tracing::warn!(id = %auction.id, error = %e, "Geocoding failed");
            pacer.cooldown(settings.error_cooldown);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_place() {
        let body = r#"[{"place_id":1,"lat":"37.3886303","lon":"-5.9953403","display_name":"Sevilla"}]"#;
        assert_eq!(
            parse_lookup_response(body).unwrap(),
            Some((37.3886303, -5.9953403))
        );
    }

    #[test]
    fn empty_response_is_not_an_error() {
        assert_eq!(parse_lookup_response("[]").unwrap(), None);
    }

    #[test]
    fn garbage_response_is_an_error() {
        assert!(parse_lookup_response("<html>rate limited</html>").is_err());
        assert!(parse_lookup_response(r#"[{"lat":"north","lon":"1"}]"#).is_err());
    }

    #[test]
    fn non_finite_or_out_of_range_coordinates_are_errors() {
        assert!(parse_lookup_response(r#"[{"lat":"NaN","lon":"1.0"}]"#).is_err());
        assert!(parse_lookup_response(r#"[{"lat":"nan","lon":"nan"}]"#).is_err());
        assert!(parse_lookup_response(r#"[{"lat":"37.0","lon":"inf"}]"#).is_err());
        assert!(parse_lookup_response(r#"[{"lat":"91.0","lon":"-5.9"}]"#).is_err());
        assert_eq!(
            parse_lookup_response(r#"[{"lat":"-90","lon":"180"}]"#).unwrap(),
            Some((-90.0, 180.0))
        );
    }
}
