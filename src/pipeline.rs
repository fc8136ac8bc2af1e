// pipeline.rs
use crate::config::Config;
use crate::db::connection::Database;
use crate::errors::ServerError;
use crate::export::export_json;
use crate::geocoder::{run_geocoding, GeocodeReport, GeocodeSettings, Geocoder};
use crate::scraper::models::province_codes;
use crate::scraper::{run_discovery, run_enrichment, BoeScraper, DiscoveryReport, EnrichmentReport, Fetch};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineReport {
    pub discovery: DiscoveryReport,
    pub enrichment: EnrichmentReport,
    pub geocoding: GeocodeReport,
    pub exported: usize,
}

pub fn discover<F: Fetch>(
    db: &Database,
    config: &Config,
    scraper: &BoeScraper<F>,
) -> Result<DiscoveryReport, ServerError> {
    run_discovery(db, scraper, &province_codes(), config.partition_delay)
}

pub fn enrich<F: Fetch>(
    db: &Database,
    config: &Config,
    scraper: &BoeScraper<F>,
) -> Result<EnrichmentReport, ServerError> {
    run_enrichment(db, scraper, config.enrich_batch, config.enrich_delay)
}

pub fn geocode<F: Fetch>(
    db: &Database,
    config: &Config,
    geocoder: &Geocoder<F>,
) -> Result<GeocodeReport, ServerError> {
    let settings = GeocodeSettings {
        delay: config.geocode_delay,
        error_cooldown: config.geocode_error_cooldown,
        retry_skipped: config.retry_skipped_geocodes,
    };
    run_geocoding(db, geocoder, &settings)
}

pub fn export(db: &Database, config: &Config) -> Result<usize, ServerError> {
    export_json(db, &config.export_path, config.export_limit)
}

/// Discovery, enrichment, geocoding and export, strictly one after another.
pub fn run_pipeline<S: Fetch, G: Fetch>(
    db: &Database,
    config: &Config,
    scraper: &BoeScraper<S>,
    geocoder: &Geocoder<G>,
) -> Result<PipelineReport, ServerError> {
    tracing::info!("--- Starting discovery ---");
    let discovery = discover(db, config, scraper)?;

    tracing::info!("--- Starting enrichment ---");
    let enrichment = enrich(db, config, scraper)?;

    tracing::info!("--- Starting geocoding ---");
    let geocoding = geocode(db, config, geocoder)?;

    tracing::info!("--- Exporting JSON ---");
    let exported = export(db, config)?;

    tracing::info!("--- All tasks completed ---");
    Ok(PipelineReport {
        discovery,
        enrichment,
        geocoding,
        exported,
    })
}
