pub mod client;
pub mod detail;
pub mod models;
mod scraper;
mod scraper_error;

pub use client::{Fetch, HttpClient};
pub use detail::{run_enrichment, EnrichmentReport};
pub use self::scraper::{run_discovery, BoeScraper, DiscoveryReport};
pub use scraper_error::ScraperError;
