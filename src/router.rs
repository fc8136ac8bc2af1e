use crate::config::Config;
use crate::db::auctions::{count_auctions, list_all};
use crate::db::logs::last_log;
use crate::db::Database;
use crate::errors::ServerError;
use crate::pipeline;
use crate::responses::{json_response, ResultResp};
use crate::scraper::{BoeScraper, HttpClient};
use astra::Request;
use serde_json::json;

pub fn handle(req: Request, db: &Database, config: &Config) -> ResultResp {
    let method = req.method().as_str();
    let path = req.uri().path();

    match (method, path) {
        ("GET", "/api/auctions") => json_response(&list_all(db)?),
        ("POST", "/api/scrape") => trigger_scrape(db, config),
        ("GET", "/api/stats") => {
            let count = count_auctions(db)?;
            let last = last_log(db)?;
            json_response(&json!({ "count": count, "lastLog": last }))
        }
        _ => Err(ServerError::NotFound),
    }
}

/// Runs a full discovery pass before answering.
fn trigger_scrape(db: &Database, config: &Config) -> ResultResp {
    let scraper = HttpClient::new(&config.source_user_agent)
        .and_then(BoeScraper::new)
        .map_err(|e| {
            tracing::error!(error = %e, "Scraper init failed");
            ServerError::InternalError
        })?;

    let report = pipeline::discover(db, config, &scraper)?;
    json_response(&json!({
        "message": "Scraping triggered successfully",
        "items": report.items,
        "failedPartitions": report.failed_partitions,
    }))
}
