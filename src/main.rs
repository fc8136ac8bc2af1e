use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::geocoder::Geocoder;
use crate::router::handle;
use crate::scraper::{BoeScraper, HttpClient};
use anyhow::{Context, Result};
use astra::Server;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod errors;
mod export;
mod geocoder;
mod pacing;
mod pipeline;
mod responses;
mod router;
mod scraper;

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(author, version, about = "BOE real-estate auction scraper and map snapshot builder")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Discovery, enrichment, geocoding and export, in that order (default)
    Run,
    /// Search every province and upsert the listing summaries
    Discover,
    /// Fetch detail views for a batch of pending records
    Enrich,
    /// Resolve coordinates for records that have none
    Geocode,
    /// Write the JSON snapshot for the viewer
    Export,
    /// Serve the store over HTTP
    Serve,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // 1️⃣ Create the database handle and apply the schema
    let db = Database::new(config.database_path.clone());
    init_db(&db).context("database initialization failed")?;

    // 2️⃣ Dispatch
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let scraper = source_scraper(&config)?;
            let geocoder = build_geocoder(&config)?;
            let report = pipeline::run_pipeline(&db, &config, &scraper, &geocoder)?;
            tracing::info!(?report, "Pipeline finished");
        }
        Command::Discover => {
            pipeline::discover(&db, &config, &source_scraper(&config)?)?;
        }
        Command::Enrich => {
            pipeline::enrich(&db, &config, &source_scraper(&config)?)?;
        }
        Command::Geocode => {
            pipeline::geocode(&db, &config, &build_geocoder(&config)?)?;
        }
        Command::Export => {
            pipeline::export(&db, &config)?;
        }
        Command::Serve => serve(db, config)?,
    }

    Ok(())
}

fn source_scraper(config: &Config) -> Result<BoeScraper<HttpClient>> {
    let client = HttpClient::new(&config.source_user_agent)?;
    Ok(BoeScraper::new(client)?)
}

fn build_geocoder(config: &Config) -> Result<Geocoder<HttpClient>> {
    let client = HttpClient::new(&config.geocoder_user_agent)?;
    Ok(Geocoder::new(client, config.geocoder_url.clone()))
}

fn serve(db: Database, config: Config) -> Result<()> {
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("BIND_ADDR is not a socket address: {}", config.bind_addr))?;
    tracing::info!("Server running at http://{addr}");

    let server = Server::bind(&addr).max_workers(8);

    // Serve requests, passing db handle and config into closure
    server
        .serve(move |req, _info| match handle(req, &db, &config) {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(error = %err, "Request failed");
                responses::json_error_response(err)
            }
        })
        .context("server ended with error")?;

    tracing::info!("Server shut down cleanly.");
    Ok(())
}
