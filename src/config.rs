use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SOURCE_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "SubastasMap/0.1 (auction map geocoder)";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub export_path: PathBuf,
    pub bind_addr: String,

    pub source_user_agent: String,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,

    pub partition_delay: Duration,
    pub enrich_delay: Duration,
    pub geocode_delay: Duration,
    pub geocode_error_cooldown: Duration,

    pub enrich_batch: usize,
    pub export_limit: usize,
    pub retry_skipped_geocodes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "auctions.sqlite3".to_string(),
            export_path: PathBuf::from("docs/api/auctions.json"),
            bind_addr: "127.0.0.1:3001".to_string(),
            source_user_agent: DEFAULT_SOURCE_USER_AGENT.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_user_agent: DEFAULT_GEOCODER_USER_AGENT.to_string(),
            partition_delay: Duration::from_millis(500),
            enrich_delay: Duration::from_millis(1000),
            // Nominatim usage policy: at most one request per second
            geocode_delay: Duration::from_millis(1100),
            geocode_error_cooldown: Duration::from_millis(2000),
            enrich_batch: 100,
            export_limit: 1000,
            retry_skipped_geocodes: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();

        Ok(Self {
            database_path: env::var("AUCTIONS_DB").unwrap_or(defaults.database_path),
            export_path: env::var("EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_path),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            source_user_agent: env::var("SOURCE_USER_AGENT")
                .unwrap_or(defaults.source_user_agent),
            geocoder_url: env::var("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or(defaults.geocoder_user_agent),
            partition_delay: millis_var("PARTITION_DELAY_MS", defaults.partition_delay)?,
            enrich_delay: millis_var("ENRICH_DELAY_MS", defaults.enrich_delay)?,
            geocode_delay: millis_var("GEOCODE_DELAY_MS", defaults.geocode_delay)?,
            geocode_error_cooldown: millis_var(
                "GEOCODE_ERROR_COOLDOWN_MS",
                defaults.geocode_error_cooldown,
            )?,
            enrich_batch: parsed_var("ENRICH_BATCH", defaults.enrich_batch)?,
            export_limit: parsed_var("EXPORT_LIMIT", defaults.export_limit)?,
            retry_skipped_geocodes: parsed_var(
                "RETRY_SKIPPED_GEOCODES",
                defaults.retry_skipped_geocodes,
            )?,
        })
    }
}

fn parsed_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid value (got {raw:?})")),
        Err(_) => Ok(default),
    }
}

fn millis_var(key: &str, default: Duration) -> Result<Duration> {
    let ms = parsed_var(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_politeness() {
        let config = Config::default();
        assert_eq!(config.partition_delay, Duration::from_millis(500));
        assert!(config.geocode_error_cooldown > config.geocode_delay);
        assert_eq!(config.enrich_batch, 100);
        assert_eq!(config.export_limit, 1000);
        assert!(config.retry_skipped_geocodes);
    }

    #[test]
    fn malformed_number_is_an_error() {
        env::set_var("SUBASTAS_TEST_BATCH", "lots");
        let parsed: Result<usize> = parsed_var("SUBASTAS_TEST_BATCH", 1);
        assert!(parsed.is_err());

        env::set_var("SUBASTAS_TEST_BATCH", " 25 ");
        let parsed: usize = parsed_var("SUBASTAS_TEST_BATCH", 1).unwrap();
        assert_eq!(parsed, 25);
        env::remove_var("SUBASTAS_TEST_BATCH");
    }
}
