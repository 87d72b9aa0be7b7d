use crate::common::error::{ImportError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openchargemap.io/v3/poi/";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 6000;

/// Configuration consumed by the import pipeline, read from the environment
/// (a `.env` file is honored via dotenv in `main`).
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub api_key: String,
    pub endpoint: String,
    /// Records fetched per worker call (`maxresults`).
    pub batch_size: u32,
    /// Number of concurrent workers.
    pub concurrency: u32,
    pub max_retries: u32,
    pub rate_limit_min_interval: Duration,
    pub cache_ttl_secs: u64,
}

impl ImportConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENCHARGEMAP_API_KEY").map_err(|_| {
            ImportError::Config("OPENCHARGEMAP_API_KEY must be set".to_string())
        })?;
        Ok(Self {
            api_key,
            endpoint: env::var("OPENCHARGEMAP_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.into()),
            batch_size: parse_var("BATCH_SIZE", 100)?,
            concurrency: parse_var("CONCURRENCY", 2)?,
            max_retries: parse_var("MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            rate_limit_min_interval: Duration::from_millis(parse_var(
                "RATE_LIMIT_MIN_INTERVAL_MS",
                DEFAULT_MIN_INTERVAL_MS,
            )?),
            cache_ttl_secs: parse_var(
                "CACHE_TTL_SECS",
                crate::pipeline::ingestion::cache::DEFAULT_CACHE_TTL_SECS,
            )?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ImportError::Config(format!("invalid value for {name}: '{raw}'"))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e.into()),
    }
}
