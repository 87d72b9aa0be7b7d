use crate::app::ports::CachePort;
use crate::common::error::Result;
use crate::domain::raw::RawStation;
use crate::pipeline::ingestion::fetcher::Fetcher;
use std::sync::Arc;
use tracing::{debug, info};

/// Namespaced cache key for the catalog result set. Deliberately not
/// parameterized by page size, matching the upstream importer: callers with
/// different page sizes share one cached payload.
pub const CACHE_KEY: &str = "openchargemap:ChargingStations";

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Cache-aside front for the fetcher: cached JSON wins, otherwise fetch,
/// populate with a TTL, and return the fresh records. Cache failures
/// propagate; a broken cache must not silently mask stale data.
pub struct CachedCatalog {
    cache: Arc<dyn CachePort>,
    fetcher: Fetcher,
    ttl_secs: u64,
}

impl CachedCatalog {
    pub fn new(cache: Arc<dyn CachePort>, fetcher: Fetcher, ttl_secs: u64) -> Self {
        Self {
            cache,
            fetcher,
            ttl_secs,
        }
    }

    pub async fn records(&self, page_size: u32) -> Result<Vec<RawStation>> {
        if let Some(cached) = self.cache.get(CACHE_KEY).await? {
            debug!("catalog cache hit");
            return Ok(serde_json::from_str(&cached)?);
        }

        info!("catalog cache miss, fetching from API");
        let records = self.fetcher.fetch_page(page_size).await?;
        let serialized = serde_json::to_string(&records)?;
        self.cache
            .set_ex(CACHE_KEY, &serialized, self.ttl_secs)
            .await?;
        Ok(records)
    }
}
