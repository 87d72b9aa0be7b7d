use crate::common::error::Result;
use async_trait::async_trait;

/// One page fetched from the catalog endpoint, before any status
/// classification or decoding.
#[derive(Clone, Debug)]
pub struct CatalogPage {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Low-level access to the external catalog API. The fetcher layers rate
/// limiting, retry, and decoding on top of this.
#[async_trait]
pub trait CatalogApiPort: Send + Sync {
    async fn fetch_page(&self, page_size: u32) -> Result<CatalogPage>;
}

/// Cache store with string values and per-key expiry, the shape of a Redis
/// `GET` / `SET key value EX ttl` pair.
#[async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;
}
