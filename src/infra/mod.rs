pub mod http_client;
pub mod memory_cache;
#[cfg(feature = "redis-cache")]
pub mod redis_cache;
