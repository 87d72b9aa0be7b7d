pub mod cache;
pub mod fetcher;
pub mod rate_limiter;
