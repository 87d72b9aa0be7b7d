use crate::app::ports::CatalogApiPort;
use crate::common::error::{ImportError, Result};
use crate::domain::raw::RawStation;
use crate::pipeline::ingestion::rate_limiter::RateLimiter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fetches one page of raw stations through the shared rate limiter,
/// retrying transient failures with exponential backoff.
pub struct Fetcher {
    api: Arc<dyn CatalogApiPort>,
    limiter: RateLimiter,
    max_retries: u32,
}

impl Fetcher {
    pub fn new(api: Arc<dyn CatalogApiPort>, limiter: RateLimiter, max_retries: u32) -> Self {
        Self {
            api,
            limiter,
            max_retries,
        }
    }

    /// One attempt plus up to `max_retries` retries. An HTTP 403 aborts
    /// immediately: an invalid key does not become valid by waiting.
    pub async fn fetch_page(&self, page_size: u32) -> Result<Vec<RawStation>> {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt(page_size).await {
                Ok(records) => {
                    info!(count = records.len(), "fetched catalog page");
                    return Ok(records);
                }
                Err(e) if !e.is_retryable() => {
                    error!("authentication error: invalid API key");
                    return Err(e);
                }
                Err(e) if attempt < self.max_retries => {
                    let delay = Duration::from_millis(1000 * 2u64.pow(attempt));
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "catalog fetch failed, backing off: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("catalog fetch failed after {} retries: {e}", self.max_retries);
                    return Err(ImportError::ExternalApi(format!(
                        "failed to fetch data from API: {e}"
                    )));
                }
            }
        }
    }

    async fn attempt(&self, page_size: u32) -> Result<Vec<RawStation>> {
        let page = self
            .limiter
            .schedule(|| self.api.fetch_page(page_size))
            .await?;
        match page.status {
            403 => Err(ImportError::Authorization("invalid API key".into())),
            s if (200..300).contains(&s) => Ok(serde_json::from_slice(&page.body)?),
            s => Err(ImportError::ExternalApi(format!(
                "unexpected status {s} from catalog API"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::CatalogPage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStatusApi {
        status: u16,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogApiPort for FixedStatusApi {
        async fn fetch_page(&self, _page_size: u32) -> Result<CatalogPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CatalogPage {
                status: self.status,
                body: b"[]".to_vec(),
            })
        }
    }

    fn fetcher_with(api: Arc<FixedStatusApi>, retries: u32) -> Fetcher {
        Fetcher::new(api, RateLimiter::new(Duration::from_millis(1)), retries)
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failure_exhausts_exactly_the_retry_budget() {
        let api = Arc::new(FixedStatusApi {
            status: 500,
            calls: AtomicUsize::new(0),
        });
        let fetcher = fetcher_with(api.clone(), 3);

        let err = fetcher.fetch_page(10).await.unwrap_err();
        assert!(matches!(err, ImportError::ExternalApi(_)));
        // Initial attempt + 3 retries.
        assert_eq!(api.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn forbidden_fails_immediately_without_retry() {
        let api = Arc::new(FixedStatusApi {
            status: 403,
            calls: AtomicUsize::new(0),
        });
        let fetcher = fetcher_with(api.clone(), 5);

        let err = fetcher.fetch_page(10).await.unwrap_err();
        assert!(matches!(err, ImportError::Authorization(_)));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    struct FailThenSucceedApi {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogApiPort for FailThenSucceedApi {
        async fn fetch_page(&self, _page_size: u32) -> Result<CatalogPage> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Ok(CatalogPage {
                    status: 503,
                    body: Vec::new(),
                })
            } else {
                Ok(CatalogPage {
                    status: 200,
                    body: b"[]".to_vec(),
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_within_the_retry_budget() {
        let api = Arc::new(FailThenSucceedApi {
            failures: 2,
            calls: AtomicUsize::new(0),
        });
        let fetcher = Fetcher::new(
            api.clone(),
            RateLimiter::new(Duration::from_millis(1)),
            5,
        );

        let records = fetcher.fetch_page(10).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }
}
