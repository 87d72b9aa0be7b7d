use crate::app::ports::{CatalogApiPort, CatalogPage};
use crate::common::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// reqwest-backed catalog client. The API key travels as the `key` query
/// parameter and the page size as `maxresults`, per the OpenChargeMap API.
pub struct ReqwestCatalogApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ReqwestCatalogApi {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl CatalogApiPort for ReqwestCatalogApi {
    async fn fetch_page(&self, page_size: u32) -> Result<CatalogPage> {
        debug!(endpoint = %self.endpoint, maxresults = page_size, "catalog GET");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("maxresults", &page_size.to_string()),
            ])
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        debug!(status, size = body.len(), "catalog response");
        Ok(CatalogPage { status, body })
    }
}
