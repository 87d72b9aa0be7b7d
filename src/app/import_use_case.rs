use crate::common::error::Result;
use crate::pipeline::ingestion::cache::CachedCatalog;
use crate::pipeline::processing::normalize::Normalizer;
use crate::storage::Storage;
use std::sync::Arc;
use tracing::info;

/// Counts for one committed batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    pub addresses: usize,
    pub connections: usize,
    pub stations: usize,
}

/// One full worker pass: cached fetch, normalize, bulk upsert. Stages are
/// strictly sequential within a pass; concurrency lives in the coordinator.
pub struct ImportUseCase {
    catalog: CachedCatalog,
    normalizer: Normalizer,
    storage: Arc<dyn Storage>,
}

impl ImportUseCase {
    pub fn new(catalog: CachedCatalog, normalizer: Normalizer, storage: Arc<dyn Storage>) -> Self {
        Self {
            catalog,
            normalizer,
            storage,
        }
    }

    pub async fn run_batch(&self, batch_size: u32) -> Result<BatchSummary> {
        let raw = self.catalog.records(batch_size).await?;
        let batch = self.normalizer.normalize(&raw).await?;
        self.storage.bulk_upsert(&batch).await?;

        let summary = BatchSummary {
            addresses: batch.addresses.len(),
            connections: batch.connections.len(),
            stations: batch.stations.len(),
        };
        info!(
            stations = summary.stations,
            addresses = summary.addresses,
            connections = summary.connections,
            "batch imported"
        );
        Ok(summary)
    }
}
