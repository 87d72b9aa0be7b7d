use crate::common::error::Result;
use crate::domain::{AddressRecord, ConnectionRecord, ImportBatch, StationRecord};
use async_trait::async_trait;

pub mod in_memory;
#[cfg(feature = "db")]
pub mod mongo;

pub use in_memory::InMemoryStorage;
#[cfg(feature = "db")]
pub use mongo::MongoStorage;

/// Document-store access for the import pipeline: typed existence checks by
/// external id plus the idempotent bulk upsert of one normalized batch.
///
/// `bulk_upsert` writes addresses, then connections, then stations, so the
/// referenced documents exist before the stations that point at them. The
/// batch should commit atomically where the backend supports transactions;
/// a non-transactional backend may leave addresses and connections behind
/// when the stations write fails, and must say so in its docs.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn find_address_by_external_id(&self, external_id: i64)
        -> Result<Option<AddressRecord>>;
    async fn find_connection_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<ConnectionRecord>>;
    async fn find_station_by_external_id(&self, external_id: i64)
        -> Result<Option<StationRecord>>;

    async fn bulk_upsert(&self, batch: &ImportBatch) -> Result<()>;
}
