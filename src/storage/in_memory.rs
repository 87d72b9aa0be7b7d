use super::Storage;
use crate::common::error::{ImportError, Result};
use crate::domain::{AddressRecord, ConnectionRecord, ImportBatch, StationRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// In-memory storage for development and testing. Collections are keyed by
/// external id, so repeated upserts of the same id replace rather than
/// append. `bulk_upsert` is all-or-nothing: the batch is staged against
/// copies and swapped in under one lock.
#[derive(Default)]
pub struct InMemoryStorage {
    collections: Mutex<Collections>,
    fail_next_stations_write: AtomicBool,
}

#[derive(Default, Clone)]
struct Collections {
    addresses: HashMap<i64, AddressRecord>,
    connections: HashMap<i64, ConnectionRecord>,
    stations: HashMap<i64, StationRecord>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next stations write fail, for exercising rollback behavior.
    pub fn fail_next_stations_write(&self) {
        self.fail_next_stations_write.store(true, Ordering::SeqCst);
    }

    pub fn address_count(&self) -> usize {
        self.collections.lock().unwrap().addresses.len()
    }

    pub fn connection_count(&self) -> usize {
        self.collections.lock().unwrap().connections.len()
    }

    pub fn station_count(&self) -> usize {
        self.collections.lock().unwrap().stations.len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn find_address_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<AddressRecord>> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .addresses
            .get(&external_id)
            .cloned())
    }

    async fn find_connection_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<ConnectionRecord>> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .connections
            .get(&external_id)
            .cloned())
    }

    async fn find_station_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<StationRecord>> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .stations
            .get(&external_id)
            .cloned())
    }

    async fn bulk_upsert(&self, batch: &ImportBatch) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        let mut staged = collections.clone();

        for address in &batch.addresses {
            staged.addresses.insert(address.external_id, address.clone());
        }
        for connection in &batch.connections {
            staged
                .connections
                .insert(connection.external_id, connection.clone());
        }
        if self.fail_next_stations_write.swap(false, Ordering::SeqCst) {
            return Err(ImportError::Persistence(
                "injected failure on stations write".into(),
            ));
        }
        for station in &batch.stations {
            staged.stations.insert(station.external_id, station.clone());
        }

        *collections = staged;
        debug!(
            addresses = batch.addresses.len(),
            connections = batch.connections.len(),
            stations = batch.stations.len(),
            "bulk upsert committed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_batch() -> ImportBatch {
        let address = AddressRecord {
            internal_id: Uuid::new_v4(),
            external_id: 1,
            title: "Garage".into(),
            address_line1: "1 Main St".into(),
            town: "Amsterdam".into(),
            state_or_province: "NH".into(),
            postcode: "1011".into(),
            country_id: 159,
            latitude: 52.37,
            longitude: 4.89,
            distance_unit: 0,
        };
        let connection = ConnectionRecord {
            internal_id: Uuid::new_v4(),
            external_id: 2,
            connection_type_id: 25,
            status_type_id: 50,
            level_id: 2,
            power_kw: 22.0,
            quantity: 1,
        };
        let station = StationRecord {
            internal_id: Uuid::new_v4(),
            external_id: 3,
            source_uuid: "ABC".into(),
            is_recently_verified: true,
            date_last_verified: Utc::now(),
            data_provider_id: 1,
            operator_id: 2,
            usage_type_id: 4,
            address_ref: address.internal_id,
            connection_refs: vec![connection.internal_id],
            number_of_points: 1,
            status_type_id: 50,
            date_last_status_update: Utc::now(),
            data_quality_level: 5,
            date_created: Utc::now(),
            submission_status_type_id: 100,
        };
        ImportBatch {
            addresses: vec![address],
            connections: vec![connection],
            stations: vec![station],
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_external_id() {
        let storage = InMemoryStorage::new();
        let batch = sample_batch();

        storage.bulk_upsert(&batch).await.unwrap();
        storage.bulk_upsert(&batch).await.unwrap();

        assert_eq!(storage.address_count(), 1);
        assert_eq!(storage.connection_count(), 1);
        assert_eq!(storage.station_count(), 1);
    }

    #[tokio::test]
    async fn failed_stations_write_rolls_back_whole_batch() {
        let storage = InMemoryStorage::new();
        storage.fail_next_stations_write();

        let err = storage.bulk_upsert(&sample_batch()).await.unwrap_err();
        assert!(matches!(err, ImportError::Persistence(_)));
        assert_eq!(storage.address_count(), 0);
        assert_eq!(storage.connection_count(), 0);
        assert_eq!(storage.station_count(), 0);
    }

    #[tokio::test]
    async fn existence_checks_return_stored_records() {
        let storage = InMemoryStorage::new();
        let batch = sample_batch();
        storage.bulk_upsert(&batch).await.unwrap();

        let found = storage.find_address_by_external_id(1).await.unwrap();
        assert_eq!(
            found.map(|a| a.internal_id),
            Some(batch.addresses[0].internal_id)
        );
        assert!(storage
            .find_station_by_external_id(999)
            .await
            .unwrap()
            .is_none());
    }
}
