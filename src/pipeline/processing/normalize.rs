use crate::common::error::{ImportError, Result};
use crate::domain::raw::RawStation;
use crate::domain::{AddressRecord, ConnectionRecord, ImportBatch, StationRecord};
use crate::storage::Storage;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Maps raw catalog records into the three internal collections, resolving
/// each entity's durable internal id against the store: an external id seen
/// before keeps its internal id, a new one gets a fresh UUID.
///
/// Existence lookups run concurrently per collection and fail fast; nothing
/// is upserted until all three lists are complete.
pub struct Normalizer {
    storage: Arc<dyn Storage>,
}

impl Normalizer {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn normalize(&self, raw: &[RawStation]) -> Result<ImportBatch> {
        let addresses = try_join_all(raw.iter().map(|item| self.normalize_address(item))).await?;

        let connections = try_join_all(
            raw.iter()
                .flat_map(|item| item.connections.iter())
                .map(|conn| self.normalize_connection(conn)),
        )
        .await?;

        let stations = try_join_all(
            raw.iter()
                .map(|item| self.normalize_station(item, &addresses, &connections)),
        )
        .await?;

        debug!(
            addresses = addresses.len(),
            connections = connections.len(),
            stations = stations.len(),
            "normalized batch"
        );
        Ok(ImportBatch {
            addresses,
            connections,
            stations,
        })
    }

    async fn normalize_address(&self, item: &RawStation) -> Result<AddressRecord> {
        let info = &item.address_info;
        let existing = self.storage.find_address_by_external_id(info.id).await?;
        Ok(AddressRecord {
            internal_id: existing.map_or_else(Uuid::new_v4, |a| a.internal_id),
            external_id: info.id,
            title: info.title.clone(),
            address_line1: info.address_line1.clone(),
            town: info.town.clone(),
            state_or_province: info.state_or_province.clone(),
            postcode: info.postcode.clone(),
            country_id: info.country_id,
            latitude: info.latitude,
            longitude: info.longitude,
            distance_unit: info.distance_unit,
        })
    }

    async fn normalize_connection(
        &self,
        conn: &crate::domain::raw::RawConnection,
    ) -> Result<ConnectionRecord> {
        let existing = self.storage.find_connection_by_external_id(conn.id).await?;
        Ok(ConnectionRecord {
            internal_id: existing.map_or_else(Uuid::new_v4, |c| c.internal_id),
            external_id: conn.id,
            connection_type_id: conn.connection_type_id,
            status_type_id: conn.status_type_id,
            level_id: conn.level_id,
            power_kw: conn.power_kw,
            quantity: conn.quantity,
        })
    }

    async fn normalize_station(
        &self,
        item: &RawStation,
        addresses: &[AddressRecord],
        connections: &[ConnectionRecord],
    ) -> Result<StationRecord> {
        let existing = self.storage.find_station_by_external_id(item.id).await?;

        // A station must reference entities from its own batch; a miss here
        // means the transformation itself went wrong.
        let address_ref = addresses
            .iter()
            .find(|a| a.external_id == item.address_info.id)
            .map(|a| a.internal_id)
            .ok_or_else(|| {
                ImportError::Transformation(format!(
                    "station {} references address {} absent from batch",
                    item.id, item.address_info.id
                ))
            })?;

        let connection_refs = item
            .connections
            .iter()
            .map(|c| {
                connections
                    .iter()
                    .find(|r| r.external_id == c.id)
                    .map(|r| r.internal_id)
                    .ok_or_else(|| {
                        ImportError::Transformation(format!(
                            "station {} references connection {} absent from batch",
                            item.id, c.id
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(StationRecord {
            internal_id: existing.map_or_else(Uuid::new_v4, |s| s.internal_id),
            external_id: item.id,
            source_uuid: item.uuid.clone(),
            is_recently_verified: item.is_recently_verified,
            date_last_verified: parse_catalog_date(&item.date_last_verified)?,
            data_provider_id: item.data_provider_id,
            operator_id: item.operator_id,
            usage_type_id: item.usage_type_id,
            address_ref,
            connection_refs,
            number_of_points: item.number_of_points,
            status_type_id: item.status_type_id,
            date_last_status_update: parse_catalog_date(&item.date_last_status_update)?,
            data_quality_level: item.data_quality_level,
            date_created: parse_catalog_date(&item.date_created)?,
            submission_status_type_id: item.submission_status_type_id,
        })
    }
}

/// The catalog emits RFC 3339 timestamps, occasionally without an offset;
/// offset-less values are taken as UTC.
fn parse_catalog_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| ImportError::Transformation(format!("invalid date '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::raw::{RawAddressInfo, RawConnection};
    use crate::storage::InMemoryStorage;

    fn raw_station(id: i64, address_id: i64, connection_ids: &[i64]) -> RawStation {
        RawStation {
            id,
            uuid: format!("UUID-{id}"),
            is_recently_verified: true,
            date_last_verified: "2024-01-10T09:30:00Z".into(),
            data_provider_id: 1,
            operator_id: 23,
            usage_type_id: 4,
            address_info: RawAddressInfo {
                id: address_id,
                title: "Garage".into(),
                address_line1: "1 Main St".into(),
                town: "Amsterdam".into(),
                state_or_province: "NH".into(),
                postcode: "1011".into(),
                country_id: 159,
                latitude: 52.37,
                longitude: 4.89,
                distance_unit: 0,
            },
            connections: connection_ids
                .iter()
                .map(|&cid| RawConnection {
                    id: cid,
                    connection_type_id: 25,
                    status_type_id: 50,
                    level_id: 2,
                    power_kw: 22.0,
                    quantity: 1,
                })
                .collect(),
            number_of_points: 2,
            status_type_id: 50,
            date_last_status_update: "2024-01-10T09:30:00Z".into(),
            data_quality_level: 5,
            date_created: "2019-06-01T00:00:00Z".into(),
            submission_status_type_id: 100,
        }
    }

    #[tokio::test]
    async fn resolves_references_within_the_batch_in_order() {
        let storage = Arc::new(InMemoryStorage::new());
        let normalizer = Normalizer::new(storage);

        let batch = normalizer
            .normalize(&[raw_station(1, 10, &[20, 21])])
            .await
            .unwrap();

        assert_eq!(batch.addresses.len(), 1);
        assert_eq!(batch.connections.len(), 2);
        assert_eq!(batch.stations.len(), 1);

        let station = &batch.stations[0];
        assert_eq!(station.address_ref, batch.addresses[0].internal_id);
        assert_eq!(
            station.connection_refs,
            vec![
                batch.connections[0].internal_id,
                batch.connections[1].internal_id
            ]
        );
        // Upstream per-station connection order survives.
        assert_eq!(batch.connections[0].external_id, 20);
        assert_eq!(batch.connections[1].external_id, 21);
    }

    #[tokio::test]
    async fn reuses_internal_ids_for_known_external_ids() {
        let storage = Arc::new(InMemoryStorage::new());
        let normalizer = Normalizer::new(storage.clone());

        let first = normalizer
            .normalize(&[raw_station(1, 42, &[7])])
            .await
            .unwrap();
        storage.bulk_upsert(&first).await.unwrap();

        let second = normalizer
            .normalize(&[raw_station(1, 42, &[7])])
            .await
            .unwrap();

        assert_eq!(
            second.addresses[0].internal_id,
            first.addresses[0].internal_id
        );
        assert_eq!(
            second.connections[0].internal_id,
            first.connections[0].internal_id
        );
        assert_eq!(
            second.stations[0].internal_id,
            first.stations[0].internal_id
        );
    }

    #[tokio::test]
    async fn fresh_external_ids_get_fresh_internal_ids() {
        let storage = Arc::new(InMemoryStorage::new());
        let normalizer = Normalizer::new(storage.clone());

        let first = normalizer
            .normalize(&[raw_station(1, 42, &[7])])
            .await
            .unwrap();
        storage.bulk_upsert(&first).await.unwrap();

        let second = normalizer
            .normalize(&[raw_station(2, 43, &[8])])
            .await
            .unwrap();

        assert_ne!(
            second.addresses[0].internal_id,
            first.addresses[0].internal_id
        );
        assert_ne!(
            second.stations[0].internal_id,
            first.stations[0].internal_id
        );
    }

    #[tokio::test]
    async fn unparseable_date_is_a_transformation_error() {
        let storage = Arc::new(InMemoryStorage::new());
        let normalizer = Normalizer::new(storage);

        let mut raw = raw_station(1, 10, &[20]);
        raw.date_created = "not-a-date".into();

        let err = normalizer.normalize(&[raw]).await.unwrap_err();
        assert!(matches!(err, ImportError::Transformation(_)));
    }

    #[test]
    fn parses_offsetless_dates_as_utc() {
        let dt = parse_catalog_date("2023-05-04T12:00:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-05-04T12:00:00+00:00");
    }
}
