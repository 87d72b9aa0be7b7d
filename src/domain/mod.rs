use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod raw;

/// Flattened address extracted from a raw station payload.
///
/// `external_id` is the upstream catalog's identifier and the natural key for
/// upserts; `internal_id` is durable across repeated imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRecord {
    pub internal_id: Uuid,
    pub external_id: i64,
    pub title: String,
    pub address_line1: String,
    pub town: String,
    pub state_or_province: String,
    pub postcode: String,
    pub country_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_unit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub internal_id: Uuid,
    pub external_id: i64,
    pub connection_type_id: i64,
    pub status_type_id: i64,
    pub level_id: i64,
    pub power_kw: f64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationRecord {
    pub internal_id: Uuid,
    pub external_id: i64,
    /// UUID assigned by the upstream catalog, distinct from `internal_id`.
    pub source_uuid: String,
    pub is_recently_verified: bool,
    pub date_last_verified: DateTime<Utc>,
    pub data_provider_id: i64,
    pub operator_id: i64,
    pub usage_type_id: i64,
    /// Internal id of the station's `AddressRecord` in the same batch.
    pub address_ref: Uuid,
    /// Internal ids of the station's `ConnectionRecord`s, in upstream order.
    pub connection_refs: Vec<Uuid>,
    pub number_of_points: i64,
    pub status_type_id: i64,
    pub date_last_status_update: DateTime<Utc>,
    pub data_quality_level: i64,
    pub date_created: DateTime<Utc>,
    pub submission_status_type_id: i64,
}

/// The three collections produced by normalizing one fetched batch.
/// Stations reference addresses and connections from this same batch.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub addresses: Vec<AddressRecord>,
    pub connections: Vec<ConnectionRecord>,
    pub stations: Vec<StationRecord>,
}
