use serde::{Deserialize, Serialize};

/// Raw records as returned by the OpenChargeMap `poi` endpoint. Field names
/// follow the upstream JSON on both serialize and deserialize, so cached
/// payloads round-trip unchanged; dates stay as strings until normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStation {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "IsRecentlyVerified")]
    pub is_recently_verified: bool,
    #[serde(rename = "DateLastVerified")]
    pub date_last_verified: String,
    #[serde(rename = "DataProviderID")]
    pub data_provider_id: i64,
    #[serde(rename = "OperatorID")]
    pub operator_id: i64,
    #[serde(rename = "UsageTypeID")]
    pub usage_type_id: i64,
    #[serde(rename = "AddressInfo")]
    pub address_info: RawAddressInfo,
    #[serde(rename = "Connections")]
    pub connections: Vec<RawConnection>,
    #[serde(rename = "NumberOfPoints")]
    pub number_of_points: i64,
    #[serde(rename = "StatusTypeID")]
    pub status_type_id: i64,
    #[serde(rename = "DateLastStatusUpdate")]
    pub date_last_status_update: String,
    #[serde(rename = "DataQualityLevel")]
    pub data_quality_level: i64,
    #[serde(rename = "DateCreated")]
    pub date_created: String,
    #[serde(rename = "SubmissionStatusTypeID")]
    pub submission_status_type_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAddressInfo {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "AddressLine1")]
    pub address_line1: String,
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "StateOrProvince")]
    pub state_or_province: String,
    #[serde(rename = "Postcode")]
    pub postcode: String,
    #[serde(rename = "CountryID")]
    pub country_id: i64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "DistanceUnit")]
    pub distance_unit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConnection {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "ConnectionTypeID")]
    pub connection_type_id: i64,
    #[serde(rename = "StatusTypeID")]
    pub status_type_id: i64,
    #[serde(rename = "LevelID")]
    pub level_id: i64,
    #[serde(rename = "PowerKW")]
    pub power_kw: f64,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
}
