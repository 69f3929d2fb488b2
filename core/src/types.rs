//! Request parameter and response types for the PurpleAir API.
//!
//! # Design
//! Responses are returned to callers as `serde_json::Value` verbatim. The
//! only typed response is the key-check payload, which the client itself has
//! to inspect. Query structs gather the optional parameters of the list and
//! history endpoints so call sites can use `..Default::default()`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::query::QueryParams;

/// Privilege level the API reports for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiKeyType {
    Read,
    Write,
    /// Any type this client does not know about, e.g. a disabled key.
    #[serde(other)]
    Unknown,
}

/// Payload of `GET keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub api_version: String,
    pub time_stamp: i64,
    pub api_key_type: ApiKeyType,
}

/// Filters shared by the multi-sensor and group-members queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorFilter {
    /// 0 = outside, 1 = inside.
    pub location_type: Option<u8>,
    /// Comma separated read keys for private sensors.
    pub read_keys: Option<String>,
    /// Comma separated sensor indexes to restrict the result to.
    pub show_only: Option<String>,
    pub modified_since: Option<i64>,
    /// Seconds; 0 matches sensors of any age.
    pub max_age: Option<u64>,
    pub nwlng: Option<f64>,
    pub nwlat: Option<f64>,
    pub selng: Option<f64>,
    pub selat: Option<f64>,
}

impl SensorFilter {
    pub(crate) fn push_params(&self, params: &mut QueryParams) {
        params
            .push("location_type", self.location_type)
            .push("read_keys", self.read_keys.as_deref())
            .push("show_only", self.show_only.as_deref())
            .push("modified_since", self.modified_since)
            .push("max_age", self.max_age)
            .push("nwlng", self.nwlng)
            .push("nwlat", self.nwlat)
            .push("selng", self.selng)
            .push("selat", self.selat);
    }
}

/// Query for `GET sensors`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorsQuery {
    /// Comma separated field names to include; the API requires it.
    pub fields: String,
    pub filter: SensorFilter,
}

/// Query for `GET groups/{id}/members`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembersQuery {
    pub fields: String,
    pub filter: SensorFilter,
}

/// Bound of a history window, passed to the API as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    /// Seconds since the UNIX epoch.
    Unix(i64),
    /// An ISO 8601 date-time such as `2024-01-01T00:00:00Z`.
    Iso8601(String),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(secs) => write!(f, "{secs}"),
            Self::Iso8601(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Self::Unix(secs)
    }
}

impl From<&str> for Timestamp {
    fn from(text: &str) -> Self {
        Self::Iso8601(text.to_string())
    }
}

/// Response encoding of a sensor history request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryFormat {
    #[default]
    Json,
    Csv,
}

/// Query for `GET sensors/{index}/history[/csv]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    pub fields: String,
    pub format: HistoryFormat,
    pub read_key: Option<String>,
    pub privacy: Option<String>,
    pub start_timestamp: Option<Timestamp>,
    pub end_timestamp: Option<Timestamp>,
    /// Averaging period in minutes.
    pub average: Option<u32>,
}

/// Query for `GET groups/{id}/members/{member_id}/history/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberHistoryQuery {
    pub fields: String,
    pub start_timestamp: Option<Timestamp>,
    pub end_timestamp: Option<Timestamp>,
    pub average: Option<u32>,
}

/// Arguments of `post_create_member` before mode selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMemberParams {
    pub sensor_index: Option<u64>,
    pub sensor_id: Option<String>,
    pub owner_email: Option<String>,
    pub location_type: Option<u8>,
}

/// Body of `POST groups/{id}/members`, one variant per accepted mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CreateMemberBody {
    /// A public sensor identified by the id printed on the device.
    SensorId { sensor_id: String },
    /// A public sensor identified by its index.
    SensorIndex { sensor_index: u64 },
    /// A private sensor; the owner's email proves access.
    PrivateSensor {
        sensor_id: String,
        owner_email: String,
        location_type: Option<u8>,
    },
}

impl CreateMemberBody {
    /// Select the one mode `params` describes, or fail if it matches none.
    pub fn from_params(params: &CreateMemberParams) -> Result<Self> {
        let CreateMemberParams {
            sensor_index,
            sensor_id,
            owner_email,
            location_type,
        } = params;

        match (sensor_index, sensor_id, owner_email, location_type) {
            (None, Some(sensor_id), None, None) => Ok(Self::SensorId {
                sensor_id: sensor_id.clone(),
            }),
            (Some(sensor_index), None, None, None) => Ok(Self::SensorIndex {
                sensor_index: *sensor_index,
            }),
            (None, Some(sensor_id), Some(owner_email), location_type) => Ok(Self::PrivateSensor {
                sensor_id: sensor_id.clone(),
                owner_email: owner_email.clone(),
                location_type: *location_type,
            }),
            _ => Err(ApiError::config("Invalid configuration of method parameters!")),
        }
    }

    /// Short name of the selected mode, for logging.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::SensorId { .. } => "sensor_id",
            Self::SensorIndex { .. } => "sensor_index",
            Self::PrivateSensor { .. } => "private_sensor",
        }
    }
}

/// Body of `POST groups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateGroupBody {
    pub name: String,
}
