//! Synchronous client for the PurpleAir air-quality API.
//!
//! # Overview
//! Covers the cloud read endpoints (sensors, groups, members), the write
//! endpoints (group and member management) and direct polling of sensors on
//! the local network. Every operation is one blocking HTTP round-trip whose
//! JSON payload is returned as a `serde_json::Value`.
//!
//! # Design
//! - `query` builds request URLs, `status` classifies status codes and
//!   `transport` performs the I/O behind the `Transport` trait.
//! - `ReadApi`, `WriteApi` and `LocalApi` are independent facades;
//!   `PurpleAirClient` composes them and validates the API keys once at
//!   construction.
//! - Every failure is an `ApiError`. Nothing is retried or cached.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod local;
pub mod query;
pub mod read;
pub mod sanitize;
pub mod status;
pub mod transport;
pub mod types;
pub mod write;

#[cfg(test)]
mod testing;

pub use client::{PurpleAirClient, PurpleAirClientBuilder};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use local::LocalApi;
pub use query::{build_request_url, QueryParams, Separator};
pub use read::ReadApi;
pub use sanitize::sanitize_sensor_data;
pub use status::verify_status_code;
pub use transport::{Transport, UreqTransport};
pub use types::{
    ApiKeyType, CreateMemberBody, CreateMemberParams, HistoryFormat, HistoryQuery, KeyInfo, MemberHistoryQuery,
    MembersQuery, SensorFilter, SensorsQuery, Timestamp,
};
pub use write::WriteApi;
