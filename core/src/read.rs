//! Read-only endpoints of the PurpleAir API.
//!
//! Every method builds one URL, attaches the read key and performs a single
//! GET. Payloads are returned as received.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::query::{build_request_url, QueryParams};
use crate::sanitize::sanitize_sensor_data;
use crate::transport::{send_get, send_get_text, Transport};
use crate::types::{HistoryFormat, HistoryQuery, MemberHistoryQuery, MembersQuery, SensorsQuery};

/// Facade over the sensor, group and member read endpoints.
#[derive(Clone)]
pub struct ReadApi {
    config: ClientConfig,
    api_read_key: Option<String>,
    transport: Arc<dyn Transport>,
}

impl ReadApi {
    pub fn new(config: ClientConfig, api_read_key: Option<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            api_read_key,
            transport,
        }
    }

    fn get(&self, url: &str) -> Result<Value> {
        send_get(self.transport.as_ref(), url, self.api_read_key.as_deref())
    }

    /// `GET sensors/{sensor_index}`, optionally with a private sensor's
    /// `read_key` and a comma separated `fields` list.
    pub fn request_sensor_data(&self, sensor_index: u64, read_key: Option<&str>, fields: Option<&str>) -> Result<Value> {
        let base = self.config.endpoint(&format!("sensors/{sensor_index}"));
        let params = QueryParams::new()
            .with("read_key", read_key)
            .with("fields", fields);
        let url = build_request_url(&base, '?', &params)?;
        self.get(&url)
    }

    /// Like [`ReadApi::request_sensor_data`], with every documented sensor
    /// field guaranteed to be present in the `sensor` object.
    pub fn request_sanitized_sensor_data(
        &self,
        sensor_index: u64,
        read_key: Option<&str>,
        fields: Option<&str>,
    ) -> Result<Value> {
        let mut payload = self.request_sensor_data(sensor_index, read_key, fields)?;
        sanitize_sensor_data(&mut payload)?;
        Ok(payload)
    }

    /// `GET sensors` filtered by `query`.
    pub fn request_multiple_sensors_data(&self, query: &SensorsQuery) -> Result<Value> {
        let base = self.config.endpoint(&format!("sensors?fields={}", query.fields));
        let mut params = QueryParams::new();
        query.filter.push_params(&mut params);
        let url = build_request_url(&base, '&', &params)?;
        self.get(&url)
    }

    /// `GET sensors/{sensor_index}/history` or its `/csv` variant.
    ///
    /// The CSV variant returns the CSV document as a JSON string value.
    pub fn request_sensor_history(&self, sensor_index: u64, query: &HistoryQuery) -> Result<Value> {
        let history = match query.format {
            HistoryFormat::Json => "history",
            HistoryFormat::Csv => "history/csv",
        };
        let base = self.config.endpoint(&format!(
            "sensors/{sensor_index}/{history}?fields={}",
            query.fields
        ));
        let params = QueryParams::new()
            .with("read_key", query.read_key.as_deref())
            .with("privacy", query.privacy.as_deref())
            .with("start_timestamp", query.start_timestamp.as_ref())
            .with("end_timestamp", query.end_timestamp.as_ref())
            .with("average", query.average);
        let url = build_request_url(&base, '&', &params)?;

        match query.format {
            HistoryFormat::Json => self.get(&url),
            HistoryFormat::Csv => {
                send_get_text(self.transport.as_ref(), &url, self.api_read_key.as_deref()).map(Value::String)
            }
        }
    }

    /// `GET groups/{group_id}`.
    pub fn request_group_detail_data(&self, group_id: u64) -> Result<Value> {
        let url = self.config.endpoint(&format!("groups/{group_id}"));
        self.get(&url)
    }

    /// `GET groups/`, the groups owned by the key's organization.
    pub fn request_group_list_data(&self) -> Result<Value> {
        let url = self.config.endpoint("groups/");
        self.get(&url)
    }

    /// `GET groups/{group_id}/members/{member_id}`.
    pub fn request_member_data(&self, group_id: u64, member_id: u64, fields: Option<&str>) -> Result<Value> {
        let base = self.config.endpoint(&format!("groups/{group_id}/members/{member_id}"));
        let params = QueryParams::new().with("fields", fields);
        let url = build_request_url(&base, '?', &params)?;
        self.get(&url)
    }

    /// `GET groups/{group_id}/members/{member_id}/history/`.
    pub fn request_member_history(&self, group_id: u64, member_id: u64, query: &MemberHistoryQuery) -> Result<Value> {
        let base = self.config.endpoint(&format!(
            "groups/{group_id}/members/{member_id}/history/?fields={}",
            query.fields
        ));
        let params = QueryParams::new()
            .with("start_timestamp", query.start_timestamp.as_ref())
            .with("end_timestamp", query.end_timestamp.as_ref())
            .with("average", query.average);
        let url = build_request_url(&base, '&', &params)?;
        self.get(&url)
    }

    /// `GET groups/{group_id}/members` filtered by `query`.
    pub fn request_members_data(&self, group_id: u64, query: &MembersQuery) -> Result<Value> {
        let base = self.config.endpoint(&format!("groups/{group_id}/members?fields={}", query.fields));
        let mut params = QueryParams::new();
        query.filter.push_params(&mut params);
        let url = build_request_url(&base, '&', &params)?;
        self.get(&url)
    }

    /// `GET organization`, details of the organization owning the key.
    pub fn request_organization_data(&self) -> Result<Value> {
        let url = self.config.endpoint("organization");
        self.get(&url)
    }
}
