//! Group and member management endpoints, authenticated with a write key.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::transport::{send_delete, send_post, Transport};
use crate::types::{CreateGroupBody, CreateMemberBody, CreateMemberParams};

/// Facade over the group/member create and delete endpoints.
#[derive(Clone)]
pub struct WriteApi {
    config: ClientConfig,
    api_write_key: Option<String>,
    transport: Arc<dyn Transport>,
}

impl WriteApi {
    pub fn new(config: ClientConfig, api_write_key: Option<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            api_write_key,
            transport,
        }
    }

    fn key(&self) -> Option<&str> {
        self.api_write_key.as_deref()
    }

    /// `POST groups` with body `{"name": name}`.
    pub fn post_create_group_data(&self, name: &str) -> Result<Value> {
        let url = self.config.endpoint("groups");
        let body = CreateGroupBody { name: name.to_string() };
        send_post(self.transport.as_ref(), &url, self.key(), Some(&body))
    }

    /// `POST groups/{group_id}/members`.
    ///
    /// `params` must describe exactly one of: a `sensor_id`, a
    /// `sensor_index`, or a `sensor_id` with `owner_email` (and optionally
    /// `location_type`). Anything else fails without contacting the API.
    pub fn post_create_member(&self, group_id: u64, params: &CreateMemberParams) -> Result<Value> {
        let body = CreateMemberBody::from_params(params)?;
        tracing::debug!(group_id, mode = body.mode(), "creating group member");
        let url = self.config.endpoint(&format!("groups/{group_id}/members"));
        send_post(self.transport.as_ref(), &url, self.key(), Some(&body))
    }

    /// `DELETE groups/{group_id}`.
    pub fn post_delete_group(&self, group_id: u64) -> Result<Value> {
        let url = self.config.endpoint(&format!("groups/{group_id}"));
        send_delete::<Value>(self.transport.as_ref(), &url, self.key(), None)
    }

    /// `DELETE groups/{group_id}/members/{member_id}`.
    pub fn post_delete_member(&self, group_id: u64, member_id: u64) -> Result<Value> {
        let url = self.config.endpoint(&format!("groups/{group_id}/members/{member_id}"));
        send_delete::<Value>(self.transport.as_ref(), &url, self.key(), None)
    }
}
