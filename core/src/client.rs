//! Entry point combining the read, write and local facades.
//!
//! # Design
//! `PurpleAirClient` owns up to three independent facades that share one
//! `Transport`. Building the client checks each supplied API key once
//! against `GET keys` and verifies that it has the privilege it was passed
//! in for. The per-key results are kept in maps owned by the client and are
//! only exposed read-only. The maps are keyed by the raw key strings, so
//! treat them as secrets.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::local::LocalApi;
use crate::read::ReadApi;
use crate::transport::{send_get, Transport, UreqTransport};
use crate::types::{ApiKeyType, KeyInfo};
use crate::write::WriteApi;

/// Client for the PurpleAir cloud API and for local sensors.
#[derive(Clone)]
pub struct PurpleAirClient {
    read: Option<ReadApi>,
    write: Option<WriteApi>,
    local: Option<LocalApi>,
    api_versions: HashMap<String, String>,
    api_keys_last_checked: HashMap<String, i64>,
    api_key_types: HashMap<String, ApiKeyType>,
}

/// Collects the client's credentials and settings; see
/// [`PurpleAirClient::builder`].
#[derive(Default)]
pub struct PurpleAirClientBuilder {
    read_key: Option<String>,
    write_key: Option<String>,
    ipv4_addresses: Option<Vec<String>>,
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl PurpleAirClientBuilder {
    pub fn read_key(mut self, key: impl Into<String>) -> Self {
        self.read_key = Some(key.into());
        self
    }

    pub fn write_key(mut self, key: impl Into<String>) -> Self {
        self.write_key = Some(key.into());
        self
    }

    pub fn ipv4_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ipv4_addresses = Some(addresses.into_iter().map(Into::into).collect());
        self
    }

    /// Defaults to [`ClientConfig::default`].
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Defaults to a [`UreqTransport`] using the configured timeout.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the configuration and check every supplied key against the
    /// API.
    pub fn build(self) -> Result<PurpleAirClient> {
        if self.read_key.is_none() && self.write_key.is_none() && self.ipv4_addresses.is_none() {
            return Err(ApiError::config(
                "Ensure that the right combination of parameters have been provided! \
                 `your_api_read_key` or `your_api_write_key` for external internet requests. \
                 Or just `your_ipv4_address` for local network requests",
            ));
        }

        let config = self.config.unwrap_or_default();
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::new(config.timeout)));

        let mut client = PurpleAirClient {
            read: None,
            write: None,
            local: None,
            api_versions: HashMap::new(),
            api_keys_last_checked: HashMap::new(),
            api_key_types: HashMap::new(),
        };

        if let Some(key) = &self.read_key {
            client.check_api_key(&config, transport.as_ref(), key)?;
        }
        if let Some(key) = &self.write_key {
            client.check_api_key(&config, transport.as_ref(), key)?;
        }

        if let Some(addresses) = self.ipv4_addresses {
            client.local = Some(LocalApi::new(addresses, transport.clone())?);
        }

        if let Some(key) = self.read_key {
            if client.api_key_types.get(&key) != Some(&ApiKeyType::Read) {
                return Err(ApiError::config("Ensure 'your_api_read_key' is a read key."));
            }
            tracing::info!("successfully authenticated read key");
            client.read = Some(ReadApi::new(config.clone(), Some(key), transport.clone()));
        }

        if let Some(key) = self.write_key {
            if client.api_key_types.get(&key) != Some(&ApiKeyType::Write) {
                return Err(ApiError::config("Ensure 'your_api_write_key' is a write key."));
            }
            tracing::info!("successfully authenticated write key");
            client.write = Some(WriteApi::new(config.clone(), Some(key), transport.clone()));
        }

        tracing::debug!(
            api_versions = client.api_versions.len(),
            api_keys_last_checked = client.api_keys_last_checked.len(),
            api_key_types = client.api_key_types.len(),
            local_hosts = client.local.as_ref().map_or(0, |l| l.ipv4_addresses().len()),
            "client ready"
        );

        Ok(client)
    }
}

impl PurpleAirClient {
    pub fn builder() -> PurpleAirClientBuilder {
        PurpleAirClientBuilder::default()
    }

    /// Build a client against the public API with the default transport.
    /// At least one argument must be `Some`.
    pub fn new(
        your_api_read_key: Option<&str>,
        your_api_write_key: Option<&str>,
        your_ipv4_addresses: Option<Vec<String>>,
    ) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(key) = your_api_read_key {
            builder = builder.read_key(key);
        }
        if let Some(key) = your_api_write_key {
            builder = builder.write_key(key);
        }
        if let Some(addresses) = your_ipv4_addresses {
            builder = builder.ipv4_addresses(addresses);
        }
        builder.build()
    }

    /// `GET keys` with `key` and record what the API reports about it.
    fn check_api_key(&mut self, config: &ClientConfig, transport: &dyn Transport, key: &str) -> Result<()> {
        let payload = send_get(transport, &config.endpoint("keys"), Some(key))?;
        let info: KeyInfo =
            serde_json::from_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))?;

        self.api_versions.insert(key.to_string(), info.api_version);
        self.api_keys_last_checked.insert(key.to_string(), info.time_stamp);
        self.api_key_types.insert(key.to_string(), info.api_key_type);
        Ok(())
    }

    /// The read facade; only present when a read key was supplied.
    pub fn read(&self) -> Result<&ReadApi> {
        self.read
            .as_ref()
            .ok_or_else(|| ApiError::config("no read key was provided to this client"))
    }

    /// The write facade; only present when a write key was supplied.
    pub fn write(&self) -> Result<&WriteApi> {
        self.write
            .as_ref()
            .ok_or_else(|| ApiError::config("no write key was provided to this client"))
    }

    /// The local-network facade; only present when addresses were supplied.
    pub fn local(&self) -> Result<&LocalApi> {
        self.local
            .as_ref()
            .ok_or_else(|| ApiError::config("no IPv4 addresses were provided to this client"))
    }

    /// API version reported for each checked key.
    pub fn api_versions(&self) -> &HashMap<String, String> {
        &self.api_versions
    }

    /// Timestamp at which each key was last checked.
    pub fn api_keys_last_checked(&self) -> &HashMap<String, i64> {
        &self.api_keys_last_checked
    }

    /// Type reported for each checked key.
    pub fn api_key_types(&self) -> &HashMap<String, ApiKeyType> {
        &self.api_key_types
    }
}
