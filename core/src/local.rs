//! Direct polling of sensors on the local network.
//!
//! Each sensor runs an embedded web server answering `GET /json` without
//! authentication. Hosts are polled one after another and the first failure
//! aborts the whole call, so a returned map always covers every host.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::transport::{send_get, Transport};

/// Longest accepted address, `255.255.255.255`.
pub const MAX_ADDRESS_LEN: usize = 15;

/// Facade over one or more sensors reachable on the local network.
#[derive(Clone)]
pub struct LocalApi {
    ipv4_addresses: Vec<String>,
    transport: Arc<dyn Transport>,
}

impl LocalApi {
    /// Fails if `ipv4_addresses` is empty or any entry is empty or longer
    /// than [`MAX_ADDRESS_LEN`].
    pub fn new(ipv4_addresses: Vec<String>, transport: Arc<dyn Transport>) -> Result<Self> {
        const ERROR_MSG: &str = "Must provide the IPv4 address for the sensor on your local network";

        if ipv4_addresses.is_empty() {
            return Err(ApiError::config(ERROR_MSG));
        }
        if let Some(bad) = ipv4_addresses
            .iter()
            .find(|addr| addr.is_empty() || addr.len() > MAX_ADDRESS_LEN)
        {
            return Err(ApiError::config(format!("{ERROR_MSG}, invalid address {bad:?}")));
        }

        Ok(Self {
            ipv4_addresses,
            transport,
        })
    }

    pub fn ipv4_addresses(&self) -> &[String] {
        &self.ipv4_addresses
    }

    /// `GET http://{address}/json` on every configured host, keyed by address.
    pub fn request_local_sensor_data(&self) -> Result<BTreeMap<String, Value>> {
        let mut results = BTreeMap::new();
        for address in &self.ipv4_addresses {
            let url = local_url(address);
            let payload = send_get(self.transport.as_ref(), &url, None)?;
            results.insert(address.clone(), payload);
        }
        Ok(results)
    }
}

fn local_url(address: &str) -> String {
    format!("http://{address}/json")
}
