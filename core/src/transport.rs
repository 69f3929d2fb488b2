//! Blocking HTTP transport and the shared request helpers.
//!
//! # Design
//! `Transport` is the only place that performs I/O. `UreqTransport` is the
//! production implementation; tests substitute a recording fake. The
//! `send_*` helpers sit on top: they attach the API key, dispatch the
//! request, parse the body as JSON and classify the status code.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::status::verify_status_code;

/// Largest response body read into memory. Long `/history/csv` exports
/// exceed ureq's 10 MB default.
pub const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// Executes one HTTP round-trip.
///
/// Implementations must return 4xx/5xx responses as data rather than
/// `Err`; status interpretation belongs to [`verify_status_code`].
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// `Transport` backed by a blocking `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Delete => {
                let mut builder = self.agent.delete(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.force_send_body().send(body.as_bytes()),
                    None => builder.call(),
                }
            }
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// Parse a response body; an empty body yields `Value::Null`.
pub fn parse_json_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Build the error for a response whose status is in the error set, using
/// the payload's `error` and `description` fields when present.
fn status_failure(response: &HttpResponse) -> ApiError {
    // Failure bodies are not guaranteed to be JSON.
    let payload = parse_json_body(&response.body).unwrap_or(Value::Null);
    let field = |name: &str| payload.get(name).and_then(Value::as_str).map(str::to_string);
    let err = ApiError::Status {
        status: response.status,
        error: field("error"),
        description: field("description"),
    };
    tracing::warn!(status = response.status, "request rejected: {err}");
    err
}

fn into_payload(response: HttpResponse) -> Result<Value> {
    if verify_status_code(response.status)? {
        parse_json_body(&response.body)
    } else {
        Err(status_failure(&response))
    }
}

/// Query parameters carrying sensor read keys.
const SECRET_PARAMS: [&str; 2] = ["read_key", "read_keys"];

/// `url` with the values of [`SECRET_PARAMS`] masked, for logging.
fn redact_url(url: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if SECRET_PARAMS.contains(&name) => format!("{name}=REDACTED"),
            _ => pair.to_string(),
        })
        .collect();
    format!("{path}?{}", query.join("&"))
}

fn dispatch(transport: &dyn Transport, request: HttpRequest) -> Result<HttpResponse> {
    if request.url.is_empty() {
        return Err(ApiError::config("A request URL string must be provided"));
    }
    tracing::debug!(method = ?request.method, url = %redact_url(&request.url), "sending request");
    transport.execute(&request)
}

/// GET `url` and return the parsed JSON payload.
pub fn send_get(transport: &dyn Transport, url: &str, api_key: Option<&str>) -> Result<Value> {
    let request = HttpRequest::get(url).with_api_key(api_key);
    into_payload(dispatch(transport, request)?)
}

/// GET `url` and return the raw body text, for endpoints that answer in CSV.
pub fn send_get_text(transport: &dyn Transport, url: &str, api_key: Option<&str>) -> Result<String> {
    let request = HttpRequest::get(url).with_api_key(api_key);
    let response = dispatch(transport, request)?;
    if verify_status_code(response.status)? {
        Ok(response.body)
    } else {
        Err(status_failure(&response))
    }
}

/// POST `url` with an optional JSON body.
pub fn send_post<B: Serialize + ?Sized>(
    transport: &dyn Transport,
    url: &str,
    api_key: Option<&str>,
    body: Option<&B>,
) -> Result<Value> {
    let mut request = HttpRequest::post(url).with_api_key(api_key);
    if let Some(body) = body {
        request = request.with_json_body(body)?;
    }
    into_payload(dispatch(transport, request)?)
}

/// DELETE `url` with an optional JSON body.
pub fn send_delete<B: Serialize + ?Sized>(
    transport: &dyn Transport,
    url: &str,
    api_key: Option<&str>,
    body: Option<&B>,
) -> Result<Value> {
    let mut request = HttpRequest::delete(url).with_api_key(api_key);
    if let Some(body) = body {
        request = request.with_json_body(body)?;
    }
    into_payload(dispatch(transport, request)?)
}
