//! Transport to the node.
//!
//! [`Transport`] is the seam between request construction and the wire.
//! [`HttpTransport`] speaks JSON-RPC 2.0 over HTTP; tests and embedders can
//! supply their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::error::RpcError;

/// Network configuration presets.
pub struct NetworkConfig {
    /// The RPC URL for this network.
    pub rpc_url: &'static str,
    /// The network identifier keys are stored under.
    pub network_id: &'static str,
}

/// A node running on this machine with its default RPC port.
pub const LOCAL: NetworkConfig = NetworkConfig {
    rpc_url: "http://127.0.0.1:3030",
    network_id: "local",
};

/// Sends one request to the node and returns its result document.
///
/// An implementation must make exactly one attempt per call: no retries, no
/// caching. Failures reaching the node or reading its reply are transport
/// errors; an explicit error reply from the node is [`RpcError::Node`].
pub trait Transport: Send + Sync {
    /// Send `method` with `params` and wait for the result.
    fn send<'a>(
        &'a self,
        method: &'a str,
        params: serde_json::Value,
    ) -> BoxFuture<'a, Result<serde_json::Value, RpcError>>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send<'a>(
        &'a self,
        method: &'a str,
        params: serde_json::Value,
    ) -> BoxFuture<'a, Result<serde_json::Value, RpcError>> {
        (**self).send(method, params)
    }
}

/// JSON-RPC request structure.
#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

/// JSON-RPC 2.0 transport over HTTP.
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
    request_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport posting to the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            timeout: None,
            request_id: AtomicU64::new(0),
        }
    }

    /// Create a transport whose requests fail after `timeout`.
    ///
    /// A timed-out request surfaces as a transport failure.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
            timeout: Some(timeout),
            request_id: AtomicU64::new(0),
        })
    }

    /// Get the RPC URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a single JSON-RPC call.
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::debug!(url = %self.url, method, id = request.id, "sending rpc request");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::trace!(method, status = status.as_u16(), body = %body, "rpc response");

        if !status.is_success() {
            return Err(RpcError::network(
                format!("HTTP {}: {}", status, body),
                Some(status.as_u16()),
            ));
        }

        parse_response(&body)
    }
}

/// Split a JSON-RPC reply into its result or its error.
///
/// A `null` result is a valid result.
fn parse_response(body: &str) -> Result<serde_json::Value, RpcError> {
    let mut response: serde_json::Value = serde_json::from_str(body)?;
    let Some(object) = response.as_object_mut() else {
        return Err(RpcError::InvalidResponse(
            "Response is not a JSON object".to_string(),
        ));
    };

    match object.remove("error") {
        None | Some(serde_json::Value::Null) => {}
        Some(error) => return Err(parse_rpc_error(error)),
    }

    object
        .remove("result")
        .ok_or_else(|| RpcError::InvalidResponse("Missing result in response".to_string()))
}

/// Turn a JSON-RPC error member into a node error.
fn parse_rpc_error(error: serde_json::Value) -> RpcError {
    match error {
        serde_json::Value::Object(mut map) => {
            let code = map
                .get("code")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0);
            let message = match map.remove("message") {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => "Unknown error".to_string(),
            };
            let data = map.remove("data").filter(|d| !d.is_null());
            RpcError::node(code, message, data)
        }
        serde_json::Value::String(message) => RpcError::node(0, message, None),
        other => RpcError::node(0, other.to_string(), None),
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        method: &'a str,
        params: serde_json::Value,
    ) -> BoxFuture<'a, Result<serde_json::Value, RpcError>> {
        Box::pin(self.call(method, params))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
