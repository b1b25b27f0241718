//! Inference gateway client.
//!
//! Hosted model endpoints are invoked per request: connect (a handshake
//! against the endpoint's info route) is a distinct, failable step from the
//! invocation itself, and the two report different error kinds so handlers
//! can degrade or fail appropriately. Every invocation races the configured
//! time budget; whichever settles first wins and the loser is discarded
//! locally. No retries, no remote cancellation.
//!
//! Wire convention: `GET {endpoint}/info` to establish a session, then
//! `POST {endpoint}/run/{operation}` with a JSON `data` envelope. Binary
//! inputs travel as base64 data URIs; the response carries an ordered `data`
//! array of untyped outputs interpreted by [`normalize`].

pub mod normalize;

use crate::config::{EndpointConfig, GatewayConfig};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Inference gateway errors.
///
/// Connection, invocation, and timeout are deliberately distinct kinds:
/// categorization degrades on any of them, while background removal and
/// try-on report service-unavailable. A response kind covers payloads the
/// gateway returned but this client cannot use.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Establishing a session with the endpoint failed
    #[error("failed to connect to inference endpoint {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// The session was established but the call was rejected or broke mid-flight
    #[error("invoking {operation} on {endpoint} failed: {message}")]
    Invocation {
        endpoint: String,
        operation: String,
        message: String,
    },

    /// The time budget elapsed before the gateway settled
    #[error("{operation} on {endpoint} did not settle within {budget:?}")]
    Timeout {
        endpoint: String,
        operation: String,
        budget: Duration,
    },

    /// The gateway responded but its payload envelope was unusable
    #[error("{operation} on {endpoint} returned an unusable response: {message}")]
    Response {
        endpoint: String,
        operation: String,
        message: String,
    },
}

/// Type alias for gateway operation results
pub type Result<T> = std::result::Result<T, GatewayError>;

/// One named input to an inference operation
#[derive(Debug, Clone)]
pub enum GatewayValue {
    /// Binary payload, sent as a base64 data URI alongside its filename
    Blob {
        filename: String,
        content_type: String,
        bytes: Bytes,
    },
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// Ordered named inputs for one invocation
#[derive(Debug, Clone, Default)]
pub struct GatewayInputs(Vec<(String, GatewayValue)>);

impl GatewayInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, name: impl Into<String>, value: GatewayValue) -> Self {
        self.0.push((name.into(), value));
        self
    }

    fn to_body(&self) -> Value {
        let mut data = serde_json::Map::new();
        for (name, value) in &self.0 {
            let encoded = match value {
                GatewayValue::Blob {
                    filename,
                    content_type,
                    bytes,
                } => json!({
                    "name": filename,
                    "data": format!("data:{content_type};base64,{}", STANDARD.encode(bytes)),
                }),
                GatewayValue::Text(s) => json!(s),
                GatewayValue::Bool(b) => json!(b),
                GatewayValue::Int(i) => json!(i),
                GatewayValue::Float(f) => json!(f),
            };
            data.insert(name.clone(), encoded);
        }
        json!({ "data": Value::Object(data) })
    }
}

/// The ordered list of raw output values returned by one invocation.
///
/// Shapes are untyped; interpretation is centralized in [`normalize`].
#[derive(Debug, Clone)]
pub struct InferenceResult {
    outputs: Vec<Value>,
}

impl InferenceResult {
    pub fn outputs(&self) -> &[Value] {
        &self.outputs
    }

    pub fn first(&self) -> Option<&Value> {
        self.outputs.first()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Cheap-clone client for hosted inference endpoints.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    http: reqwest::Client,
    connect_timeout: Duration,
    invoke_timeout: Duration,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().connect_timeout(config.connect_timeout).build()?;
        Ok(Self {
            http,
            connect_timeout: config.connect_timeout,
            invoke_timeout: config.invoke_timeout,
        })
    }

    /// Establish a session with `endpoint`.
    ///
    /// Any failure here, including a handshake that exceeds the connect
    /// budget, is a [`GatewayError::Connection`]; the timeout kind is reserved
    /// for the invocation race.
    pub async fn connect(&self, endpoint: &EndpointConfig) -> Result<GatewaySession> {
        let info_url = format!("{}/info", endpoint.url.as_str().trim_end_matches('/'));

        let handshake = self.http.get(&info_url).send();
        let response = match tokio::time::timeout(self.connect_timeout, handshake).await {
            Ok(result) => result.map_err(|e| GatewayError::Connection {
                endpoint: endpoint.url.to_string(),
                message: e.to_string(),
            })?,
            Err(_) => {
                return Err(GatewayError::Connection {
                    endpoint: endpoint.url.to_string(),
                    message: format!("handshake did not settle within {:?}", self.connect_timeout),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Connection {
                endpoint: endpoint.url.to_string(),
                message: format!("handshake returned {status}"),
            });
        }

        tracing::debug!(endpoint = %endpoint.url, operation = %endpoint.operation, "gateway session established");
        Ok(GatewaySession {
            client: self.clone(),
            endpoint: endpoint.clone(),
        })
    }
}

/// An established session against one endpoint
#[derive(Debug)]
pub struct GatewaySession {
    client: GatewayClient,
    endpoint: EndpointConfig,
}

impl GatewaySession {
    /// Invoke the endpoint's operation, racing the call against the invoke
    /// budget. Whichever settles first wins; the losing call is dropped
    /// locally, never cancelled remotely.
    pub async fn invoke(&self, inputs: GatewayInputs) -> Result<InferenceResult> {
        let run_url = format!(
            "{}/run/{}",
            self.endpoint.url.as_str().trim_end_matches('/'),
            self.endpoint.operation
        );

        match tokio::time::timeout(self.client.invoke_timeout, self.send(&run_url, inputs)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                endpoint: self.endpoint.url.to_string(),
                operation: self.endpoint.operation.clone(),
                budget: self.client.invoke_timeout,
            }),
        }
    }

    async fn send(&self, url: &str, inputs: GatewayInputs) -> Result<InferenceResult> {
        let response = self
            .client
            .http
            .post(url)
            .json(&inputs.to_body())
            .send()
            .await
            .map_err(|e| self.invocation_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.invocation_error(format!("operation returned {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.response_error(format!("invalid JSON body: {e}")))?;

        let outputs = match body.get("data").and_then(Value::as_array) {
            Some(array) => array.clone(),
            None => return Err(self.response_error("response carries no data array".to_string())),
        };

        Ok(InferenceResult { outputs })
    }

    fn invocation_error(&self, message: String) -> GatewayError {
        GatewayError::Invocation {
            endpoint: self.endpoint.url.to_string(),
            operation: self.endpoint.operation.clone(),
            message,
        }
    }

    fn response_error(&self, message: String) -> GatewayError {
        GatewayError::Response {
            endpoint: self.endpoint.url.to_string(),
            operation: self.endpoint.operation.clone(),
            message,
        }
    }
}
