use crate::error::{GatewayError, GatewayResult};
use crate::types::{PaymentOutcome, PaymentStatus};
use reqwest::{Client, Method};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// How a transport-level fault is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    Tls,
    Other,
}

impl FailureKind {
    pub fn status_code(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connection => "connection-error",
            FailureKind::Tls => "tls-error",
            FailureKind::Other => "transport-error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl TransportFailure {
    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connection
        } else if error_chain_mentions_tls(&err) {
            FailureKind::Tls
        } else {
            FailureKind::Other
        };
        Self {
            kind,
            detail: err.to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self.kind {
            FailureKind::Timeout => "provider request timed out".to_string(),
            FailureKind::Connection => {
                format!("connection error while reaching provider: {}", self.detail)
            }
            FailureKind::Tls => format!("TLS verification failed: {}", self.detail),
            FailureKind::Other => format!("transport error: {}", self.detail),
        }
    }

    /// Normalizes the failure into the canonical result shape so adapters
    /// never surface a raw transport fault to their caller.
    pub fn into_outcome(self) -> PaymentOutcome {
        PaymentOutcome {
            status: PaymentStatus::Failed,
            provider_status_code: self.kind.status_code().to_string(),
            message: self.message(),
            transaction_id: String::new(),
            raw_payload: None,
        }
    }
}

fn error_chain_mentions_tls(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        let text = current.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return true;
        }
        source = current.source();
    }
    false
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub enum RequestBody<'a> {
    Json(&'a JsonValue),
    Xml(&'a str),
}

/// Minimal authenticated HTTP wrapper shared by all adapters.
///
/// One `reqwest::Client` per transport so connections are reused across
/// calls. The wrapper performs exactly one attempt per `send`: OTP flows are
/// time-sensitive and a duplicate submission debits the customer twice, so
/// retrying is a caller decision, never a transport one.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration, verify_tls: bool) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| GatewayError::Configuration {
                message: format!("failed to initialize HTTP client: {}", e),
                field: None,
            })?;
        Ok(Self { client, timeout })
    }

    /// Performs one HTTP exchange. Every transport-level problem comes back
    /// as a classified [`TransportFailure`]; any HTTP response, whatever its
    /// status code, comes back as [`RawResponse`] for the adapter to decode.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        basic_auth: Option<(&str, &str)>,
        headers: &[(&str, &str)],
        body: Option<RequestBody<'_>>,
    ) -> Result<RawResponse, TransportFailure> {
        let mut request = self.client.request(method, url).timeout(self.timeout);

        if let Some((username, password)) = basic_auth {
            request = request.basic_auth(username, Some(password));
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        match body {
            Some(RequestBody::Json(payload)) => request = request.json(payload),
            Some(RequestBody::Xml(payload)) => {
                request = request
                    .header("content-type", "application/xml")
                    .body(payload.to_string());
            }
            None => {}
        }

        let response = request.send().await.map_err(TransportFailure::from_reqwest)?;
        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(TransportFailure::from_reqwest)?;

        debug!(status = status_code, bytes = body.len(), "provider response received");

        Ok(RawResponse {
            status_code,
            headers,
            body,
        })
    }
}
