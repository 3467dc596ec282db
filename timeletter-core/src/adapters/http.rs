//! Time letter API client
//!
//! Talks to the letter service over JSON/HTTP:
//! - POST /api/time-letters
//! - GET  /api/time-letters/history?email=...
//! - GET  /api/time-letters/{id}
//! - GET  /health
//!
//! All requests go through one fetch helper that sets the JSON content type,
//! merges extra headers and normalizes failures into [`Error`].

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::domain::datetime::to_iso_utc;
use crate::domain::result::{Error, Result};
use crate::domain::{
    CreateLetterRequest, CreateLetterResponse, HealthStatus, HistoryResponse, LetterDetail,
};
use crate::ports::LetterGateway;

/// Default letter service address
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the letter service address
pub const API_BASE_URL_ENV: &str = "TIMELETTER_API_BASE_URL";

const LETTERS_PATH: &str = "/api/time-letters";
const HEALTH_PATH: &str = "/health";

/// Message used when the request never got an HTTP response
pub const NETWORK_FAILURE: &str = "Network request failed";

/// HTTP implementation of [`LetterGateway`]
#[derive(Debug, Clone)]
pub struct HttpLetterGateway {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpLetterGateway {
    /// Create a client for `base_url` with no request timeout
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client for `base_url`; `None` leaves timeouts to the transport
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            anyhow::bail!("Letter service URL cannot be empty");
        }
        let parsed = Url::parse(base_url).context("Invalid letter service URL")?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Letter service URL must use http or https");
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            headers: HeaderMap::new(),
        })
    }

    /// Add a header sent with every request (overrides the default content type)
    pub fn with_header(mut self, name: &str, value: &str) -> anyhow::Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).context("Invalid header name")?;
        let value = HeaderValue::from_str(value).context("Invalid header value")?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| Error::Config(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Shared request path: headers, send, status check, JSON decode
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(self.headers.clone());

        let response = request
            .headers(headers)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "letter service returned an error");
            return Err(error_from_body(status.as_u16(), &body));
        }

        let body = response.bytes().await.map_err(map_request_error)?;
        serde_json::from_slice(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// Map transport errors to the network error shape
fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::network(format!("{}: request timed out", NETWORK_FAILURE))
    } else if error.is_connect() {
        Error::network(format!("{}: unable to reach the letter service", NETWORK_FAILURE))
    } else {
        Error::network(format!("{}: {}", NETWORK_FAILURE, error))
    }
}

/// Build an API error from a non-success response body
///
/// The service's own `message` (or FastAPI's string `detail`) is kept
/// verbatim; anything else becomes a status-coded generic message.
fn error_from_body(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| value.get("detail").and_then(|d| d.as_str()))
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {}", status));

    Error::Api { status, message }
}

#[async_trait]
impl LetterGateway for HttpLetterGateway {
    async fn create_letter(&self, request: &CreateLetterRequest) -> Result<CreateLetterResponse> {
        let body = CreateLetterRequest {
            delivery_time: to_iso_utc(&request.delivery_time)?,
            ..request.clone()
        };
        let url = self.endpoint(LETTERS_PATH)?;
        tracing::debug!(path = LETTERS_PATH, "creating letter");

        self.fetch(self.client.post(url).json(&body)).await
    }

    async fn get_history(&self, email: &str) -> Result<HistoryResponse> {
        let mut url = self.endpoint(&format!("{}/history", LETTERS_PATH))?;
        url.query_pairs_mut().append_pair("email", email);
        tracing::debug!(path = "/api/time-letters/history", "loading history");

        self.fetch(self.client.get(url)).await
    }

    async fn get_letter(&self, letter_id: &str) -> Result<LetterDetail> {
        let mut url = self.endpoint(LETTERS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Letter service URL cannot be a base".to_string()))?
            .push(letter_id);

        self.fetch(self.client.get(url)).await
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        let url = self.endpoint(HEALTH_PATH)?;
        self.fetch(self.client.get(url)).await
    }
}
