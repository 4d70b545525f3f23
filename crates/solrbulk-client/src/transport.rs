//! A single HTTP round trip against an update handler.

use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::trace;

use solrbulk_types::{BasicAuth, Options};

use crate::error::{ClientError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request against the update handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub method: Method,
    /// Update handler URL without query string
    pub url: String,
    /// Query parameters, encoded by the transport
    pub query: Vec<(String, String)>,
    /// JSON body for POST requests
    pub body: Option<String>,
}

impl UpdateRequest {
    /// POST a JSON body.
    pub fn post_json(url: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// GET with no parameters.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Value of a query parameter, if present.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_commit(&self) -> bool {
        self.query_param("commit") == Some("true") || self.query_param("stream.body") == Some("<commit/>")
    }

    /// Human readable URL for logs; parameters are not percent-encoded.
    pub fn display_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let params: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", self.url, params.join("&"))
    }
}

/// Status and body of a completed round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResponse {
    pub status: u16,
    pub body: String,
}

impl UpdateResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP round trip, without retries.
///
/// Any response the server produced, including 4xx and 5xx, is `Ok`;
/// `Err` means no usable response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &UpdateRequest) -> Result<UpdateResponse, TransportError>;
}

/// reqwest-backed transport.
///
/// Attaches basic auth, when configured, to every request it sends.
pub struct HttpTransport {
    client: Client,
    auth: Option<HeaderValue>,
}

impl HttpTransport {
    pub fn new(options: &Options) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let auth = options
            .basic_auth
            .as_ref()
            .map(authorization)
            .transpose()?;

        Ok(Self { client, auth })
    }
}

/// `Basic` header over the credential exactly as configured.
fn authorization(auth: &BasicAuth) -> Result<HeaderValue, ClientError> {
    let encoded = BASE64_STANDARD.encode(auth.credential.expose_secret());
    let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))
        .map_err(|e| ClientError::Config(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &UpdateRequest) -> Result<UpdateResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(auth) = &self.auth {
            builder = builder.header(AUTHORIZATION, auth.clone());
        }

        if let Some(body) = &request.body {
            builder = builder
                .header("Content-Type", "application/json")
                .body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        trace!(status, url = %request.display_url(), "Update handler responded");

        Ok(UpdateResponse { status, body })
    }
}
