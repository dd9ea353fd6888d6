//! reqwest implementation of [`AgentBackend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::BackendError;
use crate::AgentBackend;

/// Backend reached over plain HTTP with JSON bodies and no auth.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Create a client rooted at `base_url`.
    ///
    /// `timeout` bounds each whole request (connect, send and body read).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let base_url = normalize_base_url(base_url)?;

        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for an endpoint name.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| BackendError::InvalidBaseUrl(e.to_string()))
    }

    fn classify_error(&self, err: reqwest::Error) -> BackendError {
        match (err.is_timeout(), self.timeout) {
            (true, Some(t)) => BackendError::Timeout(t),
            _ => err.into(),
        }
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, BackendError> {
        let url = self.endpoint_url(endpoint)?;
        tracing::debug!(%url, "POST");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(endpoint, status = status.as_u16(), "Backend rejected request");
            return Err(BackendError::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.classify_error(e)
            } else {
                BackendError::Decode(e.to_string())
            }
        })
    }
}

/// Parse the base URL and make sure it ends with `/` so endpoint names are
/// appended rather than replacing the last path segment.
fn normalize_base_url(raw: &str) -> Result<Url, BackendError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash).map_err(|e| BackendError::InvalidBaseUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BackendError::InvalidBaseUrl(format!(
            "unsupported scheme: {}",
            other
        ))),
    }
}
