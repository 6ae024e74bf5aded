//! Authenticated JSON-over-HTTP helper shared by both platform clients.
//!
//! Every call returns a [`Result`]: transport failures, non-2xx statuses and
//! undecodable bodies are distinct [`ApiError`] variants so callers decide
//! what to do with them.

use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid value {value:?} for header {name}: {source}")]
    InvalidHeader {
        name: &'static str,
        value: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status code for application-level failures, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Bearer-token client for one platform.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    token: String,
}

impl ApiClient {
    pub fn new(token: impl Into<String>, default_headers: HeaderMap) -> Result<Self, ApiError> {
        let http = Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            token: token.into(),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let body = self.execute(url, self.http.get(url).query(query)).await?;
        decode(url, &body)
    }

    pub async fn post_json<B, T>(&self, url: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(url, self.http.post(url).json(payload)).await?;
        decode(url, &body)
    }

    pub async fn delete(&self, url: &str) -> Result<(), ApiError> {
        self.execute(url, self.http.delete(url)).await?;
        Ok(())
    }

    async fn execute(&self, url: &str, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| {
                error!(url = %url, error = ?source, "HTTP request could not be sent");
                ApiError::Transport {
                    url: url.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            error!(url = %url, status = %status, body = %body, "API returned non-success status");
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        debug!(url = %url, status = %status, bytes = body.len(), "API call succeeded");
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
    // DELETE and some POST endpoints may answer with an empty body.
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|source| {
        error!(url = %url, error = %source, "Failed to decode API response");
        ApiError::Decode {
            url: url.to_string(),
            source,
        }
    })
}
