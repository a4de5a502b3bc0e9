#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! HTTP client for the rider-safety backend JSON API.
//!
//! The backend is a black box consumed over four endpoints (stations,
//! incidents, predictions, statistics) plus a best-effort sync trigger.
//! Every call is a single request — failures surface to the caller so
//! the owning view can show an inline error and keep its last good
//! state. There is deliberately no automatic retry at this layer.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use transit_safety_api_models::{
    ApiIncident, ApiPrediction, ApiStation, ApiStatistics, StatsPeriod,
};

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur talking to the backend.
///
/// A malformed response body (wrong shape, missing fields) is the same
/// class of failure as a network error: the caller preserves its last
/// good data and shows an inline error either way.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },
}

/// Async seam over the backend API.
///
/// View-state crates depend on this trait instead of the concrete
/// client so they can be driven by a scripted fake in tests.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Fetches the full station list.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the body is not an
    /// array of stations.
    async fn fetch_stations(&self) -> Result<Vec<ApiStation>, ApiError>;

    /// Fetches the reported incidents.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the body is not an
    /// array of incidents.
    async fn fetch_incidents(&self) -> Result<Vec<ApiIncident>, ApiError>;

    /// Fetches the current prediction set.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the body is not an
    /// array of predictions.
    async fn fetch_predictions(&self) -> Result<Vec<ApiPrediction>, ApiError>;

    /// Fetches aggregate statistics for the given period.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the body is not a
    /// statistics object.
    async fn fetch_statistics(&self, period: &StatsPeriod) -> Result<ApiStatistics, ApiError>;

    /// Triggers a best-effort background incident sync. Any 2xx answer
    /// means accepted; there is no response body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the backend rejects
    /// the trigger.
    async fn sync_incidents(&self) -> Result<(), ApiError>;
}

/// Truncates `text` to at most [`BODY_PREVIEW_LEN`] bytes without
/// splitting a multibyte character.
fn body_preview(text: &str) -> &str {
    let mut end = BODY_PREVIEW_LEN.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Reqwest-backed implementation of [`BackendApi`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends one GET request and parses the body as `T`.
    ///
    /// The body is read as text first so a parse failure can log a
    /// preview of what actually arrived.
    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("GET {url} failed with HTTP {status}");
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            let preview = if text.len() > BODY_PREVIEW_LEN {
                format!("{}...", body_preview(&text))
            } else {
                text.clone()
            };
            log::warn!(
                "GET {url} returned an unexpected body: {e}\n  body preview: {preview}"
            );
            ApiError::Malformed {
                message: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn fetch_stations(&self) -> Result<Vec<ApiStation>, ApiError> {
        self.get_json("/api/stations", &[]).await
    }

    async fn fetch_incidents(&self) -> Result<Vec<ApiIncident>, ApiError> {
        self.get_json("/api/incidents", &[]).await
    }

    async fn fetch_predictions(&self) -> Result<Vec<ApiPrediction>, ApiError> {
        self.get_json("/api/predictions", &[]).await
    }

    async fn fetch_statistics(&self, period: &StatsPeriod) -> Result<ApiStatistics, ApiError> {
        self.get_json("/api/statistics", &period.query_pairs()).await
    }

    async fn sync_incidents(&self) -> Result<(), ApiError> {
        let url = self.endpoint("/api/sync-incidents");
        let response = self.client.post(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            log::warn!("POST {url} rejected with HTTP {status}");
            Err(ApiError::Status {
                status: status.as_u16(),
            })
        }
    }
}
