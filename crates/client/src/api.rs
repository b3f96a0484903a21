//! REST client for the migration backend.
//!
//! Wraps the two backend endpoints (start a migration, fetch one
//! migration's status) using [`reqwest`], attaching the headers produced by
//! a [`RequestSigner`] to every call.

use std::sync::Arc;
use std::time::Duration;

use jobwatch_core::MigrationUpdate;
use reqwest::{Method, Url};

use crate::signing::{RequestSigner, SignError, SigningRequest};

/// Path segment of the start endpoint.
const START_PATH: &str = "start-migration";

/// Path segment of the status endpoint; the migration id follows it.
const STATUS_PATH: &str = "migration-status";

/// Errors from the migration REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum MigrationApiError {
    /// The configured base URL cannot have endpoint paths appended.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The signer could not produce authentication headers.
    #[error("Request signing failed: {0}")]
    Sign(#[from] SignError),

    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Migration API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// HTTP client for one migration backend.
pub struct MigrationApi {
    client: reqwest::Client,
    base_url: Url,
    signer: Arc<dyn RequestSigner>,
}

impl std::fmt::Debug for MigrationApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MigrationApi {
    /// Create a client for the backend at `base_url`.
    ///
    /// * `timeout` - Per-request timeout; `None` leaves requests unbounded.
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self, MigrationApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(builder.build()?, base_url, signer)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self, MigrationApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MigrationApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MigrationApiError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            signer,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ask the backend to start a new migration.
    ///
    /// Sends `POST {base}/start-migration`. Only a 2xx response counts as
    /// success; the body is the backend's view of the new job.
    pub async fn start(&self) -> Result<MigrationUpdate, MigrationApiError> {
        let url = self.endpoint(&[START_PATH]);
        let response = self.send(Method::POST, url).await?;
        Self::parse_response(response).await
    }

    /// Fetch the current status of one migration.
    ///
    /// Sends `GET {base}/migration-status/{id}` with the id encoded as a
    /// single path segment.
    pub async fn fetch_status(
        &self,
        migration_id: &str,
    ) -> Result<MigrationUpdate, MigrationApiError> {
        let url = self.endpoint(&[STATUS_PATH, migration_id]);
        let response = self.send(Method::GET, url).await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Append `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor: the base URL can always take segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sign and send a body-less request.
    async fn send(&self, method: Method, url: Url) -> Result<reqwest::Response, MigrationApiError> {
        let headers = self.signer.sign(&SigningRequest {
            method: &method,
            path: url.path(),
            body: &[],
        })?;

        tracing::debug!(%method, url = %url, "Calling migration backend");

        Ok(self
            .client
            .request(method, url)
            .headers(headers)
            .send()
            .await?)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`MigrationApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MigrationApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MigrationApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MigrationApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
