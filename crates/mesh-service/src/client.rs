//! HTTP client for the mesh service endpoints.
//!
//! [`MeshServiceClient`] wraps the service's two operations with
//! [`reqwest`]: synchronous layer extraction (bounded by a request
//! timeout, surfaced as a distinct failure kind) and asynchronous mesh
//! generation (acceptance only; the result arrives later through the
//! callback channel keyed by correlation id).

use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crate::types::{ExtractedLayer, MeshParameters};

/// Default timeout for the synchronous extraction call. Extraction
/// parses the whole PSD, so this is deliberately generous.
const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for the generate-mesh dispatch (acceptance only).
const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the mesh service client.
///
/// Timeouts and transport failures are transient: the pipeline retries
/// them with backoff. An API error is a semantic rejection by the
/// service and is never retried.
#[derive(Debug, thiserror::Error)]
pub enum MeshServiceError {
    /// The request exceeded its timeout.
    #[error("Mesh service request timed out")]
    Timeout,

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Mesh service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service answered 2xx but the body was not the expected shape.
    #[error("Invalid mesh service response: {0}")]
    InvalidResponse(String),
}

impl MeshServiceError {
    /// Whether a retry with backoff could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Request(_))
    }
}

impl From<reqwest::Error> for MeshServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}

/// Response envelope of `/api/extract_layers`.
#[derive(Debug, Deserialize)]
struct ExtractResponse {
    layers: Vec<ExtractedLayer>,
}

/// HTTP client for one mesh service instance.
pub struct MeshServiceClient {
    client: reqwest::Client,
    base_url: String,
    extract_timeout: Duration,
    dispatch_timeout: Duration,
}

impl MeshServiceClient {
    /// Create a new client with default timeouts.
    ///
    /// * `base_url` - service base URL, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            extract_timeout: DEFAULT_EXTRACT_TIMEOUT,
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    /// Override the extraction timeout.
    pub fn with_extract_timeout(mut self, timeout: Duration) -> Self {
        self.extract_timeout = timeout;
        self
    }

    /// Service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Extract all visible layers from a PSD.
    ///
    /// Synchronous: the layer descriptions are the response body.
    /// `POST /api/extract_layers` with the PSD as a multipart upload.
    pub async fn extract_layers(
        &self,
        psd_bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<ExtractedLayer>, MeshServiceError> {
        let part = reqwest::multipart::Part::bytes(psd_bytes)
            .file_name(file_name.to_string())
            .mime_str("image/vnd.adobe.photoshop")
            .map_err(MeshServiceError::Request)?;
        let form = reqwest::multipart::Form::new().part("psd_file", part);

        let response = self
            .client
            .post(format!("{}/api/extract_layers", self.base_url))
            .timeout(self.extract_timeout)
            .multipart(form)
            .send()
            .await?;

        let body: ExtractResponse = Self::parse_response(response).await?;
        Ok(body.layers)
    }

    /// Dispatch mesh generation for one layer image.
    ///
    /// Asynchronous: a 2xx answer only means the work was accepted. The
    /// result arrives later on the callback channel, correlated by
    /// `correlation_id`, never as this call's return value.
    pub async fn generate_mesh(
        &self,
        image_data: &str,
        parameters: &MeshParameters,
        correlation_id: Uuid,
        callback_url: &str,
    ) -> Result<(), MeshServiceError> {
        let body = serde_json::json!({
            "image_data": image_data,
            "parameters": parameters,
            "callback_url": callback_url,
            "job_id": correlation_id,
        });

        let response = self
            .client
            .post(format!("{}/api/generate_mesh", self.base_url))
            .timeout(self.dispatch_timeout)
            .json(&body)
            .send()
            .await?;

        Self::check_status(response).await?;

        tracing::debug!(
            correlation_id = %correlation_id,
            "Mesh generation accepted by service",
        );
        Ok(())
    }

    /// Probe the service's `/health` endpoint.
    pub async fn health(&self) -> Result<(), MeshServiceError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(self.dispatch_timeout)
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MeshServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MeshServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MeshServiceError> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| MeshServiceError::InvalidResponse(e.to_string()))
    }

    /// Assert a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), MeshServiceError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn timeout_and_transport_errors_are_transient() {
        assert!(MeshServiceError::Timeout.is_transient());
        assert!(!MeshServiceError::Api {
            status: 400,
            body: "bad image".into()
        }
        .is_transient());
        assert!(!MeshServiceError::InvalidResponse("truncated".into()).is_transient());
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transient_error() {
        // Nothing listens on this port; the send fails at the transport
        // level and must map to a retryable error kind.
        let client = MeshServiceClient::new("http://127.0.0.1:1");
        let err = client.health().await.unwrap_err();
        assert_matches!(err, MeshServiceError::Request(_) | MeshServiceError::Timeout);
        assert!(err.is_transient());
    }
}
