//! Temporary image hosting client.
//!
//! The generation API only accepts publicly reachable image URLs, so each
//! local image is pushed to tmpfiles.org (free, no API key) for the duration
//! of the run. The returned landing-page URL is rewritten into its
//! direct-download form before being handed to the generation service.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default base URL for the temporary file host.
pub const UPLOAD_BASE_URL: &str = "https://tmpfiles.org";

/// Path segment replaced to turn a landing-page URL into a direct link.
const LANDING_SEGMENT: &str = "tmpfiles.org/";
const DIRECT_SEGMENT: &str = "tmpfiles.org/dl/";

/// Default timeout for upload requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response envelope from the upload endpoint.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    status: String,
    #[serde(default)]
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

/// Errors that can occur during image upload.
///
/// Any of these is a fatal precondition for processing the image: the caller
/// counts all of that image's tasks as failed and moves on. Nothing is
/// retried at this layer.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Upload response reported status {0:?}")]
    NotSuccess(String),

    #[error("Upload succeeded but no URL in response")]
    MissingUrl,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rewrite a landing-page URL into its direct-download form.
///
/// Replaces the first `tmpfiles.org/` path segment with `tmpfiles.org/dl/`.
/// URLs without the segment pass through unchanged.
pub fn direct_download_url(url: &str) -> String {
    url.replacen(LANDING_SEGMENT, DIRECT_SEGMENT, 1)
}

/// Client for pushing local images to the temporary host.
pub struct UploadClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl UploadClient {
    /// Create a new UploadClient against the default host.
    pub fn new() -> Result<Self, UploadError> {
        Self::with_base_url(UPLOAD_BASE_URL.to_string())
    }

    /// Create a new UploadClient with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(base_url: String) -> Result<Self, UploadError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a local image and return its direct-download URL.
    ///
    /// Reads the file bytes and performs a single multipart POST. On success
    /// the returned URL is already rewritten into direct-download form.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Rejected` for non-200 responses,
    /// `UploadError::NotSuccess` when the response envelope reports anything
    /// other than `"success"`, `UploadError::MissingUrl` when the envelope
    /// has no URL, and `UploadError::Http` for transport or JSON failures.
    pub async fn upload_image(&self, path: &Path) -> Result<String, UploadError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/api/v1/upload", self.base_url);
        let response = self.http_client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UploadError::Rejected { status, body });
        }

        let upload: UploadResponse = response.json().await?;
        if upload.status != "success" {
            return Err(UploadError::NotSuccess(upload.status));
        }

        match upload.data {
            Some(data) => {
                let direct = direct_download_url(&data.url);
                log::info!("Uploaded {} -> {}", path.display(), direct);
                Ok(direct)
            }
            None => Err(UploadError::MissingUrl),
        }
    }
}
