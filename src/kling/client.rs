//! KlingClient - handles communication with the Kling image-to-video API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use super::auth::issue_token;

/// The environment variable name for the Kling access key.
pub const KLING_ACCESS_KEY_ENV: &str = "KLING_ACCESS_KEY";

/// The environment variable name for the Kling secret key.
pub const KLING_SECRET_KEY_ENV: &str = "KLING_SECRET_KEY";

/// Default base URL for the Kling API.
pub const KLING_API_BASE_URL: &str = "https://api-singapore.klingai.com";

/// Model identifier sent with every generation request.
pub const MODEL_NAME: &str = "kling-v2-1";

/// Quality mode sent with every generation request.
const GENERATION_MODE: &str = "std";

/// Requested clip duration in seconds (the API takes it as a string).
const GENERATION_DURATION: &str = "5";

/// Guidance scale sent with every generation request.
const CFG_SCALE: f64 = 0.5;

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default polling interval for task status checks (5 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default maximum number of status polls before giving up (~5 minutes).
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 60;

/// Request body for image-to-video generation.
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    model_name: &'a str,
    mode: &'a str,
    duration: &'a str,
    /// Publicly reachable URL of the source image.
    image: &'a str,
    prompt: &'a str,
    cfg_scale: f64,
}

/// Standard `{code, message, data}` envelope wrapping every API response.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

/// Submission payload: the assigned task identifier.
#[derive(Debug, Default, Deserialize)]
struct SubmitData {
    task_id: String,
}

/// Status payload for a previously submitted task.
#[derive(Debug, Default, Deserialize)]
struct TaskData {
    task_status: String,
    #[serde(default)]
    task_result: Option<TaskResult>,
}

#[derive(Debug, Deserialize)]
struct TaskResult {
    #[serde(default)]
    videos: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    url: String,
}

/// State of a generation task as reported by one status poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    /// Not yet terminal; keep polling.
    Pending,
    /// Terminal success with the first result video URL.
    Succeeded { video_url: String },
    /// Terminal failure reported by the service.
    Failed,
}

/// Client for communicating with the Kling API.
#[derive(Debug)]
pub struct KlingClient {
    access_key: String,
    secret_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl KlingClient {
    /// Create a new KlingClient by reading the key pair from environment.
    ///
    /// Reads `KLING_ACCESS_KEY` and `KLING_SECRET_KEY` and creates an HTTP
    /// client with explicit request and connect timeouts.
    ///
    /// # Errors
    ///
    /// Returns `KlingError::MissingCredentials` if either variable is unset
    /// or empty.
    pub fn new() -> Result<Self, KlingError> {
        let access_key =
            std::env::var(KLING_ACCESS_KEY_ENV).map_err(|_| KlingError::MissingCredentials)?;
        let secret_key =
            std::env::var(KLING_SECRET_KEY_ENV).map_err(|_| KlingError::MissingCredentials)?;
        Self::with_credentials(access_key, secret_key)
    }

    /// Create a new KlingClient with an explicit key pair.
    pub fn with_credentials(access_key: String, secret_key: String) -> Result<Self, KlingError> {
        Self::with_base_url(access_key, secret_key, KLING_API_BASE_URL.to_string())
    }

    /// Create a new KlingClient with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(
        access_key: String,
        secret_key: String,
        base_url: String,
    ) -> Result<Self, KlingError> {
        if access_key.is_empty() || secret_key.is_empty() {
            return Err(KlingError::MissingCredentials);
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            access_key,
            secret_key,
            base_url,
            http_client,
        })
    }

    /// Get the access key.
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign a fresh bearer token for one request.
    fn bearer_token(&self) -> Result<String, KlingError> {
        issue_token(&self.access_key, &self.secret_key)
    }

    /// Submit an image-to-video generation task.
    ///
    /// Sends a POST with the fixed model, mode, duration, and guidance scale
    /// plus the uploaded image URL and the prompt text. Success is an HTTP
    /// 200 whose envelope carries `code == 0`; the assigned task identifier
    /// is returned for polling.
    ///
    /// # Errors
    ///
    /// Returns `KlingError::Api` for non-200 responses, non-zero envelope
    /// codes, or a missing task id, `KlingError::Http` for transport
    /// failures (including the 30s request timeout), and `KlingError::Signing`
    /// if token issuance fails. The caller treats any error as a failed task;
    /// nothing is retried at this layer.
    pub async fn submit(&self, image_url: &str, prompt: &str) -> Result<String, KlingError> {
        let token = self.bearer_token()?;
        let url = format!("{}/v1/videos/image2video", self.base_url);

        let request_body = SubmitRequest {
            model_name: MODEL_NAME,
            mode: GENERATION_MODE,
            duration: GENERATION_DURATION,
            image: image_url,
            prompt,
            cfg_scale: CFG_SCALE,
        };

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(KlingError::Api(format!(
                "Submission failed with status {}: {}",
                status, error_text
            )));
        }

        let envelope: ApiEnvelope<SubmitData> = response.json().await?;
        if envelope.code != 0 {
            return Err(KlingError::Api(format!(
                "Submission rejected with code {}: {}",
                envelope.code,
                envelope.message.unwrap_or_else(|| "no message".to_string())
            )));
        }

        match envelope.data {
            Some(data) => Ok(data.task_id),
            None => Err(KlingError::Api(
                "Submission accepted but no task id in response".to_string(),
            )),
        }
    }

    /// Query the current state of a generation task.
    ///
    /// Issues one GET against the per-task status endpoint with a fresh
    /// bearer token. The reported `task_status` maps to:
    /// - `"succeed"` with at least one result video -> `TaskState::Succeeded`
    /// - `"succeed"` with an empty result list -> `TaskState::Pending`
    /// - `"failed"` -> `TaskState::Failed`
    /// - anything else -> `TaskState::Pending`
    ///
    /// # Errors
    ///
    /// Returns `KlingError::Api` for non-200 responses or non-zero envelope
    /// codes, `KlingError::Http` for transport failures. The poll loop in
    /// [`wait_for_completion_with`](Self::wait_for_completion_with) treats
    /// any error as still-pending.
    pub async fn query_task(&self, task_id: &str) -> Result<TaskState, KlingError> {
        let token = self.bearer_token()?;
        let url = format!("{}/v1/videos/image2video/{}", self.base_url, task_id);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(KlingError::Api(format!(
                "Status check failed with status {}: {}",
                status, error_text
            )));
        }

        let envelope: ApiEnvelope<TaskData> = response.json().await?;
        if envelope.code != 0 {
            return Err(KlingError::Api(format!(
                "Status check rejected with code {}: {}",
                envelope.code,
                envelope.message.unwrap_or_else(|| "no message".to_string())
            )));
        }

        let data = match envelope.data {
            Some(data) => data,
            None => return Ok(TaskState::Pending),
        };

        match data.task_status.as_str() {
            "succeed" => {
                let video_url = data
                    .task_result
                    .and_then(|r| r.videos.into_iter().next())
                    .map(|v| v.url);
                match video_url {
                    Some(url) => Ok(TaskState::Succeeded { video_url: url }),
                    // Reported done but no video yet; keep polling.
                    None => Ok(TaskState::Pending),
                }
            }
            "failed" => Ok(TaskState::Failed),
            _ => Ok(TaskState::Pending),
        }
    }

    /// Poll a task until terminal state with the default budget (60 x 5s).
    pub async fn wait_for_completion(&self, task_id: &str) -> Option<String> {
        self.wait_for_completion_with(task_id, DEFAULT_POLL_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL)
            .await
    }

    /// Poll a task until terminal state with a custom attempt budget.
    ///
    /// Each attempt issues one status query. `Succeeded` returns the video
    /// URL immediately; `Failed` stops immediately with `None`. A query error
    /// is treated as still-pending: it consumes one attempt and the loop
    /// sleeps and retries, the same as a pending status. Exhausting the
    /// budget returns `None`, indistinguishable from an explicit failure at
    /// the call site.
    pub async fn wait_for_completion_with(
        &self,
        task_id: &str,
        max_attempts: u32,
        interval: Duration,
    ) -> Option<String> {
        for attempt in 0..max_attempts {
            match self.query_task(task_id).await {
                Ok(TaskState::Succeeded { video_url }) => {
                    log::info!("Task {} succeeded after {} polls", task_id, attempt + 1);
                    return Some(video_url);
                }
                Ok(TaskState::Failed) => {
                    log::warn!("Task {} reported failed", task_id);
                    return None;
                }
                Ok(TaskState::Pending) => {
                    log::debug!(
                        "Task {} pending (attempt {}/{})",
                        task_id,
                        attempt + 1,
                        max_attempts
                    );
                }
                // Transient or persistent, an errored poll consumes one
                // attempt and the loop keeps going.
                Err(e) => {
                    log::warn!(
                        "Poll attempt {}/{} for task {} errored: {}",
                        attempt + 1,
                        max_attempts,
                        task_id,
                        e
                    );
                }
            }

            if attempt + 1 < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        log::warn!(
            "Task {} did not reach a terminal state within {} polls",
            task_id,
            max_attempts
        );
        None
    }

    /// Download a completed video from a URL to disk.
    ///
    /// Streams the response body to disk in chunks without loading the full
    /// video into memory, tracking bytes transferred. A failed download may
    /// leave a truncated file at `dest`; no cleanup is attempted.
    ///
    /// # Errors
    ///
    /// Returns `KlingError::Api` for non-200 responses, `KlingError::Http`
    /// for transport failures, and `KlingError::Io` if writing to disk fails.
    pub async fn download_video(&self, url: &str, dest: &Path) -> Result<PathBuf, KlingError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(KlingError::Api(format!(
                "Video download failed with status {}: {}",
                status, error_text
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        use futures_util::StreamExt;
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            file.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
        }

        file.flush().await?;
        log::info!("Downloaded {} bytes to {}", bytes_written, dest.display());

        Ok(dest.to_path_buf())
    }
}

/// Errors that can occur during Kling API operations.
#[derive(Debug, thiserror::Error)]
pub enum KlingError {
    #[error("Kling API credentials not configured")]
    MissingCredentials,

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
