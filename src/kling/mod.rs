//! Kling image-to-video API integration.
//!
//! Covers the full remote lifecycle for one generation task: signing a
//! short-lived bearer token, submitting an (image URL, prompt) pair, polling
//! the task to a terminal state, and downloading the finished video.

mod auth;
mod client;

pub use auth::{issue_token, TOKEN_NOT_BEFORE_SKEW_SECS, TOKEN_TTL_SECS};
pub use client::{
    KlingClient, KlingError, TaskState, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_ATTEMPTS,
    KLING_ACCESS_KEY_ENV, KLING_API_BASE_URL, KLING_SECRET_KEY_ENV, MODEL_NAME,
};
