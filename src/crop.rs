//! FFmpeg-based aspect-ratio post-processing.
//!
//! Generated videos arrive in 16:9; short-form platforms want 9:16. The crop
//! runs a centered FFmpeg crop filter into a sibling temp file and renames it
//! over the original only on tool success, so a failed crop can never leave
//! a half-written video behind: either the file is fully replaced by the
//! cropped version or it remains exactly as before.

use std::path::{Path, PathBuf};

use tokio::process::Command;

/// Default external video tool.
pub const DEFAULT_FFMPEG_PROGRAM: &str = "ffmpeg";

/// Centered crop from 16:9 down to 9:16: width = height * 9/16, full height.
const CROP_FILTER: &str = "crop=ih*9/16:ih";

/// Suffix for the temporary sibling output file.
const TEMP_SUFFIX: &str = "_temp_cropped.mp4";

/// Errors that can occur during the crop step.
#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("video tool not available")]
    ToolUnavailable,

    #[error("video tool exited with status {status}: {stderr}")]
    ToolFailed { status: i32, stderr: String },

    #[error("failed to run video tool: {0}")]
    Spawn(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wrapper around the external FFmpeg binary.
pub struct Cropper {
    program: String,
}

impl Cropper {
    /// Create a Cropper using the `ffmpeg` binary from PATH.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_FFMPEG_PROGRAM)
    }

    /// Create a Cropper with a custom program name or path.
    ///
    /// Lets tests substitute a stub executable for FFmpeg.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Get the program this cropper invokes.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check whether the external tool can be invoked.
    ///
    /// Runs `{program} -version` once; callers check this before attempting
    /// any crops and skip the whole crop phase when it fails.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    /// Path of the temporary sibling file for a given input.
    fn temp_output_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video");
        input.with_file_name(format!("{}{}", stem, TEMP_SUFFIX))
    }

    /// Crop a video in place from 16:9 to 9:16.
    ///
    /// Re-encodes video through the centered crop filter, copies the audio
    /// stream unchanged, and writes to a temporary sibling file. On exit
    /// code 0 the temp file is renamed over the original (same-directory
    /// rename, atomic). On any failure the temp file is deleted and the
    /// original is left untouched.
    pub async fn crop_to_portrait(&self, input: &Path) -> Result<(), CropError> {
        let temp_output = Self::temp_output_path(input);

        let result = Command::new(&self.program)
            .arg("-i")
            .arg(input)
            .arg("-vf")
            .arg(CROP_FILTER)
            .arg("-c:a")
            .arg("copy")
            .arg("-y")
            .arg(&temp_output)
            .output()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                // Spawn failed; nothing was written, but clear any leftover
                // temp from a previous interrupted run.
                let _ = tokio::fs::remove_file(&temp_output).await;
                return Err(CropError::Spawn(e));
            }
        };

        if output.status.success() {
            tokio::fs::rename(&temp_output, input).await?;
            log::info!("Cropped {} to 9:16", input.display());
            Ok(())
        } else {
            let _ = tokio::fs::remove_file(&temp_output).await;
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            log::warn!("Crop failed for {}: {}", input.display(), stderr);
            Err(CropError::ToolFailed {
                status: output.status.code().unwrap_or(-1),
                stderr,
            })
        }
    }
}

impl Default for Cropper {
    fn default() -> Self {
        Self::new()
    }
}
