//! Sequential run driver: upload, generate, download, crop, summarize.
//!
//! Processes images one at a time and variants within an image one at a
//! time. Every step returns an explicit result which is folded into the run
//! counters here; the clients themselves carry no progress state. A failure
//! is never fatal to the whole run: upload failures fail all of one image's
//! tasks, per-variant failures fail one task, and crop failures never demote
//! a successful generation.

use std::path::PathBuf;
use std::time::Duration;

use crate::crop::Cropper;
use crate::images::InputImage;
use crate::kling::{KlingClient, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_ATTEMPTS};
use crate::prompts::{variants_for, PromptVariant};
use crate::upload::UploadClient;

/// Step-count progress over the whole run.
///
/// The total is known before any work starts: one upload step per image plus
/// two steps (generate, download) per task. Every logical step advances the
/// counter exactly once, whether it succeeded or not, so the indicator never
/// stalls and always lands exactly on the total.
#[derive(Debug)]
pub struct Progress {
    current: usize,
    total: usize,
}

impl Progress {
    /// Create a progress counter with a known total step count.
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Advance by one step and print a progress line.
    pub fn advance(&mut self, description: &str) {
        self.current += 1;
        println!("[{}/{}] {}", self.current, self.total, description);
    }

    /// Steps completed so far.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Total steps in the run.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether every step has been accounted for.
    pub fn is_complete(&self) -> bool {
        self.current == self.total
    }
}

/// Number of progress steps one image contributes: 1 upload + 2 per task.
pub fn steps_for(image: &InputImage) -> usize {
    1 + 2 * variants_for(image.category).len()
}

/// Total progress steps for a set of images.
pub fn total_steps(images: &[InputImage]) -> usize {
    images.iter().map(steps_for).sum()
}

/// Aggregated outcome of one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks attempted: one per (image, variant) pair discovered.
    pub attempted: usize,
    /// Tasks that produced a downloaded video.
    pub succeeded: usize,
    /// Tasks that failed at upload, submit, poll, or download.
    pub failed: usize,
    /// Videos successfully cropped to 9:16.
    pub cropped: usize,
    /// Videos whose crop failed or was skipped (tool missing).
    pub crop_failed: usize,
    /// Progress steps completed.
    pub steps_completed: usize,
    /// Progress steps planned up front.
    pub steps_total: usize,
}

/// Drives the full generation pipeline for a set of input images.
pub struct Orchestrator {
    kling: KlingClient,
    upload: UploadClient,
    cropper: Cropper,
    output_dir: PathBuf,
    poll_max_attempts: u32,
    poll_interval: Duration,
}

impl Orchestrator {
    /// Create an orchestrator with the default poll budget (60 x 5s).
    pub fn new(
        kling: KlingClient,
        upload: UploadClient,
        cropper: Cropper,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            kling,
            upload,
            cropper,
            output_dir,
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll attempt budget and interval.
    pub fn with_poll_budget(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.poll_max_attempts = max_attempts;
        self.poll_interval = interval;
        self
    }

    /// Run the full pipeline over already-discovered images.
    ///
    /// Per image: upload, then one generate+download round per applicable
    /// variant. After all images, every successfully downloaded video is
    /// cropped to 9:16 (skipped wholesale when the tool is unavailable).
    /// Crop results are counted separately from generation results.
    pub async fn run_images(&self, images: &[InputImage]) -> RunSummary {
        let mut progress = Progress::new(total_steps(images));
        let mut summary = RunSummary {
            steps_total: progress.total(),
            ..RunSummary::default()
        };
        let mut successful_videos: Vec<PathBuf> = Vec::new();

        for image in images {
            let variants = variants_for(image.category);
            summary.attempted += variants.len();

            let image_url = match self.upload.upload_image(&image.path).await {
                Ok(url) => {
                    progress.advance(&format!("Uploaded {}", image.basename));
                    url
                }
                Err(e) => {
                    log::error!("Upload failed for {}: {}", image.basename, e);
                    progress.advance(&format!("Upload failed: {}", image.basename));
                    // The whole image is lost; account for its remaining
                    // steps so the indicator still reaches the total.
                    summary.failed += variants.len();
                    for variant in &variants {
                        progress.advance(&format!(
                            "Skipped {}-{} (upload failed)",
                            image.basename, variant.label
                        ));
                        progress.advance(&format!(
                            "Skipped download {}-{}",
                            image.basename, variant.label
                        ));
                    }
                    continue;
                }
            };

            for variant in &variants {
                match self
                    .generate_one(image, variant, &image_url, &mut progress)
                    .await
                {
                    Some(path) => {
                        summary.succeeded += 1;
                        successful_videos.push(path);
                    }
                    None => summary.failed += 1,
                }
            }
        }

        let (cropped, crop_failed) = self.crop_all(&successful_videos).await;
        summary.cropped = cropped;
        summary.crop_failed = crop_failed;
        summary.steps_completed = progress.current();

        summary
    }

    /// Run one (image, variant) task: submit, poll, download.
    ///
    /// Advances the progress counter exactly twice regardless of outcome:
    /// once for the generate (submit + poll) step and once for the download
    /// step. Returns the downloaded video path on success.
    async fn generate_one(
        &self,
        image: &InputImage,
        variant: &PromptVariant,
        image_url: &str,
        progress: &mut Progress,
    ) -> Option<PathBuf> {
        let video_url = match self.kling.submit(image_url, variant.text).await {
            Ok(task_id) => {
                log::info!(
                    "Submitted {}-{} as task {}",
                    image.basename,
                    variant.label,
                    task_id
                );
                self.kling
                    .wait_for_completion_with(&task_id, self.poll_max_attempts, self.poll_interval)
                    .await
            }
            Err(e) => {
                log::warn!(
                    "Submission failed for {}-{}: {}",
                    image.basename,
                    variant.label,
                    e
                );
                None
            }
        };
        progress.advance(&format!("Generated {}-{}", image.basename, variant.label));

        let video_url = match video_url {
            Some(url) => url,
            None => {
                progress.advance(&format!(
                    "Skipped download {}-{}",
                    image.basename, variant.label
                ));
                return None;
            }
        };

        let dest = self
            .output_dir
            .join(format!("{}-{}.mp4", image.basename, variant.label));

        match self.kling.download_video(&video_url, &dest).await {
            Ok(path) => {
                progress.advance(&format!("Downloaded {}-{}", image.basename, variant.label));
                Some(path)
            }
            Err(e) => {
                log::warn!(
                    "Download failed for {}-{}: {}",
                    image.basename,
                    variant.label,
                    e
                );
                progress.advance(&format!(
                    "Download failed {}-{}",
                    image.basename, variant.label
                ));
                None
            }
        }
    }

    /// Crop every successful video to 9:16, sequentially.
    ///
    /// Checks tool availability once up front; when the tool is missing
    /// every video is counted as a failed crop with no side effects.
    /// Returns (cropped, crop_failed).
    async fn crop_all(&self, videos: &[PathBuf]) -> (usize, usize) {
        if videos.is_empty() {
            return (0, 0);
        }

        if !self.cropper.is_available().await {
            println!("FFmpeg not available - videos remain in 16:9 format");
            return (0, videos.len());
        }

        println!("Cropping {} videos to 9:16 aspect ratio...", videos.len());

        let mut cropped = 0;
        let mut crop_failed = 0;
        for video in videos {
            match self.cropper.crop_to_portrait(video).await {
                Ok(()) => cropped += 1,
                Err(e) => {
                    log::warn!("Crop failed for {}: {}", video.display(), e);
                    crop_failed += 1;
                }
            }
        }

        (cropped, crop_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageCategory;

    fn image(basename: &str, category: ImageCategory) -> InputImage {
        InputImage {
            path: PathBuf::from(format!("/input/{}.png", basename)),
            basename: basename.to_string(),
            category,
        }
    }

    #[test]
    fn test_steps_for_standard_image() {
        // 1 upload + 4 variants x 2 steps
        assert_eq!(steps_for(&image("a", ImageCategory::Standard)), 9);
    }

    #[test]
    fn test_steps_for_crying_image() {
        // 1 upload + 1 variant x 2 steps
        assert_eq!(steps_for(&image("a-crying", ImageCategory::Crying)), 3);
    }

    #[test]
    fn test_total_steps_mixed_set() {
        let images = vec![
            image("a", ImageCategory::Standard),
            image("b", ImageCategory::Standard),
            image("c-crying", ImageCategory::Crying),
        ];
        assert_eq!(total_steps(&images), 9 + 9 + 3);
    }

    #[test]
    fn test_progress_advances_to_total() {
        let mut progress = Progress::new(3);
        assert!(!progress.is_complete());
        progress.advance("one");
        progress.advance("two");
        progress.advance("three");
        assert_eq!(progress.current(), 3);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_run_summary_default() {
        let summary = RunSummary::default();
        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.cropped, 0);
        assert_eq!(summary.crop_failed, 0);
    }
}
