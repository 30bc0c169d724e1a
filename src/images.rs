//! Input image discovery and classification.
//!
//! Scans a local directory for portrait images and classifies each by
//! filename. Classification is a pure function: the same filename always
//! yields the same category.

use std::path::{Path, PathBuf};

/// File extensions accepted as input images (matched case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Filename substring that selects the crying category (case-insensitive).
const CRYING_MARKER: &str = "crying";

/// Category of an input image, determined by its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCategory {
    /// Gets every variant except crying.
    Standard,
    /// Filename contains "crying"; gets exactly the crying variant.
    Crying,
}

/// An input image discovered in the scan directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    /// Full path to the image file.
    pub path: PathBuf,
    /// Filename without extension, used to name output videos.
    pub basename: String,
    /// Category derived from the filename.
    pub category: ImageCategory,
}

/// Errors that can occur during image discovery.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("input directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("no image files found in {0}")]
    NoImages(PathBuf),

    #[error("failed to read input directory: {0}")]
    IoError(#[from] std::io::Error),
}

/// Classify a filename into an image category.
///
/// Pure function: case-insensitive substring match on "crying".
pub fn classify(file_name: &str) -> ImageCategory {
    if file_name.to_lowercase().contains(CRYING_MARKER) {
        ImageCategory::Crying
    } else {
        ImageCategory::Standard
    }
}

/// Check whether a path has one of the accepted image extensions.
fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Enumerate all input images in a directory.
///
/// Matches files with an accepted image extension (case-insensitive) and
/// classifies each by filename. Results are sorted by path so runs are
/// deterministic regardless of directory iteration order.
///
/// # Errors
///
/// Returns `ImageError::DirectoryNotFound` if the directory does not exist,
/// or `ImageError::NoImages` if no image files are found. Both are fatal to
/// the run.
pub fn find_input_images(dir: &Path) -> Result<Vec<InputImage>, ImageError> {
    if !dir.is_dir() {
        return Err(ImageError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !has_image_extension(&path) {
            continue;
        }

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue, // non-UTF-8 filename, skip
        };
        let basename = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&file_name)
            .to_string();

        images.push(InputImage {
            category: classify(&file_name),
            path,
            basename,
        });
    }

    if images.is_empty() {
        return Err(ImageError::NoImages(dir.to_path_buf()));
    }

    images.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(images)
}
