//! Output tree layout and image persistence
//!
//! This module separates file I/O from the acquisition logic, making the
//! pipeline testable against a temporary directory.

use crate::config::CurateConfig;
use crate::error::{CurationError, Result};
use crate::partition::Partition;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// The on-disk layout of a curated dataset:
/// `<base>/<split>/<class-label>/<PREFIX>_<index:06>.jpg`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    base: PathBuf,
    class_label: String,
    file_prefix: String,
}

impl OutputLayout {
    /// Create a layout rooted at `base`
    pub fn new<P: Into<PathBuf>>(base: P, class_label: &str, file_prefix: &str) -> Self {
        Self {
            base: base.into(),
            class_label: class_label.to_string(),
            file_prefix: file_prefix.to_string(),
        }
    }

    /// Layout described by a run configuration
    #[must_use]
    pub fn from_config(config: &CurateConfig) -> Self {
        Self::new(&config.base_dir, &config.class_label, &config.file_prefix)
    }

    /// Directory holding one partition's samples
    #[must_use]
    pub fn partition_dir(&self, partition: Partition) -> PathBuf {
        self.base.join(partition.dir_name()).join(&self.class_label)
    }

    /// Path for the sample with the given global success index
    ///
    /// Indices are zero-based and zero-padded to six digits; the caller
    /// guarantees they are dense and never reused.
    #[must_use]
    pub fn sample_path(&self, partition: Partition, index: u64) -> PathBuf {
        self.partition_dir(partition)
            .join(format!("{}_{:06}.jpg", self.file_prefix, index))
    }

    /// Create the train/test/validation class directories
    pub fn create_directories(&self) -> Result<()> {
        for partition in [Partition::Train, Partition::Test, Partition::Validation] {
            let dir = self.partition_dir(partition);
            if !dir.exists() {
                std::fs::create_dir_all(&dir)
                    .map_err(|e| CurationError::file_io_error("create directory", &dir, &e))?;
                info!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }
}

/// Static image persistence helpers
pub struct ImageStore;

impl ImageStore {
    /// Save an image as JPEG, creating the parent directory if needed
    ///
    /// JPEG has no alpha channel, so the image is converted to RGB first;
    /// upstream payloads are frequently RGBA PNGs served behind `.jpg` links.
    pub fn save_jpeg<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        Self::ensure_parent(path_ref)?;

        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        rgb.save_with_format(path_ref, image::ImageFormat::Jpeg)?;
        Ok(())
    }

    /// Save an image as PNG, creating the parent directory if needed
    pub fn save_png<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        Self::ensure_parent(path_ref)?;

        image.save_with_format(path_ref, image::ImageFormat::Png)?;
        Ok(())
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CurationError::file_io_error("create output directory", parent, &e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use tempfile::TempDir;

    fn layout(base: &Path) -> OutputLayout {
        OutputLayout::new(base, "random", "RANDOM")
    }

    #[test]
    fn test_sample_path_format() {
        let layout = layout(Path::new("ISIC-images-split"));

        assert_eq!(
            layout.sample_path(Partition::Train, 0),
            Path::new("ISIC-images-split/train/random/RANDOM_000000.jpg")
        );
        assert_eq!(
            layout.sample_path(Partition::Validation, 9),
            Path::new("ISIC-images-split/validation/random/RANDOM_000009.jpg")
        );
        assert_eq!(
            layout.sample_path(Partition::Test, 1_234_567),
            Path::new("ISIC-images-split/test/random/RANDOM_1234567.jpg")
        );
    }

    #[test]
    fn test_create_directories() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(tmp.path());

        layout.create_directories().unwrap();

        for split in ["train", "test", "validation"] {
            assert!(tmp.path().join(split).join("random").is_dir());
        }

        // Idempotent on existing directories
        layout.create_directories().unwrap();
    }

    #[test]
    fn test_save_jpeg_creates_parent_and_flattens_alpha() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("train").join("random").join("x.jpg");

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            image::Rgba([10, 20, 30, 128]),
        ));
        ImageStore::save_jpeg(&rgba, &path).unwrap();

        assert!(path.is_file());
        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.width(), 4);
        assert_eq!(reloaded.height(), 4);
    }

    #[test]
    fn test_save_png_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("faces").join("full_face_0001.png");

        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            3,
            5,
            image::Rgb([1, 2, 3]),
        ));
        ImageStore::save_png(&img, &path).unwrap();

        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.width(), 3);
        assert_eq!(reloaded.height(), 5);
        assert_eq!(reloaded.to_rgb8().get_pixel(0, 0), &image::Rgb([1, 2, 3]));
    }
}
