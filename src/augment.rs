//! Offline augmentation pass over a curated split
//!
//! Stateless per-file transforms: each source image yields one sibling file
//! per active augmentation, named `<stem>_<aug>.jpg`. The pass walks a split
//! directory tree and never touches the partition bookkeeping.

use crate::error::Result;
use crate::services::io::ImageStore;
use image::imageops::FilterType;
use image::DynamicImage;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Random center crop keeps between 75% and 90% of each dimension
const CROP_RATIO_MIN: f64 = 0.75;
const CROP_RATIO_MAX: f64 = 0.9;

/// One augmentation applied to a source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    /// Rotate 90 degrees clockwise
    Rotate90Cw,
    /// Rotate 90 degrees counter-clockwise
    Rotate90Ccw,
    /// Rotate 180 degrees
    Rotate180,
    /// Crop a random centered window, then resize back to the input size
    RandomCenterCrop,
}

impl Augmentation {
    /// The augmentations applied by [`augment_split`]
    pub const ACTIVE: [Augmentation; 4] = [
        Augmentation::Rotate90Cw,
        Augmentation::Rotate90Ccw,
        Augmentation::Rotate180,
        Augmentation::RandomCenterCrop,
    ];

    /// Filename suffix identifying this augmentation
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Rotate90Cw => "rotate90CW",
            Self::Rotate90Ccw => "rotate90CCW",
            Self::Rotate180 => "rotate180",
            Self::RandomCenterCrop => "random_center_crop",
        }
    }

    /// Apply this augmentation, producing a new image
    #[must_use]
    pub fn apply(&self, image: &DynamicImage, rng: &mut StdRng) -> DynamicImage {
        match self {
            Self::Rotate90Cw => image.rotate90(),
            Self::Rotate90Ccw => image.rotate270(),
            Self::Rotate180 => image.rotate180(),
            Self::RandomCenterCrop => random_center_crop(image, rng),
        }
    }
}

/// Crop a centered window of a random ratio and resize back to the input
/// dimensions, so augmented files stay shape-compatible with their source.
fn random_center_crop(image: &DynamicImage, rng: &mut StdRng) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let ratio = rng.gen_range(CROP_RATIO_MIN..CROP_RATIO_MAX);

    let new_width = ((f64::from(width) * ratio) as u32).max(1);
    let new_height = ((f64::from(height) * ratio) as u32).max(1);
    let left = (width - new_width) / 2;
    let top = (height - new_height) / 2;

    image
        .crop_imm(left, top, new_width, new_height)
        .resize_exact(width, height, FilterType::Lanczos3)
}

/// Augmented sibling path for a source file: `<stem>_<aug>.jpg`
fn augmented_path(source: &Path, augmentation: Augmentation) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{}_{}.jpg", stem, augmentation.suffix()))
}

/// Apply every active augmentation to every `.jpg` under `split_dir`.
///
/// The file list is collected before any output is written, so the pass
/// never re-augments its own products within a run. Unreadable files are
/// skipped with a warning. Returns the number of files written.
pub fn augment_split(split_dir: &Path, seed: u64) -> Result<usize> {
    let mut rng = StdRng::seed_from_u64(seed);

    let sources: Vec<PathBuf> = WalkDir::new(split_dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("jpg"))
                .unwrap_or(false)
        })
        .collect();

    let mut written = 0;
    for source in &sources {
        let image = match image::open(source) {
            Ok(image) => image,
            Err(e) => {
                warn!("skipping unreadable image {}: {}", source.display(), e);
                continue;
            },
        };

        for augmentation in Augmentation::ACTIVE {
            let augmented = augmentation.apply(&image, &mut rng);
            ImageStore::save_jpeg(&augmented, augmented_path(source, augmentation))?;
            written += 1;
        }
    }

    info!(
        "Augmented {} images under {} ({} files written)",
        sources.len(),
        split_dir.display(),
        written
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn test_image(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                img.put_pixel(x, y, Rgb([x as u8, y as u8, 0]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_rotations_swap_or_keep_dimensions() {
        let img = test_image(8, 4);
        let mut rng = StdRng::seed_from_u64(0);

        let cw = Augmentation::Rotate90Cw.apply(&img, &mut rng);
        assert_eq!((cw.width(), cw.height()), (4, 8));

        let ccw = Augmentation::Rotate90Ccw.apply(&img, &mut rng);
        assert_eq!((ccw.width(), ccw.height()), (4, 8));

        let half = Augmentation::Rotate180.apply(&img, &mut rng);
        assert_eq!((half.width(), half.height()), (8, 4));
    }

    #[test]
    fn test_rotate180_moves_origin_to_far_corner() {
        let img = test_image(8, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let rotated = Augmentation::Rotate180.apply(&img, &mut rng);

        let corner = rotated.to_rgb8();
        assert_eq!(corner.get_pixel(7, 3), &Rgb([0, 0, 0]));
        assert_eq!(corner.get_pixel(0, 0), &Rgb([7, 3, 0]));
    }

    #[test]
    fn test_random_center_crop_preserves_dimensions() {
        let img = test_image(40, 30);
        let mut rng = StdRng::seed_from_u64(42);
        let cropped = Augmentation::RandomCenterCrop.apply(&img, &mut rng);
        assert_eq!((cropped.width(), cropped.height()), (40, 30));
    }

    #[test]
    fn test_random_center_crop_tiny_image() {
        let img = test_image(1, 1);
        let mut rng = StdRng::seed_from_u64(42);
        let cropped = Augmentation::RandomCenterCrop.apply(&img, &mut rng);
        assert_eq!((cropped.width(), cropped.height()), (1, 1));
    }

    #[test]
    fn test_augmented_path_naming() {
        let path = augmented_path(
            Path::new("train/random/RANDOM_000003.jpg"),
            Augmentation::Rotate90Cw,
        );
        assert_eq!(
            path,
            Path::new("train/random/RANDOM_000003_rotate90CW.jpg")
        );
    }

    #[test]
    fn test_augment_split_writes_one_file_per_augmentation() {
        let tmp = TempDir::new().unwrap();
        let class_dir = tmp.path().join("random");
        std::fs::create_dir_all(&class_dir).unwrap();

        for name in ["a.jpg", "b.jpg"] {
            ImageStore::save_jpeg(&test_image(16, 12), class_dir.join(name)).unwrap();
        }
        // Non-jpg files are ignored
        std::fs::write(class_dir.join("notes.txt"), "ignored").unwrap();

        let written = augment_split(tmp.path(), 42).unwrap();
        assert_eq!(written, 2 * Augmentation::ACTIVE.len());

        for aug in Augmentation::ACTIVE {
            assert!(class_dir
                .join(format!("a_{}.jpg", aug.suffix()))
                .is_file());
        }
    }

    #[test]
    fn test_augment_split_deterministic_per_seed() {
        let tmp_a = TempDir::new().unwrap();
        let tmp_b = TempDir::new().unwrap();

        for tmp in [&tmp_a, &tmp_b] {
            ImageStore::save_jpeg(&test_image(20, 20), tmp.path().join("x.jpg")).unwrap();
            augment_split(tmp.path(), 7).unwrap();
        }

        let crop_a =
            std::fs::read(tmp_a.path().join("x_random_center_crop.jpg")).unwrap();
        let crop_b =
            std::fs::read(tmp_b.path().join("x_random_center_crop.jpg")).unwrap();
        assert_eq!(crop_a, crop_b);
    }
}
