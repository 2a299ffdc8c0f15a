//! Face-patch scraper
//!
//! Fixed-loop fetch-and-crop against a single image-generator URL: save the
//! full frame, cut two statically positioned square patches, pause, repeat.
//! No retry and no partitioning; a failed fetch just skips one iteration.

use crate::error::{CurationError, Result};
use crate::services::io::ImageStore;
use image::DynamicImage;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Patch labels and their center coordinates on the generator's canonical
/// 1024x1024 frame
pub const PATCH_CENTERS: [(&str, (u32, u32)); 2] =
    [("left_cheek", (360, 625)), ("right_cheek", (668, 625))];

/// Configuration for a face-patch scrape
#[derive(Debug, Clone)]
pub struct FaceScrapeConfig {
    /// Generator endpoint returning a fresh face per request
    pub source_url: String,
    /// Directory receiving full frames and patches
    pub output_dir: PathBuf,
    /// Number of frames to fetch
    pub count: u32,
    /// Side length of each square patch
    pub patch_size: u32,
    /// Per-request timeout
    pub fetch_timeout: Duration,
    /// Pause between consecutive fetches
    pub pause: Duration,
}

impl Default for FaceScrapeConfig {
    fn default() -> Self {
        Self {
            source_url: "https://thispersondoesnotexist.com/".to_string(),
            output_dir: PathBuf::from("ISIC-images-split/clear_skin"),
            count: 10,
            patch_size: 200,
            fetch_timeout: Duration::from_secs(10),
            pause: Duration::from_millis(200),
        }
    }
}

/// Top-left corner of a square patch centered at `center`
///
/// Saturates at the frame origin so undersized frames yield a clamped patch
/// instead of an arithmetic panic.
fn patch_origin(center: (u32, u32), size: u32) -> (u32, u32) {
    (
        center.0.saturating_sub(size / 2),
        center.1.saturating_sub(size / 2),
    )
}

/// Fetch `count` frames and persist each with its cheek patches.
///
/// Returns the number of frames actually saved. Fetch and decode failures
/// are logged and skipped; frame numbers follow the 1-based attempt index,
/// so a skipped attempt leaves a gap in the numbering.
pub async fn scrape_face_patches(config: &FaceScrapeConfig) -> Result<u32> {
    let client = Client::builder()
        .timeout(config.fetch_timeout)
        .build()
        .map_err(|e| {
            CurationError::source_unavailable(format!("failed to create HTTP client: {}", e))
        })?;

    let mut saved = 0;
    for i in 1..=config.count {
        match fetch_frame(&client, &config.source_url).await {
            Ok(frame) => {
                save_frame_with_patches(config, &frame, i)?;
                saved += 1;
                info!("Processed image {}/{}", i, config.count);
            },
            Err(reason) => {
                warn!("failed to fetch image {}: {}", i, reason);
            },
        }

        tokio::time::sleep(config.pause).await;
    }

    info!("Saved {} of {} face frames", saved, config.count);
    Ok(saved)
}

async fn fetch_frame(client: &Client, url: &str) -> std::result::Result<DynamicImage, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("status code: {}", response.status()));
    }

    let body = response.bytes().await.map_err(|e| e.to_string())?;
    let image = image::load_from_memory(&body).map_err(|e| e.to_string())?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

fn save_frame_with_patches(
    config: &FaceScrapeConfig,
    frame: &DynamicImage,
    index: u32,
) -> Result<()> {
    let full_path = config.output_dir.join(format!("full_face_{:04}.png", index));
    ImageStore::save_png(frame, full_path)?;

    for (label, center) in PATCH_CENTERS {
        let (x, y) = patch_origin(center, config.patch_size);
        let patch = frame.crop_imm(x, y, config.patch_size, config.patch_size);
        let patch_path = config.output_dir.join(format!("{}_{:04}.png", label, index));
        ImageStore::save_png(&patch, patch_path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_patch_origin_centered() {
        assert_eq!(patch_origin((360, 625), 200), (260, 525));
        assert_eq!(patch_origin((668, 625), 200), (568, 525));
    }

    #[test]
    fn test_patch_origin_saturates_near_edge() {
        assert_eq!(patch_origin((50, 10), 200), (0, 0));
    }

    #[test]
    fn test_default_config() {
        let config = FaceScrapeConfig::default();
        assert_eq!(config.count, 10);
        assert_eq!(config.patch_size, 200);
        assert_eq!(config.pause, Duration::from_millis(200));
        assert!(config.source_url.starts_with("https://"));
    }

    #[test]
    fn test_save_frame_with_patches_layout() {
        let tmp = TempDir::new().unwrap();
        let config = FaceScrapeConfig {
            output_dir: tmp.path().to_path_buf(),
            patch_size: 8,
            ..FaceScrapeConfig::default()
        };

        let frame = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            1024,
            1024,
            image::Rgb([5, 5, 5]),
        ));
        save_frame_with_patches(&config, &frame, 3).unwrap();

        assert!(tmp.path().join("full_face_0003.png").is_file());
        for (label, _) in PATCH_CENTERS {
            let patch = image::open(tmp.path().join(format!("{}_0003.png", label))).unwrap();
            assert_eq!((patch.width(), patch.height()), (8, 8));
        }
    }
}
