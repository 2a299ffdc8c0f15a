//! Geometric normalization of decoded images

use image::DynamicImage;

/// Crop an image to a 1:1 aspect ratio from the center.
///
/// The output side length is `min(width, height)`; the crop window is
/// centered with integer-division coordinates, so for odd differences the
/// extra pixel row/column falls on the right/bottom. Pixel content is copied
/// without resampling.
#[must_use]
pub fn crop_to_square(image: &DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let side = width.min(height);

    let left = (width - side) / 2;
    let top = (height - side) / 2;

    image.crop_imm(left, top, side, side)
}
