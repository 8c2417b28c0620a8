//! Binary mask rasterization and PNG encoding.
//!
//! Foreground cells become white (255), background cells black (0).

use envmon_pipeline::{BinaryMask, GrayImage};
use image::ImageEncoder;

/// Errors that can occur while encoding a raster.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] image::ImageError),
}

/// Render a mask as an 8-bit grayscale image.
#[must_use]
pub fn mask_to_gray(mask: &BinaryMask) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        image::Luma([if mask.get(x, y) { 255 } else { 0 }])
    })
}

/// Encode a mask as black/white PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if the encoder rejects the image,
/// e.g. because the mask has zero width or height.
pub fn mask_to_png(mask: &BinaryMask) -> Result<Vec<u8>, ExportError> {
    let gray = mask_to_gray(mask);
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        gray.as_raw(),
        gray.width(),
        gray.height(),
        image::ExtendedColorType::L8,
    )?;
    Ok(png_bytes)
}
