//! Colour-threshold classification: RGB image in, binary mask out.
//!
//! Each pixel is tested against a fixed predicate for the target colour.
//! Channel values are compared on the 0-255 scale, so sources that store
//! normalized `[0, 1]` channels are scaled up before the comparison.
//!
//! This is the first step in the pipeline.

use image::Rgb32FImage;
use serde::{Deserialize, Serialize};

use crate::types::{BinaryMask, Dimensions, PipelineError, RgbImage, to_u32};

/// Target colour for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Colour {
    /// `R > upper`, `G < lower`, `B < lower`.
    #[default]
    Red,
    /// `R < lower`, `G > upper`, `B > upper`.
    Cyan,
}

impl Colour {
    /// Lowercase name, used in output file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Cyan => "cyan",
        }
    }

    /// Whether a pixel (channels on the 0-255 scale) is this colour.
    #[must_use]
    pub fn matches(self, [r, g, b]: [f32; 3], upper: u8, lower: u8) -> bool {
        let upper = f32::from(upper);
        let lower = f32::from(lower);
        match self {
            Self::Red => r > upper && g < lower && b < lower,
            Self::Cyan => r < lower && g > upper && b > upper,
        }
    }
}

/// Numeric range of the channel values stored in a [`PixelGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelRange {
    /// Channels are already on the 0-255 scale.
    #[default]
    Byte,
    /// Channels are normalized to `[0, 1]`.
    Unit,
}

impl ChannelRange {
    const fn scale(self) -> f32 {
        match self {
            Self::Byte => 1.0,
            Self::Unit => 255.0,
        }
    }
}

/// A source of RGB pixels for the classifier.
///
/// Implemented for `image::RgbImage` (0-255), `image::Rgb32FImage`
/// (normalized `[0, 1]`), and [`PixelGrid`] (either range).
pub trait RgbSource {
    /// Grid dimensions.
    fn dimensions(&self) -> Dimensions;

    /// Verify that the source is a rectangular three-channel grid.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidImageFormat`] if it is not.
    fn check_format(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Channel values at `(x, y)` on the 0-255 scale.
    ///
    /// Only called for in-bounds coordinates after
    /// [`check_format`](Self::check_format) succeeded.
    fn rgb(&self, x: u32, y: u32) -> [f32; 3];
}

impl RgbSource for RgbImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    fn rgb(&self, x: u32, y: u32) -> [f32; 3] {
        self.get_pixel(x, y).0.map(f32::from)
    }
}

impl RgbSource for Rgb32FImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    fn rgb(&self, x: u32, y: u32) -> [f32; 3] {
        self.get_pixel(x, y).0.map(|c| c * ChannelRange::Unit.scale())
    }
}

/// A row-major grid of per-pixel channel values.
///
/// Unlike the `image` buffers, a grid can be built from untrusted nested
/// data, so its shape is checked before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    dimensions: Dimensions,
    channels: usize,
    data: Vec<f32>,
    range: ChannelRange,
}

impl PixelGrid {
    /// Wrap flat channel data without checking its shape.
    ///
    /// The shape is verified when the grid is classified.
    #[must_use]
    pub const fn new(
        dimensions: Dimensions,
        channels: usize,
        data: Vec<f32>,
        range: ChannelRange,
    ) -> Self {
        Self {
            dimensions,
            channels,
            data,
            range,
        }
    }

    /// Build a grid from nested rows of pixels.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidImageFormat`] if the rows differ in
    /// length or any pixel does not have exactly three channels.
    pub fn from_rows(rows: &[Vec<Vec<f32>>], range: ChannelRange) -> Result<Self, PipelineError> {
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(width * rows.len() * 3);

        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(PipelineError::InvalidImageFormat(format!(
                    "row {y} has {} pixels, expected {width}",
                    row.len(),
                )));
            }
            for (x, pixel) in row.iter().enumerate() {
                if pixel.len() != 3 {
                    return Err(PipelineError::InvalidImageFormat(format!(
                        "pixel ({x}, {y}) has {} channels, expected 3",
                        pixel.len(),
                    )));
                }
                data.extend_from_slice(pixel);
            }
        }

        let dimensions = Dimensions::new(to_u32(width)?, to_u32(rows.len())?);
        Ok(Self::new(dimensions, 3, data, range))
    }

    /// Channel range of the stored values.
    #[must_use]
    pub const fn range(&self) -> ChannelRange {
        self.range
    }
}

impl RgbSource for PixelGrid {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn check_format(&self) -> Result<(), PipelineError> {
        if self.channels != 3 {
            return Err(PipelineError::InvalidImageFormat(format!(
                "expected 3 channels per pixel, got {}",
                self.channels,
            )));
        }
        let Dimensions { width, height } = self.dimensions;
        let expected = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .and_then(|cells| cells.checked_mul(self.channels))
            .ok_or_else(|| {
                PipelineError::InvalidImageFormat(format!(
                    "{width}x{height} grid is too large to address"
                ))
            })?;
        if self.data.len() != expected {
            return Err(PipelineError::InvalidImageFormat(format!(
                "{}x{} grid needs {expected} channel values, got {}",
                self.dimensions.width,
                self.dimensions.height,
                self.data.len(),
            )));
        }
        Ok(())
    }

    fn rgb(&self, x: u32, y: u32) -> [f32; 3] {
        let start = self.dimensions.index(x, y) * 3;
        let scale = self.range.scale();
        [
            self.data[start] * scale,
            self.data[start + 1] * scale,
            self.data[start + 2] * scale,
        ]
    }
}

/// Classify every pixel of `image` as `colour` or not.
///
/// A zero-size image yields an empty mask.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImageFormat`] if the source is not a
/// rectangular three-channel grid. No partial mask is returned.
pub fn classify<I: RgbSource + ?Sized>(
    image: &I,
    colour: Colour,
    upper_threshold: u8,
    lower_threshold: u8,
) -> Result<BinaryMask, PipelineError> {
    image.check_format()?;
    let dimensions = image.dimensions();
    let mask = BinaryMask::from_fn(dimensions, |x, y| {
        colour.matches(image.rgb(x, y), upper_threshold, lower_threshold)
    });
    log::debug!(
        "classified {}x{} image as {}: {} foreground pixels",
        dimensions.width,
        dimensions.height,
        colour.name(),
        mask.foreground_count(),
    );
    Ok(mask)
}
