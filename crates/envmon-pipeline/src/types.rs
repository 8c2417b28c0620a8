//! Shared types for the envmon detection pipeline.

use serde::{Deserialize, Serialize};

use crate::classify::Colour;
use crate::label::Connectivity;

/// Re-export `GrayImage` so downstream crates can render masks
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can hand decoded images
/// to the classifier without depending on `image` directly.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of cells (`width * height`).
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Row-major index of `(x, y)`.
    ///
    /// Callers must ensure `x < width` and `y < height`.
    #[must_use]
    pub(crate) const fn index(self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// A 2D grid of foreground/background cells.
///
/// Produced by the classifier and the visualizer, consumed by the
/// labeller. Cells are stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    dimensions: Dimensions,
    cells: Vec<bool>,
}

impl BinaryMask {
    /// An all-background mask of the given size.
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            cells: vec![false; dimensions.cell_count()],
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every cell.
    #[must_use]
    pub fn from_fn(dimensions: Dimensions, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(dimensions.cell_count());
        for y in 0..dimensions.height {
            for x in 0..dimensions.width {
                cells.push(f(x, y));
            }
        }
        Self { dimensions, cells }
    }

    /// Build a mask from rows of `0`/`1` values.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidImageFormat`] if the rows are not
    /// all the same length or a cell holds anything other than `0` or `1`.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, PipelineError> {
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        let mut cells = Vec::with_capacity(width * rows.len());

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(PipelineError::InvalidImageFormat(format!(
                    "row {y} has {} cells, expected {width}",
                    row.len(),
                )));
            }
            for (x, &value) in row.iter().enumerate() {
                match value {
                    0 => cells.push(false),
                    1 => cells.push(true),
                    other => {
                        return Err(PipelineError::InvalidImageFormat(format!(
                            "mask cell ({x}, {y}) is {other}, expected 0 or 1",
                        )));
                    }
                }
            }
        }

        let dimensions = Dimensions::new(to_u32(width)?, to_u32(rows.len())?);
        Ok(Self { dimensions, cells })
    }

    /// Build a mask from a grayscale image: any non-zero pixel is
    /// foreground.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        let dimensions = Dimensions::new(image.width(), image.height());
        Self {
            dimensions,
            cells: image.pixels().map(|p| p.0[0] != 0).collect(),
        }
    }

    /// Mask dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.dimensions.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// Returns `true` if the mask has no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `(x, y)` is foreground. Out-of-bounds cells are background.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.dimensions.width
            && y < self.dimensions.height
            && self.cells[self.dimensions.index(x, y)]
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Number of foreground cells.
    #[must_use]
    pub fn foreground_count(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }

    /// Rows of `0`/`1` values, the inverse of [`from_rows`](Self::from_rows).
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        let width = self.dimensions.width as usize;
        if width == 0 {
            return vec![Vec::new(); self.dimensions.height as usize];
        }
        self.cells
            .chunks(width)
            .map(|row| row.iter().map(|&c| u8::from(c)).collect())
            .collect()
    }
}

/// Per-cell component membership produced by the labeller.
///
/// `0` marks background; `k >= 1` marks membership in component `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    dimensions: Dimensions,
    labels: Vec<u32>,
}

impl LabelGrid {
    pub(crate) const fn from_parts(dimensions: Dimensions, labels: Vec<u32>) -> Self {
        Self { dimensions, labels }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Label at `(x, y)`, or `0` when out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        if x < self.dimensions.width && y < self.dimensions.height {
            self.labels[self.dimensions.index(x, y)]
        } else {
            0
        }
    }

    /// All labels in row-major order.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }
}

/// A labelled region and its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Component label, assigned in discovery order starting at 1.
    pub label: u32,
    /// Number of cells in the component (always at least 1).
    pub pixel_count: u64,
}

impl ComponentRecord {
    /// Create a new record.
    #[must_use]
    pub const fn new(label: u32, pixel_count: u64) -> Self {
        Self { label, pixel_count }
    }
}

/// Configuration for the detection pipeline.
///
/// Defaults follow the reference workflow: red detection with thresholds
/// 100/50, 8-connected labelling, and the two largest regions highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Which colour the classifier detects.
    pub colour: Colour,

    /// Channels that must be high exceed this value (0-255 scale).
    pub upper_threshold: u8,

    /// Channels that must be low stay below this value (0-255 scale).
    pub lower_threshold: u8,

    /// Adjacency rule used by the labeller.
    pub connectivity: Connectivity,

    /// How many of the largest components to highlight.
    pub top_k: usize,
}

impl PipelineConfig {
    /// Default target colour.
    pub const DEFAULT_COLOUR: Colour = Colour::Red;
    /// Default upper threshold.
    pub const DEFAULT_UPPER_THRESHOLD: u8 = 100;
    /// Default lower threshold.
    pub const DEFAULT_LOWER_THRESHOLD: u8 = 50;
    /// Default adjacency rule.
    pub const DEFAULT_CONNECTIVITY: Connectivity = Connectivity::Eight;
    /// Default number of highlighted components.
    pub const DEFAULT_TOP_K: usize = 2;

    /// Parse a config from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the JSON is malformed
    /// or a field is out of range (e.g. a threshold above 255).
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(json).map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            colour: Self::DEFAULT_COLOUR,
            upper_threshold: Self::DEFAULT_UPPER_THRESHOLD,
            lower_threshold: Self::DEFAULT_LOWER_THRESHOLD,
            connectivity: Self::DEFAULT_CONNECTIVITY,
            top_k: Self::DEFAULT_TOP_K,
        }
    }
}

/// Result of running the full detection pipeline with every
/// intermediate preserved.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Classifier output.
    pub mask: BinaryMask,
    /// Labeller output: label grid plus records in discovery order.
    pub labelling: crate::label::Labelling,
    /// Records sorted by size, largest first.
    pub ranked: crate::rank::RankedComponents,
    /// The first `top_k` ranked records.
    pub selected: Vec<ComponentRecord>,
    /// Mask containing only the selected components.
    pub highlight: BinaryMask,
    /// Source image dimensions.
    pub dimensions: Dimensions,
}

impl DetectionResult {
    /// Number of components found.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.labelling.records.len()
    }
}

/// Errors that can occur during pipeline processing.
///
/// Uses custom `Serialize`/`Deserialize` so errors can be forwarded as
/// JSON alongside diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input grid is not rectangular or lacks three channels per pixel.
    #[error("invalid image format: {0}")]
    InvalidImageFormat(String),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    InvalidImageFormat(String),
    InvalidConfig(String),
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::InvalidImageFormat(s) => PipelineErrorProxy::InvalidImageFormat(s.clone()),
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PipelineErrorProxy::deserialize(deserializer)? {
            PipelineErrorProxy::InvalidImageFormat(s) => Self::InvalidImageFormat(s),
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}

/// Convert a grid extent to `u32`, rejecting grids too large to address.
pub(crate) fn to_u32(extent: usize) -> Result<u32, PipelineError> {
    u32::try_from(extent).map_err(|_| {
        PipelineError::InvalidImageFormat(format!("grid extent {extent} exceeds u32::MAX"))
    })
}
