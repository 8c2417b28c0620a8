//! envmon-pipeline: Pure colour-region detection pipeline (sans-IO).
//!
//! Finds regions of a target colour in a raster map through:
//! classify -> label -> rank -> select -> visualize.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and returns structured data. Decoding files and writing
//! reports lives in `envmon-export` and the `envmon` binary.

pub mod classify;
pub mod diagnostics;
pub mod label;
pub mod pipeline;
pub mod rank;
pub mod types;
pub mod visualize;

pub use classify::{ChannelRange, Colour, PixelGrid, RgbSource, classify};
pub use label::{Connectivity, Labelling, label_components};
pub use pipeline::Pipeline;
pub use rank::{RankedComponents, labels_of, rank_components, select_top_k};
pub use types::{
    BinaryMask, ComponentRecord, DetectionResult, Dimensions, GrayImage, LabelGrid,
    PipelineConfig, PipelineError, RgbImage,
};
pub use visualize::visualize_selection;

/// Run the full detection pipeline.
///
/// Takes an RGB source and a configuration, then produces a
/// [`DetectionResult`] carrying every intermediate: the classification
/// mask, the label grid and discovery-order records, the ranked records,
/// the top-K selection, and the highlight mask.
///
/// # Pipeline steps
///
/// 1. Colour classification into a binary mask
/// 2. Connected-component labelling (BFS)
/// 3. Stable ranking by pixel count
/// 4. Top-K selection
/// 5. Highlight mask of the selected components
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImageFormat`] if the source is not a
/// rectangular three-channel grid.
pub fn detect<I: RgbSource + ?Sized>(
    image: &I,
    config: &PipelineConfig,
) -> Result<DetectionResult, PipelineError> {
    Ok(Pipeline::new(config.clone())
        .classify(image)?
        .label()
        .rank()
        .select()
        .visualize()
        .into_result())
}
