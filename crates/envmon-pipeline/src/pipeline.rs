//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::detect`] which runs the entire pipeline in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use envmon_pipeline::{Pipeline, PipelineConfig, PipelineError, RgbImage};
//! # fn run(image: &RgbImage) -> Result<(), PipelineError> {
//! let labelled = Pipeline::new(PipelineConfig::default())
//!     .classify(image)?
//!     .label();
//! println!("{} components", labelled.labelling().component_count());
//!
//! let result = labelled.rank().select().visualize().into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying all previously computed intermediates. Only classification is
//! fallible; once a mask exists every later stage succeeds.

use crate::classify::RgbSource;
use crate::diagnostics::StageMetrics;
use crate::label::Labelling;
use crate::rank::RankedComponents;
use crate::types::{BinaryMask, ComponentRecord, DetectionResult, Dimensions, PipelineConfig, PipelineError};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`classify`](Self::classify) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .classify() to continue"]
pub struct Pending {
    config: PipelineConfig,
}

impl Pending {
    /// The pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify `image` and advance to the [`Classified`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidImageFormat`] if the image is not
    /// a rectangular three-channel grid.
    pub fn classify<I: RgbSource + ?Sized>(self, image: &I) -> Result<Classified, PipelineError> {
        let mask = crate::classify::classify(
            image,
            self.config.colour,
            self.config.upper_threshold,
            self.config.lower_threshold,
        )?;
        Ok(Classified {
            dimensions: mask.dimensions(),
            config: self.config,
            mask,
        })
    }
}

// ───────────────────────── Stage 1: Classified ───────────────────────

/// Pipeline state after colour classification.
///
/// Call [`label`](Self::label) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .label() to continue"]
pub struct Classified {
    config: PipelineConfig,
    mask: BinaryMask,
    dimensions: Dimensions,
}

impl Classified {
    /// The classification mask.
    #[must_use]
    pub const fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// Metrics describing the classification.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Classify {
            colour: self.config.colour,
            upper_threshold: self.config.upper_threshold,
            lower_threshold: self.config.lower_threshold,
            foreground_count: self.mask.foreground_count(),
            total_pixel_count: self.dimensions.cell_count() as u64,
        }
    }

    /// Advance to the labelling stage.
    pub fn label(self) -> Labelled {
        let labelling = crate::label::label_components(&self.mask, self.config.connectivity);
        Labelled {
            config: self.config,
            mask: self.mask,
            labelling,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 2: Labelled ─────────────────────────

/// Pipeline state after connected-component labelling.
///
/// Call [`rank`](Self::rank) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .rank() to continue"]
pub struct Labelled {
    config: PipelineConfig,
    mask: BinaryMask,
    labelling: Labelling,
    dimensions: Dimensions,
}

impl Labelled {
    /// The label grid and discovery-order records.
    #[must_use]
    pub const fn labelling(&self) -> &Labelling {
        &self.labelling
    }

    /// Metrics describing the labelling.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        let counts = self.labelling.records.iter().map(|r| r.pixel_count);
        let component_count = self.labelling.component_count();
        #[allow(clippy::cast_precision_loss)]
        let mean_component_pixels = if component_count == 0 {
            0.0
        } else {
            self.labelling.total_pixels() as f64 / component_count as f64
        };
        StageMetrics::Label {
            connectivity: self.config.connectivity,
            component_count,
            largest_component: counts.clone().max().unwrap_or(0),
            smallest_component: counts.min().unwrap_or(0),
            mean_component_pixels,
        }
    }

    /// Advance to the ranking stage.
    pub fn rank(self) -> Ranked {
        let ranked = crate::rank::rank_components(&self.labelling.records);
        Ranked {
            config: self.config,
            mask: self.mask,
            labelling: self.labelling,
            ranked,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 3: Ranked ───────────────────────────

/// Pipeline state after ranking components by size.
///
/// Call [`select`](Self::select) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .select() to continue"]
pub struct Ranked {
    config: PipelineConfig,
    mask: BinaryMask,
    labelling: Labelling,
    ranked: RankedComponents,
    dimensions: Dimensions,
}

impl Ranked {
    /// Records sorted largest first.
    #[must_use]
    pub const fn ranked(&self) -> &RankedComponents {
        &self.ranked
    }

    /// Metrics describing the ranking.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Rank {
            component_count: self.ranked.len(),
            largest: self.ranked.first().copied(),
        }
    }

    /// Advance to the selection stage, keeping the `config.top_k`
    /// largest components.
    pub fn select(self) -> Selected {
        let selected = crate::rank::select_top_k(&self.ranked, self.config.top_k);
        Selected {
            config: self.config,
            mask: self.mask,
            labelling: self.labelling,
            ranked: self.ranked,
            selected,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 4: Selected ─────────────────────────

/// Pipeline state after top-K selection.
///
/// Call [`visualize`](Self::visualize) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing; call .visualize() to continue"]
pub struct Selected {
    config: PipelineConfig,
    mask: BinaryMask,
    labelling: Labelling,
    ranked: RankedComponents,
    selected: Vec<ComponentRecord>,
    dimensions: Dimensions,
}

impl Selected {
    /// The selected records, largest first.
    #[must_use]
    pub fn selected(&self) -> &[ComponentRecord] {
        &self.selected
    }

    /// Metrics describing the selection.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Select {
            requested: self.config.top_k,
            selected: self.selected.len(),
        }
    }

    /// Advance to the visualization stage.
    pub fn visualize(self) -> Visualized {
        let labels = crate::rank::labels_of(&self.selected);
        let highlight = crate::visualize::visualize_selection(&self.labelling.grid, &labels);
        Visualized {
            mask: self.mask,
            labelling: self.labelling,
            ranked: self.ranked,
            selected: self.selected,
            highlight,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 5: Visualized ───────────────────────

/// Pipeline state after rendering the highlight mask. This is the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`DetectionResult`] containing all intermediates.
#[must_use = "call .into_result() to extract the DetectionResult"]
pub struct Visualized {
    mask: BinaryMask,
    labelling: Labelling,
    ranked: RankedComponents,
    selected: Vec<ComponentRecord>,
    highlight: BinaryMask,
    dimensions: Dimensions,
}

impl Visualized {
    /// The highlight mask.
    #[must_use]
    pub const fn highlight(&self) -> &BinaryMask {
        &self.highlight
    }

    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Metrics describing the highlight mask.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Visualize {
            highlighted_pixel_count: self.highlight.foreground_count(),
        }
    }

    /// Consume the pipeline and return the full [`DetectionResult`].
    #[must_use]
    pub fn into_result(self) -> DetectionResult {
        DetectionResult {
            mask: self.mask,
            labelling: self.labelling,
            ranked: self.ranked,
            selected: self.selected,
            highlight: self.highlight,
            dimensions: self.dimensions,
        }
    }
}

/// Entry point for the typed, stage-by-stage API.
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from a config. No processing is performed.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(config: PipelineConfig) -> Pending {
        Pending { config }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::{ChannelRange, Colour, PixelGrid};
    use crate::types::RgbImage;

    const RED: image::Rgb<u8> = image::Rgb([220, 20, 20]);
    const WHITE: image::Rgb<u8> = image::Rgb([255, 255, 255]);

    /// 8x4 image with three red blobs of 6, 4 and 2 pixels.
    fn three_blobs() -> RgbImage {
        RgbImage::from_fn(8, 4, |x, y| {
            let big = x < 3 && y < 2;
            let medium = (5..7).contains(&x) && (1..3).contains(&y);
            let small = x < 2 && y == 3;
            if big || medium || small { RED } else { WHITE }
        })
    }

    #[test]
    fn pending_exposes_config() {
        let pending = Pipeline::new(PipelineConfig::default());
        assert_eq!(pending.config(), &PipelineConfig::default());
    }

    #[test]
    fn classify_invalid_grid_returns_error() {
        let grid = PixelGrid::new(Dimensions::new(2, 1), 2, vec![0.0; 4], ChannelRange::Byte);
        let result = Pipeline::new(PipelineConfig::default()).classify(&grid);
        assert!(matches!(result, Err(PipelineError::InvalidImageFormat(_))));
    }

    #[test]
    fn classified_exposes_mask() {
        let classified = Pipeline::new(PipelineConfig::default())
            .classify(&three_blobs())
            .unwrap();
        assert_eq!(classified.mask().foreground_count(), 12);
    }

    #[test]
    fn labelled_exposes_discovery_order() {
        let labelled = Pipeline::new(PipelineConfig::default())
            .classify(&three_blobs())
            .unwrap()
            .label();
        let counts: Vec<u64> = labelled
            .labelling()
            .records
            .iter()
            .map(|r| r.pixel_count)
            .collect();
        assert_eq!(counts, vec![6, 4, 2]);
    }

    #[test]
    fn full_chain_highlights_two_largest() {
        let result = Pipeline::new(PipelineConfig::default())
            .classify(&three_blobs())
            .unwrap()
            .label()
            .rank()
            .select()
            .visualize()
            .into_result();
        assert_eq!(result.selected.len(), 2);
        assert_eq!(result.highlight.foreground_count(), 10);
        // The small blob is not highlighted.
        assert!(!result.highlight.get(0, 3));
        assert!(result.highlight.get(0, 0));
        assert!(result.highlight.get(6, 2));
    }

    #[test]
    fn top_k_comes_from_config() {
        let config = PipelineConfig {
            top_k: 1,
            ..PipelineConfig::default()
        };
        let selected = Pipeline::new(config)
            .classify(&three_blobs())
            .unwrap()
            .label()
            .rank()
            .select();
        assert_eq!(selected.selected(), &[ComponentRecord::new(1, 6)]);
    }

    #[test]
    fn cyan_config_on_red_image_finds_nothing() {
        let config = PipelineConfig {
            colour: Colour::Cyan,
            ..PipelineConfig::default()
        };
        let visualized = Pipeline::new(config)
            .classify(&three_blobs())
            .unwrap()
            .label()
            .rank()
            .select()
            .visualize();
        assert_eq!(visualized.highlight().foreground_count(), 0);
        assert_eq!(visualized.dimensions(), Dimensions::new(8, 4));
    }

    #[test]
    fn stage_metrics_report_counts() {
        let classified = Pipeline::new(PipelineConfig::default())
            .classify(&three_blobs())
            .unwrap();
        assert!(matches!(
            classified.metrics(),
            StageMetrics::Classify {
                foreground_count: 12,
                total_pixel_count: 32,
                ..
            }
        ));
        let labelled = classified.label();
        assert!(matches!(
            labelled.metrics(),
            StageMetrics::Label {
                component_count: 3,
                largest_component: 6,
                smallest_component: 2,
                ..
            }
        ));
    }
}
