//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`detect_with_diagnostics`] runs the staged [`Pipeline`] and records
//! how long each stage took alongside the counts it produced. Timing is
//! delegated to a caller-supplied [`Clock`] so this crate stays free of
//! platform time sources.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{Colour, RgbSource};
use crate::label::Connectivity;
use crate::pipeline::Pipeline;
use crate::types::{ComponentRecord, DetectionResult, PipelineConfig, PipelineError};

/// A monotonic time source.
///
/// The binary supplies an implementation backed by
/// `std::time::Instant`; tests can supply a fake.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: colour classification.
    pub classify: StageDiagnostics,
    /// Stage 2: connected-component labelling.
    pub label: StageDiagnostics,
    /// Stage 3: ranking by size.
    pub rank: StageDiagnostics,
    /// Stage 4: top-K selection.
    pub select: StageDiagnostics,
    /// Stage 5: highlight mask.
    pub visualize: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Colour classification metrics.
    Classify {
        /// Target colour.
        colour: Colour,
        /// Upper channel threshold.
        upper_threshold: u8,
        /// Lower channel threshold.
        lower_threshold: u8,
        /// Pixels classified as foreground.
        foreground_count: u64,
        /// Total pixel count, for computing coverage.
        total_pixel_count: u64,
    },
    /// Connected-component labelling metrics.
    Label {
        /// Adjacency rule used.
        connectivity: Connectivity,
        /// Number of components found.
        component_count: usize,
        /// Pixels in the largest component (0 when there are none).
        largest_component: u64,
        /// Pixels in the smallest component (0 when there are none).
        smallest_component: u64,
        /// Mean pixels per component.
        mean_component_pixels: f64,
    },
    /// Ranking metrics.
    Rank {
        /// Number of ranked components.
        component_count: usize,
        /// The largest component, if any.
        largest: Option<ComponentRecord>,
    },
    /// Top-K selection metrics.
    Select {
        /// Requested `K`.
        requested: usize,
        /// Components actually selected (`min(K, component_count)`).
        selected: usize,
    },
    /// Highlight mask metrics.
    Visualize {
        /// Foreground pixels in the highlight mask.
        highlighted_pixel_count: u64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of components found.
    pub component_count: usize,
    /// Pixels in the highlight mask.
    pub highlighted_pixel_count: u64,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Detection Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Classify", &self.classify),
            ("Label", &self.label),
            ("Rank", &self.rank),
            ("Select", &self.select),
            ("Visualize", &self.visualize),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Components: {}  |  Highlighted pixels: {}",
            self.summary.component_count, self.summary.highlighted_pixel_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Classify {
            colour,
            upper_threshold,
            lower_threshold,
            foreground_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let coverage = if *total_pixel_count > 0 {
                *foreground_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "{} upper={upper_threshold} lower={lower_threshold} foreground={foreground_count} ({coverage:.1}%)",
                colour.name(),
            )
        }
        StageMetrics::Label {
            connectivity,
            component_count,
            largest_component,
            smallest_component,
            mean_component_pixels,
        } => format!(
            "{connectivity:?}-connected components={component_count} size min={smallest_component} max={largest_component} mean={mean_component_pixels:.1}",
        ),
        StageMetrics::Rank {
            component_count,
            largest,
        } => match largest {
            Some(record) => format!(
                "{component_count} ranked, largest=#{} ({} px)",
                record.label, record.pixel_count,
            ),
            None => format!("{component_count} ranked"),
        },
        StageMetrics::Select {
            requested,
            selected,
        } => format!("top {requested} -> {selected} selected"),
        StageMetrics::Visualize {
            highlighted_pixel_count,
        } => format!("{highlighted_pixel_count} pixels highlighted"),
    }
}

/// Run the full pipeline, timing each stage with `clock`.
///
/// Produces the same [`DetectionResult`] as [`crate::detect`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImageFormat`] if classification fails.
pub fn detect_with_diagnostics<I, C>(
    image: &I,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(DetectionResult, PipelineDiagnostics), PipelineError>
where
    I: RgbSource + ?Sized,
    C: Clock,
{
    let total_start = clock.now();

    let start = clock.now();
    let classified = Pipeline::new(config.clone()).classify(image)?;
    let classify = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: classified.metrics(),
    };

    let start = clock.now();
    let labelled = classified.label();
    let label = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: labelled.metrics(),
    };

    let start = clock.now();
    let ranked = labelled.rank();
    let rank = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: ranked.metrics(),
    };

    let start = clock.now();
    let selected = ranked.select();
    let select = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: selected.metrics(),
    };

    let start = clock.now();
    let visualized = selected.visualize();
    let visualize = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: visualized.metrics(),
    };

    let total_duration = clock.elapsed(&total_start);
    let result = visualized.into_result();

    let summary = PipelineSummary {
        image_width: result.dimensions.width,
        image_height: result.dimensions.height,
        pixel_count: result.dimensions.cell_count() as u64,
        component_count: result.component_count(),
        highlighted_pixel_count: result.highlight.foreground_count(),
    };

    log::info!(
        "detection finished in {:.3}ms: {} components, {} highlighted",
        duration_ms(total_duration),
        summary.component_count,
        summary.highlighted_pixel_count,
    );

    Ok((
        result,
        PipelineDiagnostics {
            classify,
            label,
            rank,
            select,
            visualize,
            total_duration,
            summary,
        },
    ))
}
