//! envmon: colour-region detection on environmental map images.
//!
//! Classifies every pixel of a map against a target colour, labels the
//! connected regions, ranks them by size, and writes:
//!
//! - `map-<colour>-pixels.png`: the classification mask
//! - `cc-output-2a.txt`: components in discovery order
//! - `cc-output-2b.txt`: components largest first
//! - `cc-top-<k>.png`: the `k` largest components (only when any exist)
//!
//! Per-stage diagnostics are printed to stdout afterwards.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin envmon -- detect [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use envmon_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use envmon_pipeline::{DetectionResult, PipelineConfig};

/// Environmental map analysis.
#[derive(Parser)]
#[command(name = "envmon", version)]
struct Cli {
    /// Log level or `flexi_logger` spec (e.g. `debug`, `envmon_pipeline=trace`).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find and rank regions of one colour in a map image.
    Detect(DetectArgs),
}

#[derive(Args)]
struct DetectArgs {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Colour to detect.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_COLOUR)]
    colour: ColourArg,

    /// Threshold that "high" channels must exceed (0-255).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_UPPER_THRESHOLD)]
    upper: u8,

    /// Threshold that "low" channels must stay below (0-255).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_LOWER_THRESHOLD)]
    lower: u8,

    /// Pixel adjacency used when grouping regions.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_CONNECTIVITY)]
    connectivity: ConnectivityArg,

    /// Number of largest regions to highlight.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_TOP_K)]
    top_k: usize,

    /// Directory for output files (created if missing).
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

/// Target colour selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColourArg {
    /// High red, low green and blue.
    Red,
    /// Low red, high green and blue.
    Cyan,
}

/// Adjacency rule selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ConnectivityArg {
    /// Orthogonal neighbours only.
    Four,
    /// Orthogonal and diagonal neighbours.
    Eight,
}

const fn colour_from_pipeline(c: envmon_pipeline::Colour) -> ColourArg {
    match c {
        envmon_pipeline::Colour::Red => ColourArg::Red,
        envmon_pipeline::Colour::Cyan => ColourArg::Cyan,
    }
}

const fn connectivity_from_pipeline(c: envmon_pipeline::Connectivity) -> ConnectivityArg {
    match c {
        envmon_pipeline::Connectivity::Four => ConnectivityArg::Four,
        envmon_pipeline::Connectivity::Eight => ConnectivityArg::Eight,
    }
}

/// CLI defaults derived from the pipeline defaults so the two cannot
/// silently diverge.
const CLI_DEFAULT_COLOUR: ColourArg = colour_from_pipeline(PipelineConfig::DEFAULT_COLOUR);
const CLI_DEFAULT_CONNECTIVITY: ConnectivityArg =
    connectivity_from_pipeline(PipelineConfig::DEFAULT_CONNECTIVITY);

/// Errors surfaced by the `detect` command.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Pipeline(#[from] envmon_pipeline::PipelineError),

    #[error(transparent)]
    Export(#[from] envmon_export::ExportError),

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize diagnostics: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_args(args: &DetectArgs) -> Result<PipelineConfig, CliError> {
    if let Some(ref json) = args.config_json {
        return Ok(PipelineConfig::from_json(json)?);
    }

    Ok(PipelineConfig {
        colour: match args.colour {
            ColourArg::Red => envmon_pipeline::Colour::Red,
            ColourArg::Cyan => envmon_pipeline::Colour::Cyan,
        },
        upper_threshold: args.upper,
        lower_threshold: args.lower,
        connectivity: match args.connectivity {
            ConnectivityArg::Four => envmon_pipeline::Connectivity::Four,
            ConnectivityArg::Eight => envmon_pipeline::Connectivity::Eight,
        },
        top_k: args.top_k,
    })
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Write the masks and reports for `result` into `out_dir`.
///
/// Returns the paths written, in order.
fn write_outputs(
    result: &DetectionResult,
    config: &PipelineConfig,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, CliError> {
    std::fs::create_dir_all(out_dir).map_err(|source| CliError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();

    let mask_path = out_dir.join(format!("map-{}-pixels.png", config.colour.name()));
    write_file(&mask_path, &envmon_export::mask_to_png(&result.mask)?)?;
    written.push(mask_path);

    let discovery_path = out_dir.join("cc-output-2a.txt");
    let discovery = envmon_export::component_report(&result.labelling.records);
    write_file(&discovery_path, discovery.as_bytes())?;
    written.push(discovery_path);

    let ranked_path = out_dir.join("cc-output-2b.txt");
    let ranked = envmon_export::ranked_report(&result.ranked);
    write_file(&ranked_path, ranked.as_bytes())?;
    written.push(ranked_path);

    if result.component_count() > 0 {
        let top_path = out_dir.join(format!("cc-top-{}.png", config.top_k));
        write_file(&top_path, &envmon_export::mask_to_png(&result.highlight)?)?;
        written.push(top_path);
    } else {
        log::warn!("no {} regions found; skipping top-K mask", config.colour.name());
    }

    Ok(written)
}

/// Run the `detect` command and return the collected diagnostics.
fn run_detect(args: &DetectArgs) -> Result<PipelineDiagnostics, CliError> {
    let config = config_from_args(args)?;

    let image_bytes = std::fs::read(&args.image_path).map_err(|source| CliError::Io {
        path: args.image_path.clone(),
        source,
    })?;
    log::info!(
        "image: {} ({} bytes)",
        args.image_path.display(),
        image_bytes.len(),
    );
    log::debug!("config: {config:?}");

    let image = image::load_from_memory(&image_bytes)
        .map_err(|source| CliError::Decode {
            path: args.image_path.clone(),
            source,
        })?
        .to_rgb8();

    let (result, diagnostics) =
        envmon_pipeline::diagnostics::detect_with_diagnostics(&image, &config, &StdClock)?;
    let written = write_outputs(&result, &config, &args.out_dir)?;
    log::info!(
        "{} files written to {}",
        written.len(),
        args.out_dir.display(),
    );
    Ok(diagnostics)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logger = match flexi_logger::Logger::try_with_str(&cli.log_level)
        .and_then(|logger| logger.log_to_stderr().start())
    {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error initializing logger with {:?}: {e}", cli.log_level);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Detect(ref args) => match run_detect(args) {
            Ok(diagnostics) => {
                if args.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            log::error!("{}", CliError::from(e));
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{e}");
                ExitCode::FAILURE
            }
        },
    }
}
