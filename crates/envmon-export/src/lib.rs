//! envmon-export: Pure serializers for detection output (sans-IO)
//!
//! Renders component records as plain-text reports and binary masks as
//! black/white PNG bytes. Writing the results to disk is the caller's job.

pub mod raster;
pub mod report;

pub use raster::{ExportError, mask_to_gray, mask_to_png};
pub use report::{component_report, ranked_report};
