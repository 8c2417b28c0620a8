//! Plain-text component reports.
//!
//! One line per component followed by a total:
//!
//! ```text
//! Connected Component 1, number of pixels = 16
//! Connected Component 2, number of pixels = 6
//! Total number of connected components = 2
//! ```
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use envmon_pipeline::{ComponentRecord, RankedComponents};

/// List components in discovery order.
///
/// # Examples
///
/// ```
/// use envmon_pipeline::ComponentRecord;
/// use envmon_export::component_report;
///
/// let report = component_report(&[ComponentRecord::new(1, 5)]);
/// assert_eq!(
///     report,
///     "Connected Component 1, number of pixels = 5\n\
///      Total number of connected components = 1\n",
/// );
/// ```
#[must_use]
pub fn component_report(records: &[ComponentRecord]) -> String {
    render(records, records.len())
}

/// List components largest first. The total line counts every ranked
/// component.
#[must_use]
pub fn ranked_report(ranked: &RankedComponents) -> String {
    render(ranked.records(), ranked.len())
}

fn render(records: &[ComponentRecord], total: usize) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "Connected Component {}, number of pixels = {}",
            record.label, record.pixel_count,
        );
    }
    let _ = writeln!(out, "Total number of connected components = {total}");
    out
}
