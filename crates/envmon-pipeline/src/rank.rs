//! Component ranking and top-K selection.
//!
//! Records are ordered by pixel count, largest first. The sort is stable,
//! so components of equal size keep their discovery order.

use serde::{Deserialize, Serialize};

use crate::types::ComponentRecord;

/// Component records sorted by pixel count, descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedComponents(Vec<ComponentRecord>);

impl RankedComponents {
    /// Returns `true` if there are no components.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ranked components.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// The largest component, if any.
    #[must_use]
    pub fn first(&self) -> Option<&ComponentRecord> {
        self.0.first()
    }

    /// All records in ranked order.
    #[must_use]
    pub fn records(&self) -> &[ComponentRecord] {
        &self.0
    }

    /// Consumes the ranking and returns the underlying records.
    #[must_use]
    pub fn into_records(self) -> Vec<ComponentRecord> {
        self.0
    }
}

/// Sort records by pixel count, largest first, ties in discovery order.
#[must_use = "returns the ranked records"]
pub fn rank_components(records: &[ComponentRecord]) -> RankedComponents {
    let mut ranked = records.to_vec();
    // `sort_by` is stable: equal counts keep their input order.
    ranked.sort_by(|a, b| b.pixel_count.cmp(&a.pixel_count));
    RankedComponents(ranked)
}

/// The first `k` ranked records, or all of them when fewer than `k` exist.
#[must_use = "returns the selected records"]
pub fn select_top_k(ranked: &RankedComponents, k: usize) -> Vec<ComponentRecord> {
    ranked.records().iter().take(k).copied().collect()
}

/// Labels of the given records, for use with
/// [`visualize_selection`](crate::visualize::visualize_selection).
#[must_use]
pub fn labels_of(records: &[ComponentRecord]) -> Vec<u32> {
    records.iter().map(|r| r.label).collect()
}
