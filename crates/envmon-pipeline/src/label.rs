//! Connected-component labelling by breadth-first flood fill.
//!
//! The mask is scanned in row-major order. Each unlabelled foreground
//! cell seeds a new component, numbered in discovery order from 1, which
//! is grown with a FIFO frontier until no reachable unlabelled foreground
//! cell remains. Every cell is labelled at most once, so the pass runs in
//! `O(width * height)` time and space.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::{BinaryMask, ComponentRecord, Dimensions, LabelGrid};

/// Orthogonal neighbour offsets.
const FOUR_NEIGHBOURS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Orthogonal and diagonal neighbour offsets.
const EIGHT_NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Adjacency rule deciding which foreground cells belong together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Up, down, left, right.
    Four,
    /// Orthogonal plus diagonal neighbours. Diagonally touching cells
    /// merge into one component.
    #[default]
    Eight,
}

impl Connectivity {
    /// Neighbour offsets `(dx, dy)` for this rule.
    #[must_use]
    pub const fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Self::Four => &FOUR_NEIGHBOURS,
            Self::Eight => &EIGHT_NEIGHBOURS,
        }
    }

    /// In-bounds neighbours of `(x, y)` within `dimensions`.
    pub fn neighbours(
        self,
        x: u32,
        y: u32,
        dimensions: Dimensions,
    ) -> impl Iterator<Item = (u32, u32)> {
        self.offsets().iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            (nx < dimensions.width && ny < dimensions.height).then_some((nx, ny))
        })
    }
}

/// Output of [`label_components`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labelling {
    /// Per-cell labels; `0` is background.
    pub grid: LabelGrid,
    /// One record per component, in discovery order (`records[i].label == i + 1`).
    pub records: Vec<ComponentRecord>,
}

impl Labelling {
    /// Number of components found.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.records.len()
    }

    /// Total foreground cells across all components.
    #[must_use]
    pub fn total_pixels(&self) -> u64 {
        self.records.iter().map(|r| r.pixel_count).sum()
    }
}

/// Label every maximal connected foreground region of `mask`.
///
/// An all-background or zero-size mask yields no records and an
/// all-zero grid.
#[must_use = "returns the label grid and component records"]
pub fn label_components(mask: &BinaryMask, connectivity: Connectivity) -> Labelling {
    let dimensions = mask.dimensions();
    let cells = mask.cells();
    let mut labels = vec![0_u32; cells.len()];
    let mut records = Vec::new();
    let mut queue = VecDeque::new();
    let mut next_label: u32 = 1;

    for y in 0..dimensions.height {
        for x in 0..dimensions.width {
            let seed = dimensions.index(x, y);
            if !cells[seed] || labels[seed] != 0 {
                continue;
            }

            let label = next_label;
            next_label += 1;
            labels[seed] = label;
            queue.push_back((x, y));
            let mut pixel_count: u64 = 1;

            while let Some((qx, qy)) = queue.pop_front() {
                for (nx, ny) in connectivity.neighbours(qx, qy, dimensions) {
                    let n = dimensions.index(nx, ny);
                    if cells[n] && labels[n] == 0 {
                        labels[n] = label;
                        pixel_count += 1;
                        queue.push_back((nx, ny));
                    }
                }
            }

            records.push(ComponentRecord::new(label, pixel_count));
        }
    }

    log::debug!(
        "labelled {} components ({connectivity:?}-connected) in {}x{} mask",
        records.len(),
        dimensions.width,
        dimensions.height,
    );

    Labelling {
        grid: LabelGrid::from_parts(dimensions, labels),
        records,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mask(rows: &[&[u8]]) -> BinaryMask {
        BinaryMask::from_rows(rows).unwrap()
    }

    #[test]
    fn default_is_eight_connected() {
        assert_eq!(Connectivity::default(), Connectivity::Eight);
    }

    #[test]
    fn neighbours_are_bounds_checked() {
        let dims = Dimensions::new(3, 3);
        let corner: Vec<_> = Connectivity::Eight.neighbours(0, 0, dims).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1), (1, 1)]);
        let centre = Connectivity::Eight.neighbours(1, 1, dims).count();
        assert_eq!(centre, 8);
        let far_corner: Vec<_> = Connectivity::Four.neighbours(2, 2, dims).collect();
        assert_eq!(far_corner, vec![(2, 1), (1, 2)]);
    }

    #[test]
    fn plus_shape_is_one_component_of_five() {
        let m = mask(&[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]]);
        let labelling = label_components(&m, Connectivity::Eight);
        assert_eq!(labelling.records, vec![ComponentRecord::new(1, 5)]);
        assert_eq!(labelling.grid.get(0, 0), 0);
        assert_eq!(labelling.grid.get(1, 1), 1);
    }

    #[test]
    fn diagonal_cells_merge_with_eight_connectivity() {
        let m = mask(&[&[1, 0], &[0, 1]]);
        let labelling = label_components(&m, Connectivity::Eight);
        assert_eq!(labelling.records, vec![ComponentRecord::new(1, 2)]);
    }

    #[test]
    fn diagonal_cells_split_with_four_connectivity() {
        let m = mask(&[&[1, 0], &[0, 1]]);
        let labelling = label_components(&m, Connectivity::Four);
        assert_eq!(
            labelling.records,
            vec![ComponentRecord::new(1, 1), ComponentRecord::new(2, 1)],
        );
        assert_eq!(labelling.grid.labels(), &[1, 0, 0, 2]);
    }

    #[test]
    fn all_background_has_no_components() {
        let m = BinaryMask::new(Dimensions::new(7, 4));
        let labelling = label_components(&m, Connectivity::Eight);
        assert!(labelling.records.is_empty());
        assert!(labelling.grid.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn zero_size_mask_has_no_components() {
        let m = BinaryMask::new(Dimensions::new(0, 0));
        let labelling = label_components(&m, Connectivity::Eight);
        assert_eq!(labelling.component_count(), 0);
        assert!(labelling.grid.labels().is_empty());
    }

    #[test]
    fn labels_follow_row_major_discovery_order() {
        // The component whose first cell appears earliest in the scan gets
        // label 1, even though it extends further down than the others.
        let m = mask(&[
            &[0, 0, 0, 1, 0],
            &[1, 0, 0, 1, 0],
            &[0, 0, 0, 1, 0],
            &[0, 0, 0, 0, 0],
            &[1, 1, 0, 0, 1],
        ]);
        let labelling = label_components(&m, Connectivity::Eight);
        assert_eq!(
            labelling.records,
            vec![
                ComponentRecord::new(1, 3),
                ComponentRecord::new(2, 1),
                ComponentRecord::new(3, 2),
                ComponentRecord::new(4, 1),
            ],
        );
        assert_eq!(labelling.grid.get(3, 2), 1);
        assert_eq!(labelling.grid.get(0, 1), 2);
        assert_eq!(labelling.grid.get(1, 4), 3);
        assert_eq!(labelling.grid.get(4, 4), 4);
    }

    #[test]
    fn u_shape_reached_from_both_arms_is_one_component() {
        // Row-major scan meets the left arm first; the right arm is only
        // reachable through the bottom row.
        let m = mask(&[&[1, 0, 1], &[1, 0, 1], &[1, 1, 1]]);
        let labelling = label_components(&m, Connectivity::Four);
        assert_eq!(labelling.records, vec![ComponentRecord::new(1, 7)]);
    }

    #[test]
    fn full_mask_is_single_component() {
        let m = BinaryMask::from_fn(Dimensions::new(40, 30), |_, _| true);
        let labelling = label_components(&m, Connectivity::Four);
        assert_eq!(labelling.records, vec![ComponentRecord::new(1, 1200)]);
    }

    #[test]
    fn checkerboard_connectivity_changes_counts() {
        let m = BinaryMask::from_fn(Dimensions::new(4, 4), |x, y| (x + y) % 2 == 0);
        assert_eq!(label_components(&m, Connectivity::Eight).component_count(), 1);
        assert_eq!(label_components(&m, Connectivity::Four).component_count(), 8);
    }

    #[test]
    fn totals_are_conserved() {
        let m = BinaryMask::from_fn(Dimensions::new(13, 9), |x, y| (x * 7 + y * 3) % 5 < 2);
        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            let labelling = label_components(&m, connectivity);
            assert_eq!(labelling.total_pixels(), m.foreground_count());
        }
    }
}
