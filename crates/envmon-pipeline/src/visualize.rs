//! Highlight mask: project a label grid onto a chosen set of components.
//!
//! This is the last step in the pipeline.

use std::collections::HashSet;

use crate::types::{BinaryMask, LabelGrid};

/// Build a mask whose foreground is exactly the cells carrying one of
/// `selected_labels`. Label `0` (background) is never highlighted.
#[must_use = "returns the highlight mask"]
pub fn visualize_selection(grid: &LabelGrid, selected_labels: &[u32]) -> BinaryMask {
    let selected: HashSet<u32> = selected_labels.iter().copied().filter(|&l| l != 0).collect();
    BinaryMask::from_fn(grid.dimensions(), |x, y| selected.contains(&grid.get(x, y)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::label::{Connectivity, label_components};
    use crate::types::Dimensions;

    fn labelled(rows: &[&[u8]]) -> LabelGrid {
        label_components(&BinaryMask::from_rows(rows).unwrap(), Connectivity::Eight).grid
    }

    #[test]
    fn only_selected_labels_are_foreground() {
        let grid = labelled(&[&[1, 0, 1], &[0, 0, 0], &[1, 0, 0]]);
        // Components: 1 at (0,0), 2 at (2,0), 3 at (0,2).
        let mask = visualize_selection(&grid, &[1, 3]);
        assert_eq!(mask.to_rows(), vec![vec![1, 0, 0], vec![0, 0, 0], vec![1, 0, 0]]);
    }

    #[test]
    fn empty_selection_is_all_background() {
        let grid = labelled(&[&[1, 1], &[1, 1]]);
        let mask = visualize_selection(&grid, &[]);
        assert_eq!(mask.foreground_count(), 0);
        assert_eq!(mask.dimensions(), Dimensions::new(2, 2));
    }

    #[test]
    fn background_label_is_never_selected() {
        let grid = labelled(&[&[1, 0], &[0, 0]]);
        let mask = visualize_selection(&grid, &[0]);
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn unknown_labels_are_ignored() {
        let grid = labelled(&[&[1, 0], &[0, 0]]);
        let mask = visualize_selection(&grid, &[1, 99]);
        assert_eq!(mask.to_rows(), vec![vec![1, 0], vec![0, 0]]);
    }
}
