use crate::types::LabelGrid;
use std::collections::{BTreeSet, HashMap};

/// Re-index sparse scene labels onto the contiguous range `{0, ..., K}`.
///
/// The i-th smallest distinct value maps to `i`, preserving the relative
/// order of label identities but not their numeric gaps. Label 0 is always
/// part of the map domain, so invalid/background keeps label 0 and no
/// valid superpixel is ever compacted onto it. Applying this twice is the
/// same as applying it once.
pub fn compact_labels(labels: &LabelGrid) -> LabelGrid {
    let mut distinct: BTreeSet<u32> = labels.iter().copied().collect();
    // 0 anchors the map even in a scene with no invalid pixels
    distinct.insert(0);

    let rank: HashMap<u32, u32> = distinct
        .iter()
        .enumerate()
        .map(|(i, &value)| (value, i as u32))
        .collect();

    labels.mapv(|value| rank[&value])
}

/// Number of distinct non-zero labels in a grid
pub fn segment_count(labels: &LabelGrid) -> usize {
    let distinct: BTreeSet<u32> = labels.iter().copied().filter(|&l| l != 0).collect();
    distinct.len()
}
