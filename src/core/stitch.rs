use crate::types::{HsResult, HypersegError, LabelGrid};
use ndarray::ArrayViewMut2;

/// Offset a chunk's local labels into the scene accumulator and advance the
/// global label counter.
///
/// Every non-zero local label `L` is written as `L + next_label`; label 0
/// (invalid) stays 0. Returns the updated counter: one past the highest
/// global label just assigned, or `next_label` unchanged for a chunk with
/// no valid labels. Chunks stitched in sequence therefore occupy pairwise
/// disjoint label ranges with no communication beyond this one scalar.
pub fn stitch_chunk(
    local: &LabelGrid,
    next_label: u32,
    mut scene_rows: ArrayViewMut2<u32>,
) -> HsResult<u32> {
    if local.dim() != scene_rows.dim() {
        return Err(HypersegError::Processing(format!(
            "Local labels {:?} do not fit the scene slice {:?}",
            local.dim(),
            scene_rows.dim()
        )));
    }

    let mut max_local = 0u32;
    for (dst, &label) in scene_rows.iter_mut().zip(local.iter()) {
        if label == 0 {
            *dst = 0;
        } else {
            *dst = label + next_label;
            max_local = max_local.max(label);
        }
    }

    if max_local == 0 {
        log::debug!("Chunk produced no valid labels; counter stays at {}", next_label);
        Ok(next_label)
    } else {
        Ok(next_label + max_local + 1)
    }
}
