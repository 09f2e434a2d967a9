use crate::core::slic::{slic, SlicParams};
use crate::types::{FeatureStack, HsResult, HypersegError, LabelGrid, ValidityMask};

/// Capability contract for superpixel clustering.
///
/// Implementations must honor the target count as a hint, scale spatial
/// regularity with `compactness`, and return 1-based labels over every
/// pixel of the grid; validity masking happens outside, after clustering.
/// Any substitute must keep segments spatially connected and size-bounded.
pub trait SuperpixelSegmenter {
    fn segment(
        &self,
        features: &FeatureStack,
        n_segments: usize,
        compactness: f64,
    ) -> HsResult<LabelGrid>;
}

/// The built-in SLIC-backed segmenter
pub struct SlicSegmenter {
    params: SlicParams,
}

impl SlicSegmenter {
    /// Create a segmenter with default clustering parameters
    pub fn new() -> Self {
        Self {
            params: SlicParams::default(),
        }
    }

    pub fn with_params(params: SlicParams) -> Self {
        Self { params }
    }
}

impl Default for SlicSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SuperpixelSegmenter for SlicSegmenter {
    fn segment(
        &self,
        features: &FeatureStack,
        n_segments: usize,
        compactness: f64,
    ) -> HsResult<LabelGrid> {
        slic(features, n_segments, compactness, &self.params)
    }
}

/// Force invalid pixels to label 0, whatever the clustering assigned them
pub fn apply_validity_mask(labels: &mut LabelGrid, mask: &ValidityMask) -> HsResult<()> {
    if labels.dim() != mask.dim() {
        return Err(HypersegError::Processing(format!(
            "Label grid {:?} and validity mask {:?} disagree in shape",
            labels.dim(),
            mask.dim()
        )));
    }
    for (label, &valid) in labels.iter_mut().zip(mask.iter()) {
        if !valid {
            *label = 0;
        }
    }
    Ok(())
}

/// Proportional allocation of the scene-wide segment target across chunks.
///
/// The per-chunk share is the total target over the nominal chunk count
/// (integer division, floored at one chunk), scaled by the chunk's actual
/// line count and rounded half away from zero. A non-empty chunk always
/// requests at least one segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentBudget {
    seg_per_chunk: usize,
    nchunk: usize,
}

impl SegmentBudget {
    pub fn new(total_segments: usize, total_lines: usize, nchunk: usize) -> HsResult<Self> {
        if nchunk == 0 {
            return Err(HypersegError::InvalidParameter(
                "nchunk must be at least 1".to_string(),
            ));
        }
        if total_segments == 0 {
            return Err(HypersegError::InvalidParameter(
                "nseg must be at least 1".to_string(),
            ));
        }
        let nominal_chunks = (total_lines / nchunk).max(1);
        Ok(SegmentBudget {
            seg_per_chunk: total_segments / nominal_chunks,
            nchunk,
        })
    }

    /// Segment target for a chunk of `chunk_lines` lines
    pub fn segments_for_chunk(&self, chunk_lines: usize) -> usize {
        let scaled =
            chunk_lines as f64 / self.nchunk as f64 * self.seg_per_chunk as f64;
        (scaled.round() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_budget_even_split() {
        // 200 segments over 100 lines in 50-line chunks: 100 per chunk
        let budget = SegmentBudget::new(200, 100, 50).unwrap();
        assert_eq!(budget.segments_for_chunk(50), 100);
    }

    #[test]
    fn test_budget_short_final_chunk() {
        // 90 lines in 50-line chunks: nominal count is 1, final chunk is 40
        let budget = SegmentBudget::new(100, 90, 50).unwrap();
        assert_eq!(budget.segments_for_chunk(50), 100);
        assert_eq!(budget.segments_for_chunk(40), 80);
    }

    #[test]
    fn test_budget_chunk_larger_than_scene() {
        // Nominal chunk count floors at 1 instead of hitting zero here
        let budget = SegmentBudget::new(200, 100, 1000).unwrap();
        assert_eq!(budget.segments_for_chunk(100), 20);
    }

    #[test]
    fn test_budget_never_zero_for_nonempty_chunk() {
        let budget = SegmentBudget::new(10, 10000, 1000).unwrap();
        assert_eq!(budget.segments_for_chunk(1), 1);
    }

    #[test]
    fn test_budget_rejects_zero_params() {
        assert!(SegmentBudget::new(100, 100, 0).is_err());
        assert!(SegmentBudget::new(0, 100, 10).is_err());
    }

    #[test]
    fn test_slic_segmenter_labels_are_one_based() {
        let features = Array3::zeros((12, 12, 2));
        let segmenter = SlicSegmenter::new();
        let labels = segmenter.segment(&features, 4, 1.0).unwrap();
        assert!(labels.iter().all(|&l| l >= 1));
    }

    #[test]
    fn test_apply_validity_mask() {
        let mut labels = Array2::from_elem((3, 3), 5u32);
        let mut mask = Array2::from_elem((3, 3), true);
        mask[[1, 1]] = false;
        mask[[2, 0]] = false;

        apply_validity_mask(&mut labels, &mask).unwrap();

        assert_eq!(labels[[1, 1]], 0);
        assert_eq!(labels[[2, 0]], 0);
        assert_eq!(labels[[0, 0]], 5);
        assert_eq!(labels.iter().filter(|&&l| l == 0).count(), 2);
    }

    #[test]
    fn test_apply_validity_mask_shape_mismatch() {
        let mut labels = Array2::from_elem((3, 3), 1u32);
        let mask = Array2::from_elem((2, 3), true);
        assert!(apply_validity_mask(&mut labels, &mask).is_err());
    }
}
