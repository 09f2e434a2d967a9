use crate::core::compact::{compact_labels, segment_count};
use crate::core::projection::ChunkProjector;
use crate::core::segment::{apply_validity_mask, SegmentBudget, SlicSegmenter, SuperpixelSegmenter};
use crate::core::stitch::stitch_chunk;
use crate::io::reader::{chunk_ranges, CubeReader};
use crate::io::writer::write_label_raster;
use crate::types::{HsResult, LabelGrid};
use ndarray::s;
use std::path::{Path, PathBuf};

/// Top-level tuning for a segmentation run
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Invalid-pixel sentinel value
    pub flag: f64,
    /// Rank of the per-chunk spectral projection
    pub npca: usize,
    /// Scene-wide superpixel target
    pub nseg: usize,
    /// Nominal chunk size in lines
    pub nchunk: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            flag: -9999.0,
            npca: 5,
            nseg: 10_000,
            nchunk: 1000,
        }
    }
}

/// Summary of a completed segmentation run
#[derive(Debug, Clone)]
pub struct SegmentationSummary {
    pub lines: usize,
    pub bands: usize,
    pub samples: usize,
    pub chunks: usize,
    /// Final scene-wide superpixel count K
    pub segments: usize,
    pub label_path: PathBuf,
}

/// Chunked segmentation pipeline:
/// read -> project -> segment -> stitch per chunk, then compact and write.
///
/// Memory stays bounded by one chunk's raw cube and its derived products;
/// the scene label accumulator is the only full-scene allocation. The
/// first error in any stage aborts the whole run and leaves no valid
/// output artifact.
pub struct SegmentationPipeline<S = SlicSegmenter> {
    params: PipelineParams,
    segmenter: S,
}

impl SegmentationPipeline<SlicSegmenter> {
    /// Pipeline with the built-in SLIC segmenter
    pub fn new(params: PipelineParams) -> Self {
        Self {
            params,
            segmenter: SlicSegmenter::new(),
        }
    }
}

impl<S: SuperpixelSegmenter> SegmentationPipeline<S> {
    /// Pipeline with a custom clustering capability
    pub fn with_segmenter(params: PipelineParams, segmenter: S) -> Self {
        Self { params, segmenter }
    }

    /// Run the full pipeline on a cube, writing `<input>_lbl` and
    /// `<input>_lbl.hdr` next to it.
    pub fn run(&self, input: &Path) -> HsResult<SegmentationSummary> {
        let mut reader = CubeReader::open(input)?;
        let (lines, bands, samples) = reader.dimensions();

        let scene = self.segment_scene(&mut reader)?;
        let chunks = chunk_ranges(lines, self.params.nchunk).len();

        log::info!("Compacting scene labels");
        let compacted = compact_labels(&scene);
        let segments = segment_count(&compacted);

        let label_path = label_path_for(input);
        write_label_raster(&label_path, &compacted)?;

        log::info!(
            "Segmentation complete: {} superpixels over {} lines x {} samples ({} chunks)",
            segments,
            lines,
            samples,
            chunks
        );

        Ok(SegmentationSummary {
            lines,
            bands,
            samples,
            chunks,
            segments,
            label_path,
        })
    }

    /// The chunked fold: stitched (pre-compaction) scene labels.
    ///
    /// The label counter is threaded through the loop explicitly; each
    /// chunk step takes the current value and hands back the updated one.
    pub fn segment_scene(&self, reader: &mut CubeReader) -> HsResult<LabelGrid> {
        let (lines, _bands, samples) = reader.dimensions();

        let projector = ChunkProjector::new(self.params.flag, self.params.npca)?;
        let budget = SegmentBudget::new(self.params.nseg, lines, self.params.nchunk)?;

        let mut scene = LabelGrid::zeros((lines, samples));
        let mut next_label = 0u32;

        for (start, end) in chunk_ranges(lines, self.params.nchunk) {
            let target = budget.segments_for_chunk(end - start);
            log::info!(
                "Chunk lines {}..{}: requesting {} segments",
                start,
                end,
                target
            );

            let raw = reader.read_chunk(start, end)?;
            let projection = projector.project(&raw, start)?;

            let mut local =
                self.segmenter
                    .segment(&projection.features, target, projection.compactness)?;
            apply_validity_mask(&mut local, &projection.mask)?;

            next_label = stitch_chunk(&local, next_label, scene.slice_mut(s![start..end, ..]))?;
            log::debug!("Label counter now {}", next_label);
        }

        Ok(scene)
    }
}

/// Label output path convention: `<input>_lbl`
pub fn label_path_for(input: &Path) -> PathBuf {
    let mut os = input.as_os_str().to_os_string();
    os.push("_lbl");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_path_convention() {
        assert_eq!(
            label_path_for(Path::new("/data/scene")),
            PathBuf::from("/data/scene_lbl")
        );
    }

    #[test]
    fn test_default_params() {
        let params = PipelineParams::default();
        assert_eq!(params.flag, -9999.0);
        assert_eq!(params.npca, 5);
        assert_eq!(params.nseg, 10_000);
        assert_eq!(params.nchunk, 1000);
    }
}
