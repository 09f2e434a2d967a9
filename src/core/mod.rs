//! Core segmentation modules

pub mod compact;
pub mod eigen;
pub mod pipeline;
pub mod projection;
pub mod segment;
pub mod slic;
pub mod stitch;

// Re-export main types
pub use compact::{compact_labels, segment_count};
pub use eigen::{symmetric_eigen, EigenDecomposition};
pub use pipeline::{label_path_for, PipelineParams, SegmentationPipeline, SegmentationSummary};
pub use projection::{ChunkProjection, ChunkProjector, FLAG_TOLERANCE};
pub use segment::{apply_validity_mask, SegmentBudget, SlicSegmenter, SuperpixelSegmenter};
pub use slic::{slic, SlicParams};
pub use stitch::stitch_chunk;
