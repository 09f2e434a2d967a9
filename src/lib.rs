//! Hyperseg: A Fast, Chunked Superpixel Segmenter for Imaging-Spectrometer Cubes
//!
//! This library segments pushbroom imaging-spectrometer cubes that exceed
//! available memory. The cube is streamed in bounded line chunks; each chunk
//! is projected onto its top principal spectral directions, clustered into
//! spatially coherent superpixels, and stitched into one globally unique,
//! contiguous labeling of the full scene.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    ChunkCube, FeatureStack, HsResult, HypersegError, LabelGrid, ValidityMask,
};

pub use io::{CubeReader, EnviHeader, Interleave};

pub use crate::core::{
    compact_labels, segment_count, ChunkProjector, PipelineParams, SegmentationPipeline,
    SegmentationSummary, SlicSegmenter, SuperpixelSegmenter,
};
