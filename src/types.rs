use ndarray::{Array2, Array3};

/// Raw cube chunk (lines x bands x samples)
pub type ChunkCube = Array3<f64>;

/// Projected low-rank chunk (lines x samples x components)
pub type FeatureStack = Array3<f64>;

/// Per-pixel validity within a chunk (lines x samples)
pub type ValidityMask = Array2<bool>;

/// Superpixel labels, local or scene-wide; 0 is reserved for invalid pixels
pub type LabelGrid = Array2<u32>;

/// Error types for cube segmentation
#[derive(Debug, thiserror::Error)]
pub enum HypersegError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported raster layout: {0}")]
    UnsupportedLayout(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error(
        "Degenerate chunk (lines {line_start}..{line_end}): \
         {valid} valid pixels, need at least {needed} for covariance estimation"
    )]
    DegenerateChunk {
        line_start: usize,
        line_end: usize,
        valid: usize,
        needed: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for segmentation operations
pub type HsResult<T> = Result<T, HypersegError>;
