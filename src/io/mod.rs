//! Raster I/O: the fixed ENVI-style BIL layout, chunked cube reads, and
//! label raster writes

pub mod envi;
pub mod reader;
pub mod writer;

// Re-export main types
pub use envi::{EnviDataType, EnviHeader, Interleave};
pub use reader::{chunk_ranges, header_path_for, CubeReader};
pub use writer::write_label_raster;
