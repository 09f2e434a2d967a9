use crate::io::envi::{EnviDataType, EnviHeader, Interleave};
use crate::types::{ChunkCube, HsResult, HypersegError};
use ndarray::Array3;
use num_traits::ToPrimitive;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Reader for band-interleaved-by-line spectrometer cubes.
///
/// Owns the open data file and its parsed header; yields bounded line-range
/// chunks decoded to f64 so one chunk is the only cube data in memory at a
/// time.
pub struct CubeReader {
    data_path: PathBuf,
    header: EnviHeader,
    file: File,
}

impl CubeReader {
    /// Open a cube from its data path; the header is expected at `<path>.hdr`.
    ///
    /// Only little-endian BIL rasters with float cells are accepted; any
    /// other layout is a fatal configuration error, never reinterpreted.
    pub fn open<P: AsRef<Path>>(path: P) -> HsResult<Self> {
        let data_path = path.as_ref().to_path_buf();
        let header_path = header_path_for(&data_path);

        log::info!("Opening cube {}", data_path.display());
        let header_text = std::fs::read_to_string(&header_path)?;
        let header = EnviHeader::parse(&header_text)?;

        if header.interleave != Interleave::Bil {
            return Err(HypersegError::UnsupportedLayout(format!(
                "Interleave '{}' is not supported; chunked line reads require bil",
                header.interleave
            )));
        }
        if header.byte_order != 0 {
            return Err(HypersegError::UnsupportedLayout(format!(
                "Byte order {} is not supported; little-endian (0) required",
                header.byte_order
            )));
        }

        let file = File::open(&data_path)?;
        let expected = header.header_offset + (header.lines * header.line_stride()) as u64;
        let actual = file.metadata()?.len();
        if actual < expected {
            return Err(HypersegError::InvalidHeader(format!(
                "Data file holds {} bytes but the header describes {}",
                actual, expected
            )));
        }

        log::debug!(
            "Cube dimensions: {} lines x {} bands x {} samples ({:?})",
            header.lines,
            header.bands,
            header.samples,
            header.data_type
        );

        Ok(CubeReader {
            data_path,
            header,
            file,
        })
    }

    /// Cube dimensions as (lines, bands, samples)
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.header.lines, self.header.bands, self.header.samples)
    }

    pub fn header(&self) -> &EnviHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.data_path
    }

    /// Read the line range `[line_start, line_end)` as a
    /// (lines, bands, samples) chunk decoded to f64.
    ///
    /// BIL cell order matches the output shape, so this is a single seek and
    /// one sequential read.
    pub fn read_chunk(&mut self, line_start: usize, line_end: usize) -> HsResult<ChunkCube> {
        if line_start >= line_end || line_end > self.header.lines {
            return Err(HypersegError::Processing(format!(
                "Chunk range {}..{} is outside the {}-line scene",
                line_start, line_end, self.header.lines
            )));
        }

        let nc = line_end - line_start;
        let stride = self.header.line_stride();
        let offset = self.header.header_offset + (line_start * stride) as u64;

        log::debug!(
            "Reading chunk lines {}..{} ({} bytes)",
            line_start,
            line_end,
            nc * stride
        );

        let mut buf = vec![0u8; nc * stride];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;

        let cells = match self.header.data_type {
            EnviDataType::Float32 => buf
                .chunks_exact(4)
                .map(|b| decode_cell(f32::from_le_bytes([b[0], b[1], b[2], b[3]])))
                .collect::<Vec<f64>>(),
            EnviDataType::Float64 => buf
                .chunks_exact(8)
                .map(|b| {
                    decode_cell(f64::from_le_bytes([
                        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                    ]))
                })
                .collect::<Vec<f64>>(),
        };

        Array3::from_shape_vec((nc, self.header.bands, self.header.samples), cells)
            .map_err(|e| HypersegError::Processing(format!("Chunk reshape failed: {}", e)))
    }
}

fn decode_cell<T: ToPrimitive>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Header path convention: data file `cube` pairs with `cube.hdr`
pub fn header_path_for(data_path: &Path) -> PathBuf {
    let mut os = data_path.as_os_str().to_os_string();
    os.push(".hdr");
    PathBuf::from(os)
}

/// Ascending, non-overlapping line ranges covering the scene exactly once.
/// The final range may be shorter than `nchunk`.
pub fn chunk_ranges(lines: usize, nchunk: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < lines {
        let end = (start + nchunk).min(lines);
        ranges.push((start, end));
        start = end;
    }
    ranges
}
