use crate::io::envi::EnviHeader;
use crate::io::reader::header_path_for;
use crate::types::{HsResult, LabelGrid};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a label grid as a single-band float32 BIL raster with its header.
///
/// Both the data file and `<path>.hdr` are fully overwritten. A write
/// failure surfaces as an I/O error and the partial output is not a valid
/// product; no recovery is attempted.
pub fn write_label_raster<P: AsRef<Path>>(path: P, labels: &LabelGrid) -> HsResult<()> {
    let path = path.as_ref();
    let (lines, samples) = labels.dim();
    let header = EnviHeader::label_header(lines, samples);

    log::info!(
        "Writing {} x {} label raster to {}",
        lines,
        samples,
        path.display()
    );

    let mut writer = BufWriter::new(File::create(path)?);
    for row in labels.rows() {
        for &label in row {
            writer.write_all(&(label as f32).to_le_bytes())?;
        }
    }
    writer.flush()?;

    std::fs::write(header_path_for(path), header.to_header_text())?;

    log::debug!("Label raster written ({} bytes)", lines * samples * 4);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::reader::CubeReader;
    use ndarray::Array2;

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene_lbl");

        let labels = Array2::from_shape_fn((6, 4), |(i, j)| (i * 4 + j) as u32);
        write_label_raster(&path, &labels).unwrap();

        let mut reader = CubeReader::open(&path).unwrap();
        assert_eq!(reader.dimensions(), (6, 1, 4));

        let cube = reader.read_chunk(0, 6).unwrap();
        for i in 0..6 {
            for j in 0..4 {
                assert_eq!(cube[[i, 0, j]], (i * 4 + j) as f64);
            }
        }
    }

    #[test]
    fn test_overwrites_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene_lbl");

        let first = Array2::from_elem((3, 3), 7u32);
        write_label_raster(&path, &first).unwrap();

        let second = Array2::from_elem((2, 2), 1u32);
        write_label_raster(&path, &second).unwrap();

        let mut reader = CubeReader::open(&path).unwrap();
        assert_eq!(reader.dimensions(), (2, 1, 2));
        let cube = reader.read_chunk(0, 2).unwrap();
        assert_eq!(cube[[0, 0, 0]], 1.0);
    }
}
