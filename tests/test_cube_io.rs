use hyperseg::io::{header_path_for, write_label_raster, CubeReader};
use hyperseg::{HypersegError, LabelGrid};
use ndarray::Array3;
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_raw_cube(
    dir: &Path,
    name: &str,
    cube: &Array3<f32>,
    interleave: &str,
    byte_order: u8,
) -> PathBuf {
    let (nl, nb, ns) = cube.dim();
    let path = dir.join(name);

    let mut file = std::fs::File::create(&path).unwrap();
    for &v in cube.iter() {
        let bytes = if byte_order == 0 {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        file.write_all(&bytes).unwrap();
    }

    let header = format!(
        "ENVI\nsamples = {}\nlines = {}\nbands = {}\nheader offset = 0\n\
         file type = ENVI Standard\ndata type = 4\ninterleave = {}\nbyte order = {}\n",
        ns, nl, nb, interleave, byte_order
    );
    std::fs::write(header_path_for(&path), header).unwrap();

    path
}

#[test]
fn test_open_and_read_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let cube = Array3::from_shape_fn((8, 3, 4), |(l, b, s)| (l * 100 + b * 10 + s) as f32);
    let path = write_raw_cube(dir.path(), "cube", &cube, "bil", 0);

    let mut reader = CubeReader::open(&path).unwrap();
    assert_eq!(reader.dimensions(), (8, 3, 4));

    // Values survive the BIL round trip in both chunks
    let first = reader.read_chunk(0, 5).unwrap();
    assert_eq!(first.dim(), (5, 3, 4));
    assert_eq!(first[[0, 0, 0]], 0.0);
    assert_eq!(first[[4, 2, 3]], 423.0);

    let second = reader.read_chunk(5, 8).unwrap();
    assert_eq!(second.dim(), (3, 3, 4));
    assert_eq!(second[[0, 1, 2]], 512.0);
}

#[test]
fn test_non_bil_interleave_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cube = Array3::zeros((4, 2, 4));
    let path = write_raw_cube(dir.path(), "cube_bsq", &cube, "bsq", 0);

    match CubeReader::open(&path) {
        Err(HypersegError::UnsupportedLayout(msg)) => {
            assert!(msg.contains("bsq") || msg.contains("Interleave"));
        }
        other => panic!("Expected UnsupportedLayout, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_big_endian_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cube = Array3::zeros((4, 2, 4));
    let path = write_raw_cube(dir.path(), "cube_be", &cube, "bil", 1);

    assert!(matches!(
        CubeReader::open(&path),
        Err(HypersegError::UnsupportedLayout(_))
    ));
}

#[test]
fn test_missing_header_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orphan");
    std::fs::write(&path, [0u8; 64]).unwrap();

    assert!(matches!(
        CubeReader::open(&path),
        Err(HypersegError::Io(_))
    ));
}

#[test]
fn test_truncated_data_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cube = Array3::zeros((4, 2, 4));
    let path = write_raw_cube(dir.path(), "cube_short", &cube, "bil", 0);

    // Chop the data file below what the header describes
    let data = std::fs::read(&path).unwrap();
    std::fs::write(&path, &data[..data.len() / 2]).unwrap();

    assert!(matches!(
        CubeReader::open(&path),
        Err(HypersegError::InvalidHeader(_))
    ));
}

#[test]
fn test_out_of_range_chunk_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cube = Array3::zeros((4, 2, 4));
    let path = write_raw_cube(dir.path(), "cube", &cube, "bil", 0);

    let mut reader = CubeReader::open(&path).unwrap();
    assert!(reader.read_chunk(2, 2).is_err());
    assert!(reader.read_chunk(0, 5).is_err());
    assert!(reader.read_chunk(3, 2).is_err());
}

#[test]
fn test_label_raster_round_trip_through_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene_lbl");

    let labels = LabelGrid::from_shape_fn((5, 7), |(l, s)| (l * 7 + s) as u32 % 4);
    write_label_raster(&path, &labels).unwrap();

    let mut reader = CubeReader::open(&path).unwrap();
    let (lines, bands, samples) = reader.dimensions();
    assert_eq!((lines, bands, samples), (5, 1, 7));

    let cube = reader.read_chunk(0, 5).unwrap();
    for l in 0..5 {
        for s in 0..7 {
            assert_eq!(cube[[l, 0, s]], (labels[[l, s]]) as f64);
        }
    }
}
