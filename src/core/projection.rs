use crate::core::eigen::symmetric_eigen;
use crate::types::{ChunkCube, FeatureStack, HsResult, HypersegError, ValidityMask};
use ndarray::{Array1, Array2, Axis};

/// Tolerance for matching the invalid-pixel sentinel
pub const FLAG_TOLERANCE: f64 = 1e-6;

/// Low-rank spectral projection of one chunk
#[derive(Debug, Clone)]
pub struct ChunkProjection {
    /// Projected features (lines x samples x k); invalid pixels are zeroed
    pub features: FeatureStack,
    /// Per-pixel validity (lines x samples)
    pub mask: ValidityMask,
    /// Compactness scale for clustering, tied to the chunk's spectral variance
    pub compactness: f64,
    /// Top-k covariance eigenvalues, descending
    pub eigenvalues: Vec<f64>,
}

/// Projects raw chunks onto their top principal spectral directions.
///
/// The basis is estimated fresh per chunk from its valid pixels, so each
/// chunk's projection adapts to its own spectral contrast.
pub struct ChunkProjector {
    flag: f64,
    npca: usize,
}

impl ChunkProjector {
    pub fn new(flag: f64, npca: usize) -> HsResult<Self> {
        if npca == 0 {
            return Err(HypersegError::InvalidParameter(
                "npca must be at least 1".to_string(),
            ));
        }
        Ok(ChunkProjector { flag, npca })
    }

    /// Project a raw (lines x bands x samples) chunk.
    ///
    /// `line_start` is the chunk's first scene line, used only for error
    /// reporting.
    pub fn project(&self, chunk: &ChunkCube, line_start: usize) -> HsResult<ChunkProjection> {
        let (nc, nb, ns) = chunk.dim();
        let npix = nc * ns;

        // Pixel-major rows: (lines * samples) x bands
        let pixels = chunk
            .view()
            .permuted_axes([0, 2, 1])
            .as_standard_layout()
            .into_owned()
            .into_shape((npix, nb))
            .map_err(|e| HypersegError::Processing(format!("Chunk reshape failed: {}", e)))?;

        // A pixel is valid only if every band clears the sentinel tolerance
        let valid: Vec<bool> = pixels
            .axis_iter(Axis(0))
            .map(|row| row.iter().all(|&x| (x - self.flag).abs() > FLAG_TOLERANCE))
            .collect();
        let valid_indices: Vec<usize> = (0..npix).filter(|&i| valid[i]).collect();

        let needed = nb + 1;
        if valid_indices.len() < needed {
            return Err(HypersegError::DegenerateChunk {
                line_start,
                line_end: line_start + nc,
                valid: valid_indices.len(),
                needed,
            });
        }

        log::debug!(
            "Chunk at line {}: {}/{} valid pixels",
            line_start,
            valid_indices.len(),
            npix
        );

        let valid_rows = pixels.select(Axis(0), &valid_indices);
        let n = valid_rows.nrows() as f64;
        let mean: Array1<f64> = valid_rows.sum_axis(Axis(0)) / n;

        let centered_valid = &valid_rows - &mean;
        let covariance = centered_valid.t().dot(&centered_valid) / (n - 1.0);

        let eig = symmetric_eigen(&covariance)?;
        let k = self.npca.min(nb);

        // Covariance is PSD; tiny negative eigenvalues are numerical noise
        let top_eigenvalues: Vec<f64> = eig.eigenvalues[..k].iter().map(|l| l.max(0.0)).collect();
        let basis = eig.eigenvectors.slice(ndarray::s![.., ..k]).to_owned();

        // Euclidean norm of the top-k eigenvalue square roots
        let compactness = top_eigenvalues.iter().sum::<f64>().sqrt();

        // Project everything, then zero the invalid rows; they keep their
        // spatial position but cannot influence segmentation
        let centered = &pixels - &mean;
        let mut projected = centered.dot(&basis);
        for (i, &is_valid) in valid.iter().enumerate() {
            if !is_valid {
                projected.row_mut(i).fill(0.0);
            }
        }

        let features = projected
            .into_shape((nc, ns, k))
            .map_err(|e| HypersegError::Processing(format!("Feature reshape failed: {}", e)))?;
        let mask = Array2::from_shape_vec((nc, ns), valid)
            .map_err(|e| HypersegError::Processing(format!("Mask reshape failed: {}", e)))?;

        log::debug!(
            "Chunk at line {}: compactness {:.4}, leading eigenvalue {:.4}",
            line_start,
            compactness,
            top_eigenvalues.first().copied().unwrap_or(0.0)
        );

        Ok(ChunkProjection {
            features,
            mask,
            compactness,
            eigenvalues: top_eigenvalues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    const FLAG: f64 = -9999.0;

    /// Chunk whose two bands vary together, plus an optional flagged block
    fn correlated_chunk(nc: usize, ns: usize) -> ChunkCube {
        Array3::from_shape_fn((nc, 2, ns), |(l, b, s)| {
            let t = (l * ns + s) as f64;
            match b {
                0 => t,
                _ => 2.0 * t + 1.0,
            }
        })
    }

    #[test]
    fn test_validity_mask() {
        let mut chunk = correlated_chunk(4, 4);
        // Fully flagged pixel
        chunk[[1, 0, 2]] = FLAG;
        chunk[[1, 1, 2]] = FLAG;
        // One band at the sentinel is enough to invalidate a pixel
        chunk[[2, 0, 3]] = FLAG;

        let projector = ChunkProjector::new(FLAG, 2).unwrap();
        let proj = projector.project(&chunk, 0).unwrap();

        assert!(!proj.mask[[1, 2]]);
        assert!(!proj.mask[[2, 3]]);
        assert!(proj.mask[[0, 0]]);
        assert_eq!(proj.mask.iter().filter(|&&m| !m).count(), 2);
    }

    #[test]
    fn test_invalid_pixels_projected_to_zero() {
        let mut chunk = correlated_chunk(4, 4);
        chunk[[0, 0, 0]] = FLAG;
        chunk[[0, 1, 0]] = FLAG;

        let projector = ChunkProjector::new(FLAG, 2).unwrap();
        let proj = projector.project(&chunk, 0).unwrap();

        assert_eq!(proj.features[[0, 0, 0]], 0.0);
        assert_eq!(proj.features[[0, 0, 1]], 0.0);
        // A valid pixel away from the mean projects to something non-zero
        assert!(proj.features[[3, 3, 0]].abs() > 0.0);
    }

    #[test]
    fn test_degenerate_chunk_rejected() {
        // 2x2 pixels, 5 bands: 4 valid pixels < bands + 1
        let chunk = Array3::from_shape_fn((2, 5, 2), |(l, b, s)| (l + b + s) as f64);
        let projector = ChunkProjector::new(FLAG, 3).unwrap();
        let result = projector.project(&chunk, 40);

        match result {
            Err(HypersegError::DegenerateChunk {
                line_start,
                line_end,
                valid,
                needed,
            }) => {
                assert_eq!(line_start, 40);
                assert_eq!(line_end, 42);
                assert_eq!(valid, 4);
                assert_eq!(needed, 6);
            }
            other => panic!("Expected DegenerateChunk, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_flagged_pixels_can_degenerate_a_chunk() {
        let mut chunk = correlated_chunk(2, 2);
        for l in 0..2 {
            for s in 0..2 {
                chunk[[l, 0, s]] = FLAG;
                chunk[[l, 1, s]] = FLAG;
            }
        }
        let projector = ChunkProjector::new(FLAG, 2).unwrap();
        assert!(matches!(
            projector.project(&chunk, 0),
            Err(HypersegError::DegenerateChunk { valid: 0, .. })
        ));
    }

    #[test]
    fn test_compactness_matches_eigenvalue_norm() {
        let chunk = correlated_chunk(8, 8);
        let projector = ChunkProjector::new(FLAG, 2).unwrap();
        let proj = projector.project(&chunk, 0).unwrap();

        let expected = proj.eigenvalues.iter().sum::<f64>().sqrt();
        assert_relative_eq!(proj.compactness, expected, epsilon = 1e-10);
        assert!(proj.compactness > 0.0);
    }

    #[test]
    fn test_correlated_bands_collapse_to_one_direction() {
        let chunk = correlated_chunk(8, 8);
        let projector = ChunkProjector::new(FLAG, 2).unwrap();
        let proj = projector.project(&chunk, 0).unwrap();

        // Band 1 = 2 * band 0 + 1: all variance lives in the first direction
        assert!(proj.eigenvalues[0] > 1.0);
        assert_relative_eq!(proj.eigenvalues[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_npca_clamped_to_bands() {
        let chunk = correlated_chunk(8, 8);
        let projector = ChunkProjector::new(FLAG, 10).unwrap();
        let proj = projector.project(&chunk, 0).unwrap();
        assert_eq!(proj.features.dim(), (8, 8, 2));
    }

    #[test]
    fn test_zero_npca_rejected() {
        assert!(ChunkProjector::new(FLAG, 0).is_err());
    }
}
