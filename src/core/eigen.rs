use crate::types::{HsResult, HypersegError};
use ndarray::Array2;

/// Eigendecomposition of a symmetric matrix.
///
/// Eigenpairs are sorted by descending eigenvalue; column `i` of
/// `eigenvectors` pairs with `eigenvalues[i]`.
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    pub eigenvalues: Vec<f64>,
    pub eigenvectors: Array2<f64>,
}

const MAX_SWEEPS: usize = 64;
const CONVERGENCE_EPS: f64 = 1e-12;

/// Cyclic Jacobi eigendecomposition for small symmetric matrices.
///
/// The covariance matrices this crate feeds in are at most
/// bands x bands, where Jacobi rotation sweeps converge quickly and need no
/// external LAPACK binding. Input must be square with finite entries; only
/// the symmetric part is meaningful.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> HsResult<EigenDecomposition> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(HypersegError::Processing(format!(
            "Eigendecomposition needs a square matrix, got {}x{}",
            rows, cols
        )));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(HypersegError::Processing(
            "Eigendecomposition input contains non-finite values".to_string(),
        ));
    }

    let n = rows;
    let mut a = matrix.clone();
    let mut v: Array2<f64> = Array2::eye(n);

    let scale = matrix.iter().map(|x| x * x).sum::<f64>().sqrt().max(1.0);

    for sweep in 0..MAX_SWEEPS {
        let off: f64 = off_diagonal_norm(&a);
        if off < CONVERGENCE_EPS * scale {
            log::trace!("Jacobi converged after {} sweeps", sweep);
            break;
        }

        for p in 0..n - 1 {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() < CONVERGENCE_EPS * scale / (n * n) as f64 {
                    continue;
                }

                let app = a[[p, p]];
                let aqq = a[[q, q]];
                let theta = 0.5 * (2.0 * apq).atan2(app - aqq);
                let c = theta.cos();
                let s = theta.sin();

                for i in 0..n {
                    let aip = a[[i, p]];
                    let aiq = a[[i, q]];
                    a[[i, p]] = c * aip + s * aiq;
                    a[[i, q]] = -s * aip + c * aiq;
                }
                for i in 0..n {
                    let api = a[[p, i]];
                    let aqi = a[[q, i]];
                    a[[p, i]] = c * api + s * aqi;
                    a[[q, i]] = -s * api + c * aqi;
                }
                // Zero explicitly; rounding otherwise leaves residue here
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for i in 0..n {
                    let vip = v[[i, p]];
                    let viq = v[[i, q]];
                    v[[i, p]] = c * vip + s * viq;
                    v[[i, q]] = -s * vip + c * viq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        a[[j, j]]
            .partial_cmp(&a[[i, i]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let eigenvalues: Vec<f64> = order.iter().map(|&i| a[[i, i]]).collect();
    let mut eigenvectors = Array2::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        for row in 0..n {
            eigenvectors[[row, dst]] = v[[row, src]];
        }
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                sum += a[[i, j]] * a[[i, j]];
            }
        }
    }
    sum.sqrt()
}
