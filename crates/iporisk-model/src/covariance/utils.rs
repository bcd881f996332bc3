//! Symmetric matrix utilities
//!
//! Jacobi eigendecomposition and the eigen-based inverse used to turn a
//! sample covariance matrix into a Mahalanobis metric.

use crate::error::{Result, RiskError};
use ndarray::{Array1, Array2};

/// Off-diagonal tolerance for [`invert_symmetric`], relative to the matrix scale.
const JACOBI_RELATIVE_TOLERANCE: f64 = 1e-13;

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_iterations` - Maximum number of rotations
/// * `tolerance` - Convergence tolerance for off-diagonal elements
///
/// # Errors
/// * [`RiskError::NoConvergence`] if an off-diagonal element is still at or
///   above `tolerance` after `max_iterations` rotations
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<EigenDecomposition> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(RiskError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    // A 1x1 matrix is already diagonal
    if n > 1 {
        let mut converged = false;
        for _iter in 0..max_iterations {
            let (p, q, max_val) = find_largest_off_diagonal(&a);
            if max_val.abs() < tolerance {
                converged = true;
                break;
            }

            let (cos_theta, sin_theta) = compute_rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
            apply_jacobi_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
        }
        if !converged && find_largest_off_diagonal(&a).2.abs() >= tolerance {
            return Err(RiskError::NoConvergence {
                iterations: max_iterations,
            });
        }
    }

    let eigenvalues: Array1<f64> = a.diag().to_owned();

    // Sort eigenvalues and eigenvectors in descending order
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| eigenvalues[j].total_cmp(&eigenvalues[i]));

    let sorted_eigenvalues = indices.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        sorted_eigenvectors
            .column_mut(new_idx)
            .assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues: sorted_eigenvalues,
        eigenvectors: sorted_eigenvectors,
    })
}

/// Invert a symmetric positive definite matrix through its eigendecomposition
///
/// Σ⁻¹ = V Λ⁻¹ Vᵀ
///
/// Returns `None` when the matrix is singular: the largest eigenvalue is not
/// positive, or the smallest is at most `singular_tolerance` times the
/// largest. Off-diagonal convergence is measured relative to the largest
/// entry of `matrix`.
pub fn invert_symmetric(
    matrix: &Array2<f64>,
    singular_tolerance: f64,
    max_iterations: usize,
) -> Result<Option<Array2<f64>>> {
    let scale = matrix.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if scale == 0.0 {
        return Ok(None);
    }

    let decomp = jacobi_eigendecomp(matrix, max_iterations, JACOBI_RELATIVE_TOLERANCE * scale)?;
    let n = decomp.eigenvalues.len();
    if n == 0 {
        return Ok(None);
    }

    let max_eig = decomp.eigenvalues[0];
    let min_eig = decomp.eigenvalues[n - 1];
    if max_eig <= 0.0 || min_eig <= singular_tolerance * max_eig {
        return Ok(None);
    }

    let inverted = decomp.eigenvalues.mapv(|v| 1.0 / v);
    reconstruct_from_eigen(&inverted, &decomp.eigenvectors).map(Some)
}

/// Find the largest off-diagonal element in a symmetric matrix (n >= 2)
fn find_largest_off_diagonal(matrix: &Array2<f64>) -> (usize, usize, f64) {
    let n = matrix.nrows();
    let mut max_val = 0.0;
    let mut p = 0;
    let mut q = 1;

    for i in 0..n {
        for j in (i + 1)..n {
            let val = matrix[[i, j]].abs();
            if val > max_val {
                max_val = val;
                p = i;
                q = j;
            }
        }
    }

    (p, q, matrix[[p, q]])
}

/// Compute the rotation (cos, sin) that zeroes `apq`
fn compute_rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq.abs() < 1e-300 {
        return (1.0, 0.0);
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };

    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    let sin_theta = t * cos_theta;

    (cos_theta, sin_theta)
}

/// Apply a Jacobi rotation to matrix A and eigenvector matrix V
fn apply_jacobi_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    cos_theta: f64,
    sin_theta: f64,
) {
    let n = a.nrows();

    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = cos_theta * cos_theta * app - 2.0 * cos_theta * sin_theta * apq
        + sin_theta * sin_theta * aqq;
    a[[q, q]] = sin_theta * sin_theta * app
        + 2.0 * cos_theta * sin_theta * apq
        + cos_theta * cos_theta * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];

            a[[i, p]] = cos_theta * aip - sin_theta * aiq;
            a[[p, i]] = a[[i, p]];

            a[[i, q]] = sin_theta * aip + cos_theta * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];

        v[[i, p]] = cos_theta * vip - sin_theta * viq;
        v[[i, q]] = sin_theta * vip + cos_theta * viq;
    }
}

/// Reconstruct M = V Λ Vᵀ from eigenvalues and eigenvectors
fn reconstruct_from_eigen(
    eigenvalues: &Array1<f64>,
    eigenvectors: &Array2<f64>,
) -> Result<Array2<f64>> {
    let n = eigenvalues.len();
    if eigenvectors.nrows() != n || eigenvectors.ncols() != n {
        return Err(RiskError::DimensionMismatch {
            expected: n,
            actual: eigenvectors.nrows(),
        });
    }

    let mut v_lambda = eigenvectors.clone();
    for (j, mut column) in v_lambda.columns_mut().into_iter().enumerate() {
        column *= eigenvalues[j];
    }

    Ok(v_lambda.dot(&eigenvectors.t()))
}
