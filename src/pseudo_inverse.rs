//! Damped pseudo-inverse `J⁺ = Jᵀ (J Jᵀ + λI)⁻¹` of the Jacobian.
//!
//! The inverse is computed with Gauss-Jordan elimination with partial pivoting. If no pivot of
//! at least [`PIVOT_EPSILON`] can be found, the matrix is considered singular and the identity
//! matrix is used instead of its inverse. This substitution is silent for the caller, so results
//! close to kinematic singularities must be treated as unreliable.

use nalgebra::{Matrix4x6, Matrix6, SMatrix};
use tracing::warn;
use crate::kinematic_traits::JacobianMatrix;

/// Damping λ added to the diagonal of `J Jᵀ`
pub const DAMPING: f64 = 1e-6;

/// Pivots with the absolute value below this are treated as zero.
pub const PIVOT_EPSILON: f64 = 1e-8;

/// Gauss-Jordan inverse with partial pivoting (row with the largest absolute value in the pivot
/// column is swapped in). Returns `None` if the best pivot is below [`PIVOT_EPSILON`].
pub fn try_invert<const N: usize>(m: &SMatrix<f64, N, N>) -> Option<SMatrix<f64, N, N>> {
    let mut a = *m;
    let mut inverse = SMatrix::<f64, N, N>::identity();

    for col in 0..N {
        let mut pivot = col;
        for row in col + 1..N {
            if a[(row, col)].abs() > a[(pivot, col)].abs() {
                pivot = row;
            }
        }
        if a[(pivot, col)].abs() < PIVOT_EPSILON {
            return None;
        }
        a.swap_rows(col, pivot);
        inverse.swap_rows(col, pivot);

        let pivot_value = a[(col, col)];
        for c in 0..N {
            a[(col, c)] /= pivot_value;
            inverse[(col, c)] /= pivot_value;
        }

        for row in 0..N {
            if row == col {
                continue;
            }
            let factor = a[(row, col)];
            if factor == 0.0 {
                continue;
            }
            for c in 0..N {
                let da = factor * a[(col, c)];
                let di = factor * inverse[(col, c)];
                a[(row, c)] -= da;
                inverse[(row, c)] -= di;
            }
        }
    }
    Some(inverse)
}

/// Inverse of the matrix, or the identity matrix if the matrix is singular.
pub fn invert_or_identity<const N: usize>(m: &SMatrix<f64, N, N>) -> SMatrix<f64, N, N> {
    match try_invert(m) {
        Some(inverse) => inverse,
        None => {
            warn!("Singular {}x{} matrix, using identity instead of its inverse", N, N);
            SMatrix::<f64, N, N>::identity()
        }
    }
}

/// Damped pseudo-inverse with the default damping [`DAMPING`].
pub fn damped_pseudo_inverse(j: &JacobianMatrix) -> Matrix4x6<f64> {
    damped_pseudo_inverse_with(j, DAMPING)
}

/// Damped pseudo-inverse `Jᵀ (J Jᵀ + damping * I)⁻¹`.
pub fn damped_pseudo_inverse_with(j: &JacobianMatrix, damping: f64) -> Matrix4x6<f64> {
    let jt = j.transpose();
    let gram: Matrix6<f64> = j * jt + Matrix6::identity() * damping;
    jt * invert_or_identity(&gram)
}
