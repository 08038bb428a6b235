//! Finite difference check of the analytic Jacobian.

use std::fmt;
use rayon::prelude::*;
use crate::chain::forward;
use crate::dual_quaternion::{compose, inverse, to_axis_angle, translation};
use crate::jacobian::Jacobian;
use crate::joint::JointState;
use crate::kinematic_traits::{JacobianMatrix, Twist, JOINT_COUNT};
use crate::utils::twist_from_parts;

/// Perturbation of a single joint coordinate (radians for rotational joints).
pub const FINITE_DIFFERENCE_STEP: f64 = 1e-3;

/// Result of comparing the analytic Jacobian with the finite difference one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobianVerification {
    pub numeric: JacobianMatrix,
    pub analytic: JacobianMatrix,
    /// Euclidean norm of the difference, per column
    pub column_errors: [f64; JOINT_COUNT],
    pub average_error: f64,
}

impl fmt::Display for JacobianVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "avg error: {:.4}", self.average_error)
    }
}

/// Numeric column of one joint: the pose change caused by moving only this joint by `step`.
/// The relative rotation `moved * inverse(base)` is converted to axis-angle, both parts are
/// divided by the step.
fn numeric_column(state: &JointState, joint: usize, step: f64) -> Twist {
    let base = forward(state);
    let mut perturbed = *state;
    let value = perturbed.joints[joint].coordinate();
    perturbed.joints[joint].set_coordinate(value + step);
    let moved = forward(&perturbed);

    let delta = compose(&moved, &inverse(&base));
    let (axis, angle) = to_axis_angle(&delta.real);
    let linear = (translation(&moved) - translation(&base)) / step;
    twist_from_parts(&(axis * (angle / step)), &linear)
}

/// Finite difference Jacobian. Columns are computed in parallel, each on its own copy
/// of the joint state, so the given state is never modified.
pub fn numeric_jacobian(state: &JointState, step: f64) -> JacobianMatrix {
    let columns: Vec<Twist> = (0..JOINT_COUNT).into_par_iter()
        .map(|i| numeric_column(state, i, step))
        .collect();

    let mut jacobian = JacobianMatrix::zeros();
    for (i, column) in columns.iter().enumerate() {
        jacobian.fixed_view_mut::<6, 1>(0, i).copy_from(column);
    }
    jacobian
}

/// Compares the analytic Jacobian of the state with the finite difference estimate.
pub fn verify_jacobian(state: &JointState) -> JacobianVerification {
    let analytic = *Jacobian::for_state(state).matrix();
    let numeric = numeric_jacobian(state, FINITE_DIFFERENCE_STEP);
    let column_errors: [f64; JOINT_COUNT] =
        std::array::from_fn(|i| (numeric.column(i) - analytic.column(i)).norm());
    let average_error = column_errors.iter().sum::<f64>() / JOINT_COUNT as f64;

    JacobianVerification {
        numeric,
        analytic,
        column_errors,
        average_error,
    }
}
