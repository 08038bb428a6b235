extern crate nalgebra as na;
use na::{Matrix4x6, Vector3};
use crate::chain::{forward_chain, KinematicChain};
use crate::joint::{Joint, JointState};
use crate::kinematic_traits::{JacobianMatrix, Joints, Twist, JOINT_COUNT};
use crate::pseudo_inverse::damped_pseudo_inverse;
use crate::utils::{joints_to_vector4, twist_from_parts, vector4_to_joints};

/// Struct representing the geometric Jacobian of the arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jacobian {
    /// A 6x4 matrix representing the Jacobian
    ///
    /// The Jacobian matrix maps the joint velocities to the end-effector twist.
    /// Each column corresponds to a joint. Rows 0..3 are the angular velocity,
    /// rows 3..6 the linear velocity of the end-effector.
    matrix: JacobianMatrix,
}

impl Jacobian {
    /// Constructs the Jacobian from the already computed kinematic chain of the given joint state.
    ///
    /// # Arguments
    ///
    /// * `state` - joint state the chain was computed from (provides joint types)
    /// * `chain` - forward kinematics of this state (world axes and positions)
    pub fn new(state: &JointState, chain: &KinematicChain) -> Self {
        Self { matrix: compute_jacobian(state, chain) }
    }

    /// Computes the chain and then the Jacobian for the joint state
    pub fn for_state(state: &JointState) -> Self {
        Self::new(state, &forward_chain(state))
    }

    pub fn from_matrix(matrix: JacobianMatrix) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &JacobianMatrix {
        &self.matrix
    }

    /// Column of the given joint as a twist `[angular; linear]`
    pub fn column(&self, joint: usize) -> Twist {
        self.matrix.column(joint).into_owned()
    }

    pub fn columns(&self) -> [Twist; JOINT_COUNT] {
        std::array::from_fn(|i| self.column(i))
    }

    /// Damped pseudo-inverse of the matrix, see [`crate::pseudo_inverse`].
    pub fn pseudo_inverse(&self) -> Matrix4x6<f64> {
        damped_pseudo_inverse(&self.matrix)
    }

    /// Computes the joint velocities required to achieve a desired end-effector twist
    ///
    /// # Arguments
    ///
    /// * `desired_twist` - 6D vector, angular velocity first, then linear velocity
    ///
    /// # Returns
    ///
    /// Joint velocities (`J⁺ · twist`). Near singular configurations the pseudo-inverse
    /// may be a fallback value, so the result is only meaningful away from singularities.
    pub fn velocities_from_vector(&self, desired_twist: &Twist) -> Joints {
        vector4_to_joints(self.pseudo_inverse() * desired_twist)
    }

    /// End-effector twist produced by the given joint velocities (`J · qdot`).
    pub fn twist(&self, velocities: &Joints) -> Twist {
        self.matrix * joints_to_vector4(*velocities)
    }
}

/// Column of a single joint:
/// rotational joint gives `[axis; axis × (end - joint)]`, prismatic `[0; axis]`.
fn joint_column(joint: &Joint, axis: &Vector3<f64>, joint_position: &Vector3<f64>,
                end_position: &Vector3<f64>) -> Twist {
    match joint {
        Joint::Rotational { .. } => twist_from_parts(axis, &axis.cross(&(end_position - joint_position))),
        Joint::Prismatic { .. } => twist_from_parts(&Vector3::zeros(), axis),
    }
}

/// Function to compute the analytic Jacobian matrix from world joint axes and positions.
///
/// Joint `i` sits at `chain.positions[i]` (the base for the first joint), the end-effector
/// at the last position of the chain.
pub fn compute_jacobian(state: &JointState, chain: &KinematicChain) -> JacobianMatrix {
    let mut jacobian = JacobianMatrix::zeros();
    let end_position = chain.end_effector_position();

    for (i, joint) in state.joints.iter().enumerate() {
        let column = joint_column(joint, &chain.world_axes[i], &chain.positions[i], &end_position);
        jacobian.fixed_view_mut::<6, 1>(0, i).copy_from(&column);
    }

    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointAxis;
    use crate::kinematic_traits::JOINTS_AT_ZERO;
    use crate::utils::{angular_part, linear_part};

    const SMALL: f64 = 1e-9;

    fn straight_arm() -> JointState {
        JointState::rrrp([0.6, 0.5, 0.4], [0.0; 3], 0.2,
                         [JointAxis::Z, JointAxis::Y, JointAxis::Y, JointAxis::X])
    }

    #[test]
    fn test_straight_arm_columns() {
        let jacobian = Jacobian::for_state(&straight_arm());
        // End-effector at (1.7, 0, 0)
        let c0 = jacobian.column(0);
        assert!((angular_part(&c0) - Vector3::z()).norm() < SMALL);
        assert!((linear_part(&c0) - Vector3::new(0.0, 1.7, 0.0)).norm() < SMALL);

        let c1 = jacobian.column(1);
        assert!((angular_part(&c1) - Vector3::y()).norm() < SMALL);
        assert!((linear_part(&c1) - Vector3::new(0.0, 0.0, -1.1)).norm() < SMALL);

        let c2 = jacobian.column(2);
        assert!((linear_part(&c2) - Vector3::new(0.0, 0.0, -0.6)).norm() < SMALL);

        let c3 = jacobian.column(3);
        assert_eq!(angular_part(&c3), Vector3::zeros());
        assert!((linear_part(&c3) - Vector3::x()).norm() < SMALL);
    }

    #[test]
    fn test_rows_are_angular_then_linear() {
        let jacobian = Jacobian::for_state(&straight_arm());
        let m = jacobian.matrix();
        assert!((m[(2, 0)] - 1.0).abs() < SMALL);
        assert!((m[(4, 0)] - 1.7).abs() < SMALL);
        assert!((m[(3, 3)] - 1.0).abs() < SMALL);
        assert_eq!(jacobian.columns()[1], jacobian.column(1));
        assert_eq!(jacobian.twist(&JOINTS_AT_ZERO), Twist::zeros());
    }

    #[test]
    fn test_velocities_reproduce_reachable_twist() {
        let state = JointState::default();
        let jacobian = Jacobian::for_state(&state);
        let qdot = [0.1, -0.2, 0.3, 0.05];
        let twist = jacobian.twist(&qdot);
        let recovered = jacobian.velocities_from_vector(&twist);
        for i in 0..JOINT_COUNT {
            assert!((recovered[i] - qdot[i]).abs() < 1e-4, "joint {}: {} vs {}", i, recovered[i], qdot[i]);
        }
    }

    #[test]
    fn test_degenerate_jacobian_gives_zero_velocities() {
        let jacobian = Jacobian::from_matrix(JacobianMatrix::zeros());
        let twist = Twist::new(1.0, 0.0, 0.0, 0.0, 2.0, 0.0);
        assert_eq!(jacobian.velocities_from_vector(&twist), JOINTS_AT_ZERO);
    }
}
