//! Forward kinematics of the serial chain.
//!
//! Joints are processed in order, starting from the world origin with the identity orientation.
//! For every joint the local axis is first expressed in the current world orientation (this
//! world axis is what the Jacobian uses), then the joint transform is applied:
//! - rotational joint: rotation around the local axis, the link of the given length runs along
//!   the local x direction and is rotated together with the joint,
//! - prismatic joint: no rotation, translation along the local axis.
//!
//! The end-effector pose is the product of the per-joint dual quaternions.

use nalgebra::{Quaternion, Vector3};
use crate::dual_quaternion::{compose, from_axis_angle, from_rotation_translation, identity, rotate_vector, translation};
use crate::joint::{Joint, JointState};
use crate::kinematic_traits::{Pose, JOINT_COUNT};

/// Local transform of one joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTransform {
    pub rotation: Quaternion<f64>,
    pub translation: Vector3<f64>,
    /// Dual quaternion built from rotation and translation
    pub pose: Pose,
}

/// Result of the forward kinematics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicChain {
    /// Joint axes in joint local frames
    pub local_axes: [Vector3<f64>; JOINT_COUNT],

    /// Joint axes in the world frame
    pub world_axes: [Vector3<f64>; JOINT_COUNT],

    /// World positions: base (joint 1) first, end-effector last.
    pub positions: [Vector3<f64>; JOINT_COUNT + 1],

    /// World orientations matching `positions`.
    pub rotations: [Quaternion<f64>; JOINT_COUNT + 1],

    /// Local transform of every joint
    pub joint_transforms: [JointTransform; JOINT_COUNT],

    /// `partial_products[i]` is the product of joint transforms `0..=i`.
    pub partial_products: [Pose; JOINT_COUNT],
}

impl KinematicChain {
    /// Pose of the end-effector
    pub fn end_effector(&self) -> Pose {
        self.partial_products[JOINT_COUNT - 1]
    }

    /// Product of the first two joint transforms
    pub fn x12(&self) -> Pose {
        self.partial_products[1]
    }

    /// Product of the first three joint transforms
    pub fn x123(&self) -> Pose {
        self.partial_products[2]
    }

    /// End-effector position as accumulated from the world-frame segments.
    pub fn end_effector_position(&self) -> Vector3<f64> {
        self.positions[JOINT_COUNT]
    }
}

/// Computes the complete kinematic chain for the given joint state.
pub fn forward_chain(state: &JointState) -> KinematicChain {
    let mut local_axes = [Vector3::zeros(); JOINT_COUNT];
    let mut world_axes = [Vector3::zeros(); JOINT_COUNT];
    let mut positions = [Vector3::zeros(); JOINT_COUNT + 1];
    let mut rotations = [Quaternion::identity(); JOINT_COUNT + 1];
    let mut joint_transforms = [JointTransform {
        rotation: Quaternion::identity(),
        translation: Vector3::zeros(),
        pose: identity(),
    }; JOINT_COUNT];
    let mut partial_products = [identity(); JOINT_COUNT];

    let mut position = Vector3::zeros();
    let mut orientation = Quaternion::identity();
    let mut product = identity();

    for (i, joint) in state.joints.iter().enumerate() {
        let local_axis = joint.axis().unit_vector();
        local_axes[i] = local_axis;
        world_axes[i] = rotate_vector(&orientation, &local_axis);

        let (rotation, offset) = match *joint {
            Joint::Rotational { angle, link, .. } => {
                let rotation = from_axis_angle(&local_axis, angle);
                (rotation, rotate_vector(&rotation, &Vector3::new(link, 0.0, 0.0)))
            }
            // No own rotation, so the recorded transform is a pure translation
            Joint::Prismatic { displacement, .. } => (Quaternion::identity(), local_axis * displacement),
        };

        position += rotate_vector(&orientation, &offset);
        orientation = orientation * rotation;
        positions[i + 1] = position;
        rotations[i + 1] = orientation;

        let pose = from_rotation_translation(&rotation, &offset);
        joint_transforms[i] = JointTransform { rotation, translation: offset, pose };
        product = compose(&product, &pose);
        partial_products[i] = product;
    }

    KinematicChain {
        local_axes,
        world_axes,
        positions,
        rotations,
        joint_transforms,
        partial_products,
    }
}

/// End-effector pose for the given joint state.
pub fn forward(state: &JointState) -> Pose {
    forward_chain(state).end_effector()
}

/// End-effector translation for the given joint state.
pub fn forward_translation(state: &JointState) -> Vector3<f64> {
    translation(&forward(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointAxis;
    use std::f64::consts::FRAC_PI_2;

    const SMALL: f64 = 1e-9;

    #[test]
    fn test_straight_arm() {
        let state = JointState::rrrp([0.6, 0.5, 0.4], [0.0; 3], 0.2,
                                     [JointAxis::Z, JointAxis::Y, JointAxis::Y, JointAxis::X]);
        let chain = forward_chain(&state);
        let expected = [0.0, 0.6, 1.1, 1.5, 1.7];
        for (i, x) in expected.iter().enumerate() {
            assert!((chain.positions[i] - Vector3::new(*x, 0.0, 0.0)).norm() < SMALL,
                    "position {} is {:?}", i, chain.positions[i]);
        }
        assert!((translation(&chain.end_effector()) - Vector3::new(1.7, 0.0, 0.0)).norm() < SMALL);
    }

    #[test]
    fn test_world_axes_follow_orientation() {
        // First joint turns 90° around z, so the local y axis of the second joint points to -x.
        let state = JointState::rrrp([1.0, 1.0, 1.0], [FRAC_PI_2, 0.0, 0.0], 0.0,
                                     [JointAxis::Z, JointAxis::Y, JointAxis::Y, JointAxis::X]);
        let chain = forward_chain(&state);
        assert!((chain.world_axes[0] - Vector3::z()).norm() < SMALL);
        assert!((chain.world_axes[1] - Vector3::new(-1.0, 0.0, 0.0)).norm() < SMALL);
        assert!((chain.world_axes[3] - Vector3::y()).norm() < SMALL);
        assert!((chain.positions[1] - Vector3::new(0.0, 1.0, 0.0)).norm() < SMALL);
        assert_eq!(chain.local_axes[1], Vector3::y());
    }

    #[test]
    fn test_end_effector_matches_segment_sum() {
        let state = JointState::default();
        let chain = forward_chain(&state);
        assert!((translation(&chain.end_effector()) - chain.end_effector_position()).norm() < SMALL);
        let rotation = chain.end_effector().real;
        let last = chain.rotations[JOINT_COUNT];
        assert!((rotation - last).norm() < SMALL);
    }

    #[test]
    fn test_partial_products() {
        let chain = forward_chain(&JointState::default());
        let x12 = compose(&chain.joint_transforms[0].pose, &chain.joint_transforms[1].pose);
        assert_eq!(chain.x12(), x12);
        let x123 = compose(&x12, &chain.joint_transforms[2].pose);
        assert_eq!(chain.x123(), x123);
        assert!((translation(&chain.x123()) - chain.positions[3]).norm() < SMALL);
        assert_eq!(chain.joint_transforms[3].rotation, Quaternion::identity());
    }

    #[test]
    fn test_forward_is_deterministic() {
        let state = JointState::default();
        let first = forward(&state);
        for _ in 0..5 {
            assert_eq!(forward(&state), first);
        }
        assert_eq!(state, JointState::default());
    }
}
