//! Joints of the serial arm and the joint state the kinematics is computed from.

use nalgebra::Vector3;
use crate::constraints::Constraints;
use crate::dual_quaternion::normalize_vector;
use crate::kinematic_traits::{Joints, JOINT_COUNT};
use tracing::debug;

/// Axis of the joint, expressed in the local frame of the joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointAxis {
    X,
    Y,
    Z,
    /// Arbitrary direction, normalized when used. Zero vector falls back to x.
    Custom(Vector3<f64>),
}

impl JointAxis {
    /// Unit vector of this axis.
    pub fn unit_vector(&self) -> Vector3<f64> {
        match self {
            JointAxis::X => Vector3::x(),
            JointAxis::Y => Vector3::y(),
            JointAxis::Z => Vector3::z(),
            JointAxis::Custom(v) => normalize_vector(v),
        }
    }
}

/// Joint of the arm, carrying its current coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Joint {
    /// Rotates by `angle` (radians) around `axis`. The following link of the length `link`
    /// extends along the local x direction and is carried by this rotation.
    Rotational { angle: f64, axis: JointAxis, link: f64 },
    /// Moves by `displacement` along `axis`.
    Prismatic { displacement: f64, axis: JointAxis },
}

impl Joint {
    pub fn rotational(angle: f64, axis: JointAxis, link: f64) -> Self {
        Joint::Rotational { angle, axis, link }
    }

    pub fn prismatic(displacement: f64, axis: JointAxis) -> Self {
        Joint::Prismatic { displacement, axis }
    }

    /// Angle (radians) for rotational joint, displacement for prismatic one.
    pub fn coordinate(&self) -> f64 {
        match *self {
            Joint::Rotational { angle, .. } => angle,
            Joint::Prismatic { displacement, .. } => displacement,
        }
    }

    pub fn set_coordinate(&mut self, value: f64) {
        match self {
            Joint::Rotational { angle, .. } => *angle = value,
            Joint::Prismatic { displacement, .. } => *displacement = value,
        }
    }

    pub fn axis(&self) -> JointAxis {
        match *self {
            Joint::Rotational { axis, .. } | Joint::Prismatic { axis, .. } => axis,
        }
    }

    pub fn set_axis(&mut self, value: JointAxis) {
        match self {
            Joint::Rotational { axis, .. } | Joint::Prismatic { axis, .. } => *axis = value,
        }
    }

    pub fn is_rotational(&self) -> bool {
        matches!(self, Joint::Rotational { .. })
    }
}

/// Complete configuration of the arm: joint types, axes, link lengths and current coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointState {
    pub joints: [Joint; JOINT_COUNT],
}

impl JointState {
    pub fn new(joints: [Joint; JOINT_COUNT]) -> Self {
        JointState { joints }
    }

    /// Three rotational joints followed by a prismatic one, the layout of the reference arm.
    /// Angles are in radians.
    pub fn rrrp(links: [f64; 3], angles: [f64; 3], displacement: f64, axes: [JointAxis; JOINT_COUNT]) -> Self {
        JointState {
            joints: [
                Joint::rotational(angles[0], axes[0], links[0]),
                Joint::rotational(angles[1], axes[1], links[1]),
                Joint::rotational(angles[2], axes[2], links[2]),
                Joint::prismatic(displacement, axes[3]),
            ],
        }
    }

    /// Link lengths of the rotational joints, 0 for prismatic ones.
    pub fn links(&self) -> Joints {
        std::array::from_fn(|i| match self.joints[i] {
            Joint::Rotational { link, .. } => link,
            Joint::Prismatic { .. } => 0.0,
        })
    }

    /// Current coordinates of all joints.
    pub fn coordinates(&self) -> Joints {
        std::array::from_fn(|i| self.joints[i].coordinate())
    }

    pub fn set_coordinates(&mut self, qs: &Joints) {
        for (joint, &q) in self.joints.iter_mut().zip(qs.iter()) {
            joint.set_coordinate(q);
        }
    }

    /// Adds the increment to the joint coordinates, clamping each into its range.
    pub fn apply_increment(&mut self, delta: &Joints, constraints: &Constraints) {
        let current = self.coordinates();
        let moved: Joints = std::array::from_fn(|i| current[i] + delta[i]);
        if !constraints.compliant(&moved) {
            debug!("Joint increment clamped into range: {:?}", moved);
        }
        self.set_coordinates(&constraints.clamp(&moved));
    }
}

impl Default for JointState {
    /// Reference arm: links 0.6, 0.5, 0.4; 30° about z, -20° about y, 40° about y, 0.2 along x.
    fn default() -> Self {
        JointState::rrrp(
            [0.6, 0.5, 0.4],
            [30.0_f64.to_radians(), (-20.0_f64).to_radians(), 40.0_f64.to_radians()],
            0.2,
            [JointAxis::Z, JointAxis::Y, JointAxis::Y, JointAxis::X],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_axis_is_normalized() {
        let axis = JointAxis::Custom(Vector3::new(0.0, 3.0, 4.0));
        assert!((axis.unit_vector() - Vector3::new(0.0, 0.6, 0.8)).norm() < 1e-12);
        assert_eq!(JointAxis::Custom(Vector3::zeros()).unit_vector(), Vector3::x());
    }

    #[test]
    fn test_coordinates() {
        let mut state = JointState::default();
        let qs = state.coordinates();
        assert!((qs[0] - 30.0_f64.to_radians()).abs() < 1e-12);
        assert_eq!(qs[3], 0.2);
        state.set_coordinates(&[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(state.coordinates(), [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(state.links(), [0.6, 0.5, 0.4, 0.0]);
        assert!(state.joints[2].is_rotational());
        assert!(!state.joints[3].is_rotational());
    }

    #[test]
    fn test_increment_is_clamped() {
        let mut state = JointState::default();
        let constraints = Constraints::new([-0.1, -1.0, -1.0, 0.0], [0.6, 1.0, 1.0, 0.25]);
        state.apply_increment(&[1.0, 0.1, 0.0, 0.5], &constraints);
        let qs = state.coordinates();
        assert_eq!(qs[0], 0.6);
        assert!((qs[1] - ((-20.0_f64).to_radians() + 0.1)).abs() < 1e-12);
        assert_eq!(qs[3], 0.25);
    }
}
