//! Systematic pose error of the real arm and the desired (goal) pose.

use nalgebra::{Quaternion, Vector3};
use crate::dual_quaternion::{compose, from_axis_angle, from_rotation_translation, identity, inverse, normalize};
use crate::kinematic_traits::Pose;

/// Constant, unmodeled discrepancy between the nominal and the "real" end-effector pose.
/// The real pose is `nominal * error`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorModel {
    pub pose: Pose,
}

impl ErrorModel {
    pub fn new(pose: Pose) -> Self {
        ErrorModel { pose }
    }

    /// No error, real pose equals the nominal one.
    pub fn identity() -> Self {
        ErrorModel { pose: identity() }
    }

    /// Real pose for the given nominal pose.
    pub fn apply(&self, nominal: &Pose) -> Pose {
        compose(nominal, &self.pose)
    }

    /// Pose delta `inverse(nominal) * real`.
    pub fn delta(&self, nominal: &Pose) -> Pose {
        compose(&inverse(nominal), &self.apply(nominal))
    }

    /// Error with the real quaternion normalized, dual part unchanged.
    pub fn normalized(&self) -> Self {
        ErrorModel {
            pose: Pose::from_real_and_dual(normalize(&self.pose.real), self.pose.dual),
        }
    }
}

impl Default for ErrorModel {
    fn default() -> Self {
        ErrorModel::identity()
    }
}

/// Specification of the goal pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSpec {
    /// Position plus rotation by `angle` (radians) around `axis`.
    Pose {
        position: Vector3<f64>,
        axis: Vector3<f64>,
        angle: f64,
    },
    /// Dual quaternion given directly. The real part is normalized on resolution,
    /// the dual part is taken as is.
    DualQuaternion {
        real: Quaternion<f64>,
        dual: Quaternion<f64>,
    },
}

impl TargetSpec {
    /// Dual quaternion goal pose.
    pub fn resolve(&self) -> Pose {
        match self {
            TargetSpec::Pose { position, axis, angle } => {
                let rotation = from_axis_angle(axis, *angle);
                from_rotation_translation(&rotation, position)
            }
            TargetSpec::DualQuaternion { real, dual } => Pose::from_real_and_dual(normalize(real), *dual),
        }
    }

    /// Direct dual quaternion target equal to the given pose (for instance the current end-effector).
    pub fn from_pose(pose: &Pose) -> Self {
        TargetSpec::DualQuaternion {
            real: pose.real,
            dual: pose.dual,
        }
    }
}

impl Default for TargetSpec {
    /// Position (0.7, 0.2, 0.3), rotated 45° around z.
    fn default() -> Self {
        TargetSpec::Pose {
            position: Vector3::new(0.7, 0.2, 0.3),
            axis: Vector3::z(),
            angle: 45.0_f64.to_radians(),
        }
    }
}
