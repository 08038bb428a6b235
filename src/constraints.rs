use std::f64::consts::PI;
use crate::joint::{Joint, JointState};
use crate::kinematic_traits::{Joints, JOINT_COUNT};

/// Numeric range of every joint, in the unit of the joint (radians for rotational joints).
/// Joint increments computed by the controller are clamped into this range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    /// Lower limit
    pub from: Joints,

    /// Upper limit, never less than the lower limit
    pub to: Joints,
}

/// Default range of a prismatic joint
pub const PRISMATIC_RANGE: (f64, f64) = (-1.0, 1.0);

impl Constraints {
    /// Limits are sorted so that `from <= to` for every joint.
    pub fn new(from: Joints, to: Joints) -> Self {
        Constraints {
            from: std::array::from_fn(|i| from[i].min(to[i])),
            to: std::array::from_fn(|i| from[i].max(to[i])),
        }
    }

    /// No limits at all.
    pub fn unconstrained() -> Self {
        Constraints {
            from: [f64::NEG_INFINITY; JOINT_COUNT],
            to: [f64::INFINITY; JOINT_COUNT],
        }
    }

    /// ±π for rotational joints, [`PRISMATIC_RANGE`] for prismatic ones.
    pub fn for_joints(state: &JointState) -> Self {
        let range = |joint: &Joint| match joint {
            Joint::Rotational { .. } => (-PI, PI),
            Joint::Prismatic { .. } => PRISMATIC_RANGE,
        };
        Constraints {
            from: std::array::from_fn(|i| range(&state.joints[i]).0),
            to: std::array::from_fn(|i| range(&state.joints[i]).1),
        }
    }

    pub fn compliant(&self, qs: &Joints) -> bool {
        (0..JOINT_COUNT).all(|i| qs[i] >= self.from[i] && qs[i] <= self.to[i])
    }

    /// Clamps every coordinate into its range. If a lower limit was set above the upper one,
    /// the upper limit wins.
    pub fn clamp(&self, qs: &Joints) -> Joints {
        std::array::from_fn(|i| qs[i].max(self.from[i]).min(self.to[i]))
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints::for_joints(&JointState::default())
    }
}
