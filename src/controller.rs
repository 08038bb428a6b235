//! Resolved-rate control law on dual quaternions.
//!
//! The pose error is `x̃ = inverse(desired) * real`. Instead of the logarithm of `x̃` the
//! controller uses the first order surrogate `z̃ = 1 - x̃`, which is only meaningful while
//! `x̃` stays close to the identity. The task space command
//!
//! ```text
//! u = [ κo·õ + ω' ; -κt·t̃ + v' ]
//! ```
//!
//! combines the error with the trajectory feedforward twist `[ω'; v']` transported into the
//! error frame, and is mapped to joint velocities through the damped pseudo-inverse.

use nalgebra::Vector3;
use tracing::debug;
use crate::dual_quaternion::{compose, difference, identity, inverse, rotate_vector, translation};
use crate::jacobian::Jacobian;
use crate::kinematic_traits::{Joints, Pose, Twist};
use crate::trajectory::Trajectory;
use crate::utils::{angular_part, linear_part, twist_from_parts, vector4_to_joints};

/// Controller gains. Each channel has two gains, the proportional gain of the channel is
/// `1/γ1² + 1/γ2²` where a non-positive gain contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    /// γo1, γo2
    pub orientation: [f64; 2],
    /// γt1, γt2
    pub translation: [f64; 2],
}

fn inverse_square(gain: f64) -> f64 {
    if gain <= 0.0 {
        0.0
    } else {
        1.0 / (gain * gain)
    }
}

impl Gains {
    pub fn new(orientation: [f64; 2], translation: [f64; 2]) -> Self {
        Gains { orientation, translation }
    }

    /// κo
    pub fn kappa_orientation(&self) -> f64 {
        self.orientation.iter().map(|g| inverse_square(*g)).sum()
    }

    /// κt
    pub fn kappa_translation(&self) -> f64 {
        self.translation.iter().map(|g| inverse_square(*g)).sum()
    }

    /// The largest of the four gains
    pub fn gamma(&self) -> f64 {
        self.orientation.iter().chain(self.translation.iter())
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl Default for Gains {
    fn default() -> Self {
        Gains {
            orientation: [2.0, 2.0],
            translation: [2.0, 2.0],
        }
    }
}

/// Everything the control law computes, including intermediate quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub kappa_orientation: f64,
    pub kappa_translation: f64,
    pub gamma: f64,

    /// x̃, the pose error
    pub x_tilde: Pose,
    /// z̃ = 1 - x̃
    pub z_tilde: Pose,

    /// õ, vector part of the real quaternion of z̃
    pub orientation_error: Vector3<f64>,
    /// t̃
    pub translation_error: Vector3<f64>,

    /// Feedforward twist estimated from the trajectory
    pub feedforward: Twist,
    /// Feedforward twist transported into the frame of x̃
    pub transported_feedforward: Twist,

    /// κo·õ
    pub orientation_term: Vector3<f64>,
    /// -κt·t̃
    pub translation_term: Vector3<f64>,

    /// Task space command
    pub u: Twist,
    /// Joint velocities `J⁺ · u`
    pub qdot: Joints,
    /// Joint increment for one step, `qdot · dt`
    pub increment: Joints,

    pub orientation_error_norm: f64,
    pub translation_error_norm: f64,
}

impl ControlOutput {
    /// True if both error norms are below the tolerance.
    pub fn is_converged(&self, tolerance: f64) -> bool {
        self.orientation_error_norm < tolerance && self.translation_error_norm < tolerance
    }
}

/// Transports the twist by the pose `x`: the angular part is rotated by the rotation of `x`,
/// the linear part is rotated as well and gets `translation(x) × ω` added.
pub fn transport_twist(x: &Pose, twist: &Twist) -> Twist {
    let angular = rotate_vector(&x.real, &angular_part(twist));
    let linear = rotate_vector(&x.real, &linear_part(twist)) + translation(x).cross(&angular);
    twist_from_parts(&angular, &linear)
}

/// Pose error vectors (õ, t̃) and the surrogate z̃ for the given x̃.
/// t̃ is `-2 · translation(z̃ * (1 - z̃))`.
pub fn error_vectors(x_tilde: &Pose) -> (Pose, Vector3<f64>, Vector3<f64>) {
    let one = identity();
    let z_tilde = difference(&one, x_tilde);
    let orientation_error = z_tilde.real.imag();
    let translation_error = translation(&compose(&z_tilde, &difference(&one, &z_tilde))) * -2.0;
    (z_tilde, orientation_error, translation_error)
}

/// Evaluates the control law.
///
/// # Arguments
///
/// * `jacobian` - Jacobian at the current configuration
/// * `real` - current (error injected) end-effector pose
/// * `desired` - desired pose, normally the active trajectory sample
/// * `trajectory` - trajectory providing the feedforward twist at its active index
/// * `gains` - controller gains
/// * `dt` - time step used to convert velocities into increments
pub fn compute_control(jacobian: &Jacobian, real: &Pose, desired: &Pose, trajectory: &Trajectory,
                       gains: &Gains, dt: f64) -> ControlOutput {
    let x_tilde = compose(&inverse(desired), real);
    let (z_tilde, orientation_error, translation_error) = error_vectors(&x_tilde);

    let feedforward = trajectory.feedforward_twist();
    let transported_feedforward = transport_twist(&x_tilde, &feedforward);

    let kappa_orientation = gains.kappa_orientation();
    let kappa_translation = gains.kappa_translation();

    let orientation_term = orientation_error * kappa_orientation;
    let translation_term = translation_error * -kappa_translation;
    let u = twist_from_parts(
        &(orientation_term + angular_part(&transported_feedforward)),
        &(translation_term + linear_part(&transported_feedforward)),
    );

    let qdot_vector = jacobian.pseudo_inverse() * u;
    let qdot = vector4_to_joints(qdot_vector);
    let increment = vector4_to_joints(qdot_vector * dt);

    let output = ControlOutput {
        kappa_orientation,
        kappa_translation,
        gamma: gains.gamma(),
        x_tilde,
        z_tilde,
        orientation_error,
        translation_error,
        feedforward,
        transported_feedforward,
        orientation_term,
        translation_term,
        u,
        qdot,
        increment,
        orientation_error_norm: orientation_error.norm(),
        translation_error_norm: translation_error.norm(),
    };
    debug!(
        "control: |õ| = {:.6}, |t̃| = {:.6}, qdot = {:?}",
        output.orientation_error_norm, output.translation_error_norm, output.qdot
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual_quaternion::{from_axis_angle, from_rotation_translation};
    use crate::joint::JointState;
    use crate::target::ErrorModel;
    use crate::trajectory::TrajectoryOptions;
    use crate::chain::forward;

    const SMALL: f64 = 1e-9;

    #[test]
    fn test_kappa() {
        let gains = Gains::default();
        assert!((gains.kappa_orientation() - 0.5).abs() < SMALL);
        assert!((gains.kappa_translation() - 0.5).abs() < SMALL);
        assert_eq!(gains.gamma(), 2.0);

        let gains = Gains::new([1.0, 0.0], [-3.0, 0.5]);
        assert!((gains.kappa_orientation() - 1.0).abs() < SMALL);
        assert!((gains.kappa_translation() - 4.0).abs() < SMALL);
        assert_eq!(gains.gamma(), 1.0);
    }

    #[test]
    fn test_transport_by_identity() {
        let twist = Twist::new(0.1, 0.2, 0.3, 0.4, 0.5, 0.6);
        assert!((transport_twist(&identity(), &twist) - twist).norm() < SMALL);
    }

    #[test]
    fn test_transport_adds_moment() {
        // Pure translation by (1, 0, 0), rotation about z: v gains t × ω = (0, -1, 0)
        let x = from_rotation_translation(&from_axis_angle(&Vector3::z(), 0.0), &Vector3::new(1.0, 0.0, 0.0));
        let twist = Twist::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0);
        let transported = transport_twist(&x, &twist);
        assert!((linear_part(&transported) - Vector3::new(0.0, -1.0, 0.0)).norm() < SMALL);
        assert!((angular_part(&transported) - Vector3::z()).norm() < SMALL);
    }

    #[test]
    fn test_zero_error() {
        let (z_tilde, o, t) = error_vectors(&identity());
        assert_eq!(z_tilde.real.norm(), 0.0);
        assert_eq!(o, Vector3::zeros());
        assert_eq!(t, Vector3::zeros());
    }

    #[test]
    fn test_orientation_error_of_small_rotation() {
        let angle = 0.02;
        let x_tilde = from_rotation_translation(&from_axis_angle(&Vector3::y(), angle), &Vector3::zeros());
        let (_, o, t) = error_vectors(&x_tilde);
        // õ = -sin(θ/2) n
        assert!((o - Vector3::new(0.0, -(angle / 2.0).sin(), 0.0)).norm() < SMALL);
        assert!(t.norm() < SMALL);
    }

    #[test]
    fn test_control_at_desired_pose_is_zero() {
        let state = JointState::default();
        let pose = forward(&state);
        let options = TrajectoryOptions::default();
        let trajectory = Trajectory::build(&pose, &pose, &ErrorModel::identity(), &options);
        let jacobian = Jacobian::for_state(&state);
        let control = compute_control(&jacobian, &pose, &pose, &trajectory, &Gains::default(), 0.05);
        assert!(control.orientation_error_norm < SMALL);
        assert!(control.translation_error_norm < SMALL);
        assert!(control.feedforward.norm() < SMALL);
        for q in control.increment {
            assert!(q.abs() < SMALL);
        }
        assert!(control.is_converged(0.01));
    }

    #[test]
    fn test_increment_is_scaled_velocity() {
        let state = JointState::default();
        let real = forward(&state);
        let desired = compose(&real, &from_rotation_translation(&from_axis_angle(&Vector3::x(), 0.05),
                                                                &Vector3::new(0.01, 0.0, 0.02)));
        let trajectory = Trajectory::build(&real, &desired, &ErrorModel::identity(),
                                           &TrajectoryOptions::default());
        let jacobian = Jacobian::for_state(&state);
        let dt = 0.1;
        let control = compute_control(&jacobian, &real, &desired, &trajectory, &Gains::default(), dt);
        for i in 0..4 {
            assert!((control.increment[i] - control.qdot[i] * dt).abs() < SMALL);
        }
        assert!(control.orientation_error_norm > 0.0);
        let expected_u = control.orientation_term + angular_part(&control.transported_feedforward);
        assert!((angular_part(&control.u) - expected_u).norm() < SMALL);
        assert!((control.translation_term + control.translation_error * control.kappa_translation).norm() < SMALL);
    }
}
