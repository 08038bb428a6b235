//! Forward kinematics, geometric Jacobian and resolved-rate control of a four-axis serial arm
//! (three rotational joints and one prismatic joint), with dual quaternions as the only pose
//! representation.
//!
//! # Features
//!
//! - Forward kinematics as a sequential product of per-joint dual quaternions, keeping all
//!   intermediate positions, orientations, world axes and partial products.
//! - Constant pose error model ("real" pose = nominal pose composed with the error) and the
//!   target given either as position + axis-angle or directly as a dual quaternion.
//! - Pose trajectories from the captured base pose to the target, either as a linear blend of the
//!   dual quaternions or geometric (slerp of rotation, linear translation).
//! - Analytic 6x4 Jacobian and its damped pseudo-inverse `Jᵀ (J Jᵀ + λI)⁻¹`.
//! - Resolved-rate controller with the first order dual quaternion error and trajectory feedforward.
//! - Iteration driver with single steps, a cancellable periodic run loop (optionally on its own
//!   thread), convergence detection and a bounded error history.
//! - Finite difference verification of the Jacobian.
//! - Scenarios (all inputs) can be read from YAML (feature `allow_filesystem`).
//!
//! # Numeric fallbacks
//!
//! The numeric core never fails. Degenerate inputs resolve to fixed values: zero vectors normalize
//! to the x axis, zero quaternions to the identity, and a singular `J Jᵀ + λI` is replaced by the
//! identity matrix. Results close to kinematic singularities must be treated as unreliable.
//!
//! # Example
//!
//! ```
//! use rs_dq_kinematics::iteration::IterationDriver;
//! use rs_dq_kinematics::parameters::Scenario;
//!
//! let mut scenario = Scenario::default();
//! let mut driver = IterationDriver::new();
//! let result = driver.step(&mut scenario);
//! println!("|õ| = {}, |t̃| = {}",
//!          result.control.orientation_error_norm, result.control.translation_error_norm);
//! ```

pub mod kinematic_traits;
pub mod dual_quaternion;
pub mod joint;
pub mod constraints;
pub mod chain;
pub mod target;
pub mod trajectory;
pub mod jacobian;
pub mod pseudo_inverse;
pub mod controller;
pub mod kinematics_impl;
pub mod iteration;
pub mod verification;

pub mod parameters;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;

#[cfg(feature = "allow_filesystem")]
pub mod parameter_error;

pub mod utils;

#[cfg(test)]
#[cfg(feature = "allow_filesystem")]
mod tests;
