//! Quaternion and dual quaternion algebra used by the kinematic chain and the controller.
//!
//! Quaternions are `nalgebra::Quaternion<f64>` (Hamilton product, scalar first in
//! `Quaternion::new(w, x, y, z)`), rigid transforms are [`Pose`] (`nalgebra::DualQuaternion<f64>`).
//! All operations are free functions so that the numeric fallbacks stay visible:
//! - a vector shorter than [`EPSILON`] normalizes to the x axis `(1, 0, 0)`,
//! - a quaternion with the norm below [`EPSILON`] normalizes to the identity.
//!
//! These fallbacks cannot be told apart from a regular result by the caller.
//!
//! The dual part of a pose is only physically consistent (`0.5 * (0, t) * real`) if the pose has been
//! built with [`from_rotation_translation`] or composed from such poses. Blending ([`lerp_pose`]) and
//! component-wise arithmetic ([`difference`], [`scale`]) break this relation and nothing restores it.

use nalgebra::{Quaternion, Vector3};
use crate::kinematic_traits::Pose;

/// Norms below this value are treated as zero.
pub const EPSILON: f64 = 1e-8;

/// If the cosine of the half angle between quaternions is above this value, slerp
/// switches to normalized linear interpolation.
pub const SLERP_LINEAR_THRESHOLD: f64 = 0.9995;

/// Normalizes the vector, returns the x axis `(1, 0, 0)` for a (near) zero vector.
pub fn normalize_vector(v: &Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm < EPSILON {
        return Vector3::x();
    }
    v / norm
}

/// Normalizes the quaternion, returns the identity for a (near) zero quaternion.
pub fn normalize(q: &Quaternion<f64>) -> Quaternion<f64> {
    let norm = q.norm();
    if norm < EPSILON {
        return Quaternion::identity();
    }
    *q * (1.0 / norm)
}

/// Rotation quaternion for the rotation by `angle` (radians) around `axis`.
/// The axis does not need to be normalized (zero axis falls back to x).
pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Quaternion<f64> {
    let axis = normalize_vector(axis);
    let (sin, cos) = (angle * 0.5).sin_cos();
    Quaternion::from_parts(cos, axis * sin)
}

/// Converts the rotation quaternion into (unit axis, angle in radians).
/// For a rotation by (near) zero angle, the axis is undefined and `((1, 0, 0), 0)` is returned.
pub fn to_axis_angle(q: &Quaternion<f64>) -> (Vector3<f64>, f64) {
    let q = normalize(q);
    let w = q.w.clamp(-1.0, 1.0);
    let angle = 2.0 * w.acos();
    let s = (1.0 - w * w).sqrt();
    if s < EPSILON {
        return (Vector3::x(), 0.0);
    }
    (q.imag() / s, angle)
}

/// Rotates the vector by the (unit) quaternion: `q * (0, v) * conj(q)`.
pub fn rotate_vector(q: &Quaternion<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    (*q * Quaternion::from_imag(*v) * q.conjugate()).imag()
}

/// Spherical linear interpolation between unit quaternions, taking the shortest path
/// (`b` is negated if the dot product is negative). Nearly parallel quaternions are
/// interpolated linearly and renormalized.
pub fn slerp(a: &Quaternion<f64>, b: &Quaternion<f64>, t: f64) -> Quaternion<f64> {
    let mut cos_half = a.dot(b);
    let mut b = *b;
    if cos_half < 0.0 {
        b = -b;
        cos_half = -cos_half;
    }
    if cos_half > SLERP_LINEAR_THRESHOLD {
        return normalize(&a.lerp(&b, t));
    }
    let half_theta = cos_half.acos();
    let sin_half = (1.0 - cos_half * cos_half).sqrt();
    let ratio_a = ((1.0 - t) * half_theta).sin() / sin_half;
    let ratio_b = (t * half_theta).sin() / sin_half;
    *a * ratio_a + b * ratio_b
}

/// The identity transform (real part `(1, 0, 0, 0)`, dual part zero).
pub fn identity() -> Pose {
    Pose::from_real_and_dual(Quaternion::identity(), Quaternion::new(0.0, 0.0, 0.0, 0.0))
}

/// Rigid transform that first rotates by `rotation` and then translates by `translation`.
/// The dual part is `0.5 * (0, translation) * rotation`.
pub fn from_rotation_translation(rotation: &Quaternion<f64>, translation: &Vector3<f64>) -> Pose {
    let dual = Quaternion::from_imag(*translation) * *rotation * 0.5;
    Pose::from_real_and_dual(*rotation, dual)
}

/// Translation of the rigid transform, the vector part of `2 * dual * conj(real)`.
pub fn translation(x: &Pose) -> Vector3<f64> {
    (x.dual * x.real.conjugate()).imag() * 2.0
}

/// Composition `a * b` (apply `b` in the frame of `a`). Real parts multiply,
/// the dual part is `a.real * b.dual + a.dual * b.real`.
pub fn compose(a: &Pose, b: &Pose) -> Pose {
    Pose::from_real_and_dual(a.real * b.real, a.real * b.dual + a.dual * b.real)
}

/// Inverse of the rigid transform: conjugated real part, dual part
/// `-conj(real) * dual * conj(real)`.
pub fn inverse(x: &Pose) -> Pose {
    let conjugate = x.real.conjugate();
    Pose::from_real_and_dual(conjugate, -(conjugate * x.dual * conjugate))
}

/// Component-wise difference `a - b` of both quaternions.
pub fn difference(a: &Pose, b: &Pose) -> Pose {
    Pose::from_real_and_dual(a.real - b.real, a.dual - b.dual)
}

/// Scales both quaternions by `s`.
pub fn scale(x: &Pose, s: f64) -> Pose {
    Pose::from_real_and_dual(x.real * s, x.dual * s)
}

/// Divides both parts by the norm of the real part. Only the unit norm of the real
/// part is restored, the dual part is scaled by the same factor without further correction.
/// Falls back to the identity transform if the real part is (near) zero.
pub fn normalize_pose(x: &Pose) -> Pose {
    let norm = x.real.norm();
    if norm < EPSILON {
        return identity();
    }
    scale(x, 1.0 / norm)
}

/// Component-wise linear blend of both quaternions followed by [`normalize_pose`].
/// This is not a geodesic interpolation.
pub fn lerp_pose(a: &Pose, b: &Pose, t: f64) -> Pose {
    normalize_pose(&Pose::from_real_and_dual(
        a.real.lerp(&b.real, t),
        a.dual.lerp(&b.dual, t),
    ))
}

/// Interpolates rotation with [`slerp`] and translation linearly, then rebuilds the transform.
/// Exact on the rotation/translation decomposition, but not a screw motion.
pub fn interpolate_geometric(a: &Pose, b: &Pose, t: f64) -> Pose {
    let rotation = slerp(&a.real, &b.real, t);
    let ta = translation(a);
    let tb = translation(b);
    from_rotation_translation(&rotation, &ta.lerp(&tb, t))
}

/// Checks if two poses are component-wise equal within the tolerance
pub fn approx_eq(a: &Pose, b: &Pose, tolerance: f64) -> bool {
    (a.real - b.real).norm() <= tolerance && (a.dual - b.dual).norm() <= tolerance
}
