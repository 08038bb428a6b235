//! Helper functions

use nalgebra::{Quaternion, Vector3, Vector4};
use crate::dual_quaternion::translation;
use crate::joint::JointState;
use crate::kinematic_traits::{Joints, Pose, Twist};

/// Assembles the twist from angular and linear parts
pub fn twist_from_parts(angular: &Vector3<f64>, linear: &Vector3<f64>) -> Twist {
    Twist::new(angular.x, angular.y, angular.z, linear.x, linear.y, linear.z)
}

/// Angular part (rows 0..3) of the twist
pub fn angular_part(twist: &Twist) -> Vector3<f64> {
    twist.fixed_rows::<3>(0).into_owned()
}

/// Linear part (rows 3..6) of the twist
pub fn linear_part(twist: &Twist) -> Vector3<f64> {
    twist.fixed_rows::<3>(3).into_owned()
}

/// Converts ```nalgebra::Vector4<f64>``` to Joints ([f64; 4])
pub fn vector4_to_joints(v: Vector4<f64>) -> Joints {
    [v[0], v[1], v[2], v[3]]
}

/// Converts ```Joints ([f64; 4])``` to a ```Vector4<f64>```
pub fn joints_to_vector4(j: Joints) -> Vector4<f64> {
    Vector4::new(j[0], j[1], j[2], j[3])
}

pub fn format_vector(v: &[f64]) -> String {
    let values: Vec<String> = v.iter().map(|x| format!("{:.3}", x)).collect();
    format!("[{}]", values.join(", "))
}

/// Quaternion in the scalar first order [w, x, y, z]
pub fn format_quaternion(q: &Quaternion<f64>) -> String {
    format_vector(&[q.w, q.i, q.j, q.k])
}

pub fn format_pose(x: &Pose) -> String {
    format!("{{q:{}, qt:{}}}", format_quaternion(&x.real), format_quaternion(&x.dual))
}

/// Print the pose, both dual quaternion and the translation it encodes.
pub fn dump_pose(x: &Pose) {
    let t = translation(x);
    println!("{}  t: {}", format_pose(x), format_vector(t.as_slice()));
}

/// Print joint values, converting radians of rotational joints to degrees.
pub fn dump_joints(state: &JointState) {
    let mut row_str = String::new();
    for joint in state.joints.iter() {
        let value = if joint.is_rotational() {
            joint.coordinate().to_degrees()
        } else {
            joint.coordinate()
        };
        row_str.push_str(&format!("{:5.2} ", value));
    }
    println!("[{}]", row_str.trim_end());
}

/// formatting for YAML output
pub(crate) fn yaml_list(values: &[f64]) -> String {
    let values: Vec<String> = values.iter().map(|x| format!("{}", x)).collect();
    format!("[{}]", values.join(", "))
}
