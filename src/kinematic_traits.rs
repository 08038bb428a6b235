//! Type aliases and constants shared by all modules.

extern crate nalgebra as na;
use na::{DualQuaternion, Matrix6x4, Vector6};

/// Pose is a rigid transform (rotation and translation) encoded as a dual quaternion.
/// The real part is the rotation quaternion, the dual part is `0.5 * (0, t) * real`.
/// ```
/// extern crate nalgebra as na;
/// use na::{DualQuaternion, Quaternion};
///
/// type Pose = DualQuaternion<f64>;
///
/// // Pure translation by (1, 0, 0)
/// let pose = Pose::from_real_and_dual(
///     Quaternion::new(1.0, 0.0, 0.0, 0.0),
///     Quaternion::new(0.0, 0.5, 0.0, 0.0),
/// );
/// ```
pub type Pose = DualQuaternion<f64>;

/// Number of joints of the arm (three rotational, one prismatic in the reference setup).
pub const JOINT_COUNT: usize = 4;

/// Joint coordinates, velocities or increments. Rotational joints are in radians,
/// prismatic joints in the length unit of the arm.
pub type Joints = [f64; JOINT_COUNT];

/// Joint coordinates all set to zero
pub const JOINTS_AT_ZERO: Joints = [0.0; JOINT_COUNT];

/// Six component vector, angular part (rows 0..3) first, linear part (rows 3..6) after.
pub type Twist = Vector6<f64>;

/// Geometric Jacobian, rows are [angular(3); linear(3)], one column per joint.
pub type JacobianMatrix = Matrix6x4<f64>;
