//! One complete evaluation: forward kinematics, error injection, trajectory, Jacobian and control.
//!
//! Everything is recomputed from the inputs on every call, nothing is cached.

use crate::chain::{forward_chain, KinematicChain};
use crate::controller::{compute_control, ControlOutput};
use crate::jacobian::Jacobian;
use crate::kinematic_traits::Pose;
use crate::parameters::Scenario;
use crate::trajectory::Trajectory;

/// Result of [`compute_kinematics`].
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicsResult {
    pub chain: KinematicChain,

    /// End-effector pose with the error model applied
    pub real: Pose,

    /// `inverse(nominal) * real`
    pub delta: Pose,

    /// Resolved target pose
    pub target_goal: Pose,

    /// Start of the trajectory
    pub base_pose: Pose,

    /// Trajectory with the active index set
    pub trajectory: Trajectory,

    /// Active trajectory sample, the desired pose of the controller
    pub target_sample: Pose,

    pub jacobian: Jacobian,
    pub control: ControlOutput,
}

impl KinematicsResult {
    /// Nominal end-effector pose
    pub fn end_effector(&self) -> Pose {
        self.chain.end_effector()
    }
}

/// Evaluates the scenario.
///
/// # Arguments
///
/// * `scenario` - all inputs
/// * `base_pose` - start of the trajectory. If `None`, the current nominal end-effector pose is used.
/// * `trajectory_index` - active trajectory sample, clamped into the trajectory
pub fn compute_kinematics(scenario: &Scenario, base_pose: Option<&Pose>, trajectory_index: usize) -> KinematicsResult {
    let chain = forward_chain(&scenario.joints);
    let nominal = chain.end_effector();
    let real = scenario.error.apply(&nominal);
    let delta = scenario.error.delta(&nominal);

    let target_goal = scenario.target.resolve();
    let base_pose = base_pose.copied().unwrap_or(nominal);
    let trajectory = Trajectory::build(&base_pose, &target_goal, &scenario.error, &scenario.trajectory)
        .with_index(trajectory_index);
    let target_sample = trajectory.active_sample().unwrap_or(target_goal);

    let jacobian = Jacobian::new(&scenario.joints, &chain);
    let control = compute_control(&jacobian, &real, &target_sample, &trajectory, &scenario.gains,
                                  scenario.iteration.clamped_dt());

    KinematicsResult {
        chain,
        real,
        delta,
        target_goal,
        base_pose,
        trajectory,
        target_sample,
        jacobian,
        control,
    }
}
