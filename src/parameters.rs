//! Defines the scenario: every input of the kinematics and of the iteration driver

use std::time::Duration;
use crate::chain::forward;
use crate::constraints::Constraints;
use crate::controller::Gains;
use crate::joint::{Joint, JointAxis, JointState};
use crate::target::{ErrorModel, TargetSpec};
use crate::trajectory::TrajectoryOptions;
use crate::utils::yaml_list;

/// Smallest accepted time step
pub const MIN_DT: f64 = 0.001;

/// Largest accepted time step
pub const MAX_DT: f64 = 1.0;

/// Settings of the iteration driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationSettings {
    /// Time step, joint increment is `qdot * dt`. Kept within [`MIN_DT`], [`MAX_DT`].
    pub dt: f64,

    /// Advance the trajectory index by one after every step.
    pub auto_advance: bool,

    /// Period of the run loop
    pub run_period: Duration,

    /// Run loop stops when both error norms are below this value.
    pub convergence_tolerance: f64,
}

impl IterationSettings {
    /// Time step clamped into the accepted range
    pub fn clamped_dt(&self) -> f64 {
        self.dt.clamp(MIN_DT, MAX_DT)
    }
}

impl Default for IterationSettings {
    fn default() -> Self {
        IterationSettings {
            dt: 0.05,
            auto_advance: true,
            run_period: Duration::from_millis(140),
            convergence_tolerance: 0.01,
        }
    }
}

/// Complete input set. The scenario is owned by the caller and only changed by explicit
/// edits (and by the iteration driver when it applies joint increments).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scenario {
    pub joints: JointState,
    /// Ranges joint values are clamped into when increments are applied
    pub constraints: Constraints,
    pub error: ErrorModel,
    pub target: TargetSpec,
    pub trajectory: TrajectoryOptions,
    pub gains: Gains,
    pub iteration: IterationSettings,
}

fn axis_name(axis: &JointAxis) -> String {
    match axis {
        JointAxis::X => "x".to_string(),
        JointAxis::Y => "y".to_string(),
        JointAxis::Z => "z".to_string(),
        JointAxis::Custom(v) => yaml_list(v.as_slice()),
    }
}

impl Scenario {
    /// Switches the target to the current end-effector pose (direct dual quaternion form).
    pub fn target_from_current(&mut self) {
        self.target = TargetSpec::from_pose(&forward(&self.joints));
    }

    /// Convert to string yaml representation (quick viewing, etc).
    /// The output can be read back with `Scenario::from_yaml_str`.
    pub fn to_yaml(&self) -> String {
        let mut yaml = String::from("joints:\n");
        for joint in self.joints.joints.iter() {
            match joint {
                Joint::Rotational { angle, axis, link } => yaml.push_str(&format!(
                    "  - {{ type: rotational, angle_deg: {}, axis: {}, link: {} }}\n",
                    angle.to_degrees(), axis_name(axis), link
                )),
                Joint::Prismatic { displacement, axis } => yaml.push_str(&format!(
                    "  - {{ type: prismatic, displacement: {}, axis: {} }}\n",
                    displacement, axis_name(axis)
                )),
            }
        }

        let c = &self.constraints;
        yaml.push_str(&format!("ranges:\n  from: {}\n  to: {}\n", yaml_list(&c.from), yaml_list(&c.to)));

        let e = &self.error.pose;
        yaml.push_str(&format!(
            "error:\n  real: {}\n  dual: {}\n",
            yaml_list(&[e.real.w, e.real.i, e.real.j, e.real.k]),
            yaml_list(&[e.dual.w, e.dual.i, e.dual.j, e.dual.k])
        ));

        match &self.target {
            TargetSpec::Pose { position, axis, angle } => yaml.push_str(&format!(
                "target:\n  mode: pose\n  position: {}\n  axis: {}\n  angle_deg: {}\n",
                yaml_list(position.as_slice()), yaml_list(axis.as_slice()), angle.to_degrees()
            )),
            TargetSpec::DualQuaternion { real, dual } => yaml.push_str(&format!(
                "target:\n  mode: dual_quaternion\n  real: {}\n  dual: {}\n",
                yaml_list(&[real.w, real.i, real.j, real.k]),
                yaml_list(&[dual.w, dual.i, dual.j, dual.k])
            )),
        }

        yaml.push_str(&format!(
            "trajectory:\n  method: {}\n  samples: {}\n",
            self.trajectory.method.name(), self.trajectory.samples
        ));
        yaml.push_str(&format!(
            "gains:\n  orientation: {}\n  translation: {}\n",
            yaml_list(&self.gains.orientation), yaml_list(&self.gains.translation)
        ));

        let it = &self.iteration;
        yaml.push_str(&format!(
            "iteration:\n  dt: {}\n  auto_advance: {}\n  run_period_ms: {}\n  convergence_tolerance: {}\n",
            it.dt, it.auto_advance, it.run_period.as_millis(), it.convergence_tolerance
        ));
        yaml
    }
}
