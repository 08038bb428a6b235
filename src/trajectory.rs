//! Pose trajectory between the captured base pose and the goal pose.

use nalgebra::Vector3;
use crate::dual_quaternion::{compose, interpolate_geometric, inverse, lerp_pose, to_axis_angle, translation};
use crate::kinematic_traits::{Pose, Twist};
use crate::target::ErrorModel;
use crate::utils::twist_from_parts;

/// Minimal number of trajectory samples
pub const MIN_SAMPLES: usize = 10;

/// Maximal number of trajectory samples
pub const MAX_SAMPLES: usize = 200;

/// How the intermediate poses are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrajectoryMethod {
    /// Component-wise blend of both quaternions, renormalized by the real part.
    #[default]
    LinearBlend,
    /// Slerp of the rotation, linear interpolation of the translation.
    Geometric,
}

impl TrajectoryMethod {
    /// Name used in scenario files
    pub fn name(&self) -> &'static str {
        match self {
            TrajectoryMethod::LinearBlend => "linear_blend",
            TrajectoryMethod::Geometric => "geometric",
        }
    }

    /// Parses the method name. `dqlerp` and `slerp` are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear_blend" | "linear" | "dqlerp" => Some(TrajectoryMethod::LinearBlend),
            "geometric" | "slerp" => Some(TrajectoryMethod::Geometric),
            _ => None,
        }
    }

    fn interpolate(&self, start: &Pose, goal: &Pose, t: f64) -> Pose {
        match self {
            TrajectoryMethod::LinearBlend => lerp_pose(start, goal, t),
            TrajectoryMethod::Geometric => interpolate_geometric(start, goal, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryOptions {
    pub method: TrajectoryMethod,
    /// Requested number of samples, see [`TrajectoryOptions::sample_count`]
    pub samples: usize,
}

impl TrajectoryOptions {
    /// Number of samples actually produced: within [`MIN_SAMPLES`]..=[`MAX_SAMPLES`].
    pub fn sample_count(&self) -> usize {
        self.samples.clamp(MIN_SAMPLES, MAX_SAMPLES)
    }
}

impl Default for TrajectoryOptions {
    fn default() -> Self {
        TrajectoryOptions {
            method: TrajectoryMethod::LinearBlend,
            samples: 60,
        }
    }
}

/// Interpolated poses from the start (index 0) to the goal (last index).
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Nominal samples
    pub samples: Vec<Pose>,

    /// Samples with the error model applied
    pub error_samples: Vec<Pose>,

    /// Translations of `samples`
    pub points: Vec<Vector3<f64>>,

    /// Translations of `error_samples`
    pub error_points: Vec<Vector3<f64>>,

    /// Index of the active sample, always within the trajectory
    pub current_index: usize,
}

impl Trajectory {
    /// Builds the trajectory. Sample `i` is taken at `t = i / (N - 1)`.
    pub fn build(start: &Pose, goal: &Pose, error: &ErrorModel, options: &TrajectoryOptions) -> Self {
        let total = options.sample_count();
        let samples: Vec<Pose> = (0..total)
            .map(|i| options.method.interpolate(start, goal, i as f64 / (total - 1) as f64))
            .collect();
        let error_samples: Vec<Pose> = samples.iter().map(|x| error.apply(x)).collect();
        let points = samples.iter().map(translation).collect();
        let error_points = error_samples.iter().map(translation).collect();

        Trajectory {
            samples,
            error_samples,
            points,
            error_points,
            current_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clamps the index into `[0, N - 1]`.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.len().saturating_sub(1))
    }

    /// Selects the active sample (the index is clamped).
    pub fn select(&mut self, index: usize) {
        self.current_index = self.clamp_index(index);
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.select(index);
        self
    }

    /// Active sample, `None` only for an empty trajectory.
    pub fn active_sample(&self) -> Option<Pose> {
        self.samples.get(self.current_index).copied()
    }

    /// Desired twist estimated by differencing the samples at the active index and after it.
    /// The relative rotation `x1 * inverse(x0)` gives the angular part, the translation
    /// difference the linear part, both scaled by `max(1, N - 1)`.
    /// Zero if there are less than two samples.
    pub fn feedforward_twist(&self) -> Twist {
        if self.len() < 2 {
            return Twist::zeros();
        }
        let index = self.current_index.min(self.len() - 2);
        let x0 = &self.samples[index];
        let x1 = &self.samples[index + 1];
        let scale = (self.len() - 1).max(1) as f64;

        let linear = (translation(x1) - translation(x0)) * scale;
        let delta = compose(x1, &inverse(x0));
        let (axis, angle) = to_axis_angle(&delta.real);
        twist_from_parts(&(axis * (angle * scale)), &linear)
    }
}
