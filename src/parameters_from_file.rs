//! Supports reading the scenario from YAML file (optional)

use std::path::Path;
use std::time::Duration;
use nalgebra::{Quaternion, Vector3};
use yaml_rust2::{Yaml, YamlLoader};

use crate::constraints::Constraints;
use crate::controller::Gains;
use crate::joint::{Joint, JointAxis, JointState};
use crate::kinematic_traits::{Pose, JOINT_COUNT};
use crate::parameter_error::ParameterError;
use crate::parameters::{Scenario, MAX_DT, MIN_DT};
use crate::target::{ErrorModel, TargetSpec};
use crate::trajectory::{TrajectoryMethod, MAX_SAMPLES, MIN_SAMPLES};

fn is_absent(yaml: &Yaml) -> bool {
    yaml.is_badvalue() || yaml.is_null()
}

fn number(yaml: &Yaml, field: &str) -> Result<f64, ParameterError> {
    match yaml {
        Yaml::Real(s) => s.parse::<f64>()
            .map_err(|e| ParameterError::ParseError(format!("{}: {}", field, e))),
        Yaml::Integer(i) => Ok(*i as f64),
        _ => Err(ParameterError::ParseError(format!("{} must be a number", field))),
    }
}

fn optional_number(section: &Yaml, key: &str, field: &str) -> Result<Option<f64>, ParameterError> {
    let value = &section[key];
    if is_absent(value) {
        return Ok(None);
    }
    number(value, &format!("{}.{}", field, key)).map(Some)
}

fn numbers<const N: usize>(yaml: &Yaml, field: &str) -> Result<[f64; N], ParameterError> {
    let items = yaml.as_vec()
        .ok_or_else(|| ParameterError::ParseError(format!("{} must be a list", field)))?;
    if items.len() != N {
        return Err(ParameterError::InvalidLength {
            field: field.to_string(),
            expected: N,
            found: items.len(),
        });
    }
    let mut values = [0.0; N];
    for (i, item) in items.iter().enumerate() {
        values[i] = number(item, field)?;
    }
    Ok(values)
}

fn optional_numbers<const N: usize>(section: &Yaml, key: &str, field: &str)
                                    -> Result<Option<[f64; N]>, ParameterError> {
    let value = &section[key];
    if is_absent(value) {
        return Ok(None);
    }
    numbers::<N>(value, &format!("{}.{}", field, key)).map(Some)
}

fn quaternion(values: [f64; 4]) -> Quaternion<f64> {
    Quaternion::new(values[0], values[1], values[2], values[3])
}

fn axis(yaml: &Yaml, field: &str) -> Result<JointAxis, ParameterError> {
    if let Some(name) = yaml.as_str() {
        return match name.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(JointAxis::X),
            "y" => Ok(JointAxis::Y),
            "z" => Ok(JointAxis::Z),
            other => Err(ParameterError::InvalidValue(
                format!("{}: unknown axis '{}', use x, y, z or [x, y, z]", field, other))),
        };
    }
    let v = numbers::<3>(yaml, field)?;
    Ok(JointAxis::Custom(Vector3::new(v[0], v[1], v[2])))
}

fn joint(yaml: &Yaml, index: usize) -> Result<Joint, ParameterError> {
    let field = format!("joints[{}]", index);
    let default = JointState::default().joints[index];

    let kind = match yaml["type"].as_str() {
        Some(kind) => kind.trim().to_ascii_lowercase(),
        None if is_absent(&yaml["type"]) => (if default.is_rotational() { "rotational" } else { "prismatic" }).to_string(),
        None => return Err(ParameterError::ParseError(format!("{}.type must be a string", field))),
    };
    let joint_axis = if is_absent(&yaml["axis"]) {
        default.axis()
    } else {
        axis(&yaml["axis"], &format!("{}.axis", field))?
    };

    match kind.as_str() {
        "rotational" | "r" => {
            let angle = match optional_number(yaml, "angle_deg", &field)? {
                Some(degrees) => degrees.to_radians(),
                None if default.is_rotational() => default.coordinate(),
                None => 0.0,
            };
            let link = match optional_number(yaml, "link", &field)? {
                Some(link) => link,
                None => match default {
                    Joint::Rotational { link, .. } => link,
                    Joint::Prismatic { .. } => return Err(ParameterError::MissingField(format!("{}.link", field))),
                },
            };
            if !link.is_finite() || link <= 0.0 {
                return Err(ParameterError::InvalidValue(
                    format!("{}.link must be positive, found {}", field, link)));
            }
            Ok(Joint::rotational(angle, joint_axis, link))
        }
        "prismatic" | "p" => {
            let displacement = match optional_number(yaml, "displacement", &field)? {
                Some(displacement) => displacement,
                None if default.is_rotational() => 0.0,
                None => default.coordinate(),
            };
            Ok(Joint::prismatic(displacement, joint_axis))
        }
        other => Err(ParameterError::InvalidValue(
            format!("{}.type: unknown joint type '{}', use rotational or prismatic", field, other))),
    }
}

fn joints(yaml: &Yaml) -> Result<JointState, ParameterError> {
    let items = yaml.as_vec()
        .ok_or_else(|| ParameterError::ParseError("joints must be a list".to_string()))?;
    if items.len() != JOINT_COUNT {
        return Err(ParameterError::InvalidLength {
            field: "joints".to_string(),
            expected: JOINT_COUNT,
            found: items.len(),
        });
    }
    let mut state = JointState::default();
    for (i, item) in items.iter().enumerate() {
        state.joints[i] = joint(item, i)?;
    }
    Ok(state)
}

fn target(yaml: &Yaml, default: &TargetSpec) -> Result<TargetSpec, ParameterError> {
    let mode = yaml["mode"].as_str().unwrap_or("pose").trim().to_ascii_lowercase();
    match mode.as_str() {
        "pose" => {
            let (position, axis, angle) = match *default {
                TargetSpec::Pose { position, axis, angle } => (position, axis, angle),
                TargetSpec::DualQuaternion { .. } => (Vector3::zeros(), Vector3::z(), 0.0),
            };
            let position = optional_numbers::<3>(yaml, "position", "target")?
                .map_or(position, |p| Vector3::new(p[0], p[1], p[2]));
            let axis = optional_numbers::<3>(yaml, "axis", "target")?
                .map_or(axis, |a| Vector3::new(a[0], a[1], a[2]));
            let angle = optional_number(yaml, "angle_deg", "target")?
                .map_or(angle, f64::to_radians);
            Ok(TargetSpec::Pose { position, axis, angle })
        }
        "dual_quaternion" | "dq" => {
            let real = optional_numbers::<4>(yaml, "real", "target")?
                .ok_or_else(|| ParameterError::MissingField("target.real".to_string()))?;
            let dual = optional_numbers::<4>(yaml, "dual", "target")?
                .ok_or_else(|| ParameterError::MissingField("target.dual".to_string()))?;
            Ok(TargetSpec::DualQuaternion { real: quaternion(real), dual: quaternion(dual) })
        }
        other => Err(ParameterError::InvalidValue(
            format!("target.mode: unknown mode '{}', use pose or dual_quaternion", other))),
    }
}

impl Scenario {
    /// Read the scenario from YAML file. YAML file like this is supported:
    /// ```yaml
    /// joints:
    ///   - { type: rotational, angle_deg: 30, axis: z, link: 0.6 }
    ///   - { type: rotational, angle_deg: -20, axis: y, link: 0.5 }
    ///   - { type: rotational, angle_deg: 40, axis: y, link: 0.4 }
    ///   - { type: prismatic, displacement: 0.2, axis: x }
    /// ranges:
    ///   from: [-3.14159, -3.14159, -3.14159, -1.0]
    ///   to: [3.14159, 3.14159, 3.14159, 1.0]
    /// error:
    ///   real: [1.0, 0.0, 0.0, 0.0]
    ///   dual: [0.0, 0.0, 0.0, 0.0]
    /// target:
    ///   mode: pose
    ///   position: [0.7, 0.2, 0.3]
    ///   axis: [0.0, 0.0, 1.0]
    ///   angle_deg: 45
    /// trajectory:
    ///   method: linear_blend
    ///   samples: 60
    /// gains:
    ///   orientation: [2.0, 2.0]
    ///   translation: [2.0, 2.0]
    /// iteration:
    ///   dt: 0.05
    ///   auto_advance: true
    ///   run_period_ms: 140
    ///   convergence_tolerance: 0.01
    /// ```
    /// Every section and every field is optional, missing values are taken from
    /// `Scenario::default()`. Joint angles and the target angle are in degrees, joint
    /// ranges are in the native units (radians for rotational joints). An axis is either
    /// `x`, `y`, `z` or a list of three numbers. The target in the dual quaternion form is
    /// given as `mode: dual_quaternion` with `real` and `dual` lists (scalar first).
    ///
    /// The sample count is clamped to [10, 200] and the time step to [0.001, 1.0].
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Same as [`Scenario::from_yaml_file`], but parses the string directly.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let docs = YamlLoader::load_from_str(contents)
            .map_err(|e| ParameterError::ParseError(format!("{}", e)))?;
        let mut scenario = Scenario::default();
        let doc = match docs.first() {
            Some(doc) => doc,
            None => return Ok(scenario),
        };

        if !is_absent(&doc["joints"]) {
            scenario.joints = joints(&doc["joints"])?;
            scenario.constraints = Constraints::for_joints(&scenario.joints);
        }

        let ranges = &doc["ranges"];
        if !is_absent(ranges) {
            let from = optional_numbers::<4>(ranges, "from", "ranges")?.unwrap_or(scenario.constraints.from);
            let to = optional_numbers::<4>(ranges, "to", "ranges")?.unwrap_or(scenario.constraints.to);
            scenario.constraints = Constraints::new(from, to);
        }

        let error = &doc["error"];
        if !is_absent(error) {
            let real = optional_numbers::<4>(error, "real", "error")?.map_or(scenario.error.pose.real, quaternion);
            let dual = optional_numbers::<4>(error, "dual", "error")?.map_or(scenario.error.pose.dual, quaternion);
            scenario.error = ErrorModel::new(Pose::from_real_and_dual(real, dual));
        }

        if !is_absent(&doc["target"]) {
            scenario.target = target(&doc["target"], &scenario.target)?;
        }

        let trajectory = &doc["trajectory"];
        if !is_absent(trajectory) {
            if let Some(method) = trajectory["method"].as_str() {
                scenario.trajectory.method = TrajectoryMethod::from_name(method).ok_or_else(||
                    ParameterError::InvalidValue(format!("trajectory.method: unknown method '{}'", method)))?;
            }
            if let Some(samples) = optional_number(trajectory, "samples", "trajectory")? {
                if !samples.is_finite() {
                    return Err(ParameterError::InvalidValue("trajectory.samples must be finite".to_string()));
                }
                scenario.trajectory.samples = (samples.round().max(0.0) as usize).clamp(MIN_SAMPLES, MAX_SAMPLES);
            }
        }

        let gains = &doc["gains"];
        if !is_absent(gains) {
            scenario.gains = Gains::new(
                optional_numbers::<2>(gains, "orientation", "gains")?.unwrap_or(scenario.gains.orientation),
                optional_numbers::<2>(gains, "translation", "gains")?.unwrap_or(scenario.gains.translation),
            );
        }

        let iteration = &doc["iteration"];
        if !is_absent(iteration) {
            let settings = &mut scenario.iteration;
            if let Some(dt) = optional_number(iteration, "dt", "iteration")? {
                if !dt.is_finite() {
                    return Err(ParameterError::InvalidValue("iteration.dt must be finite".to_string()));
                }
                settings.dt = dt.clamp(MIN_DT, MAX_DT);
            }
            if !is_absent(&iteration["auto_advance"]) {
                settings.auto_advance = iteration["auto_advance"].as_bool().ok_or_else(||
                    ParameterError::ParseError("iteration.auto_advance must be true or false".to_string()))?;
            }
            if let Some(period) = optional_number(iteration, "run_period_ms", "iteration")? {
                if !period.is_finite() || period < 0.0 {
                    return Err(ParameterError::InvalidValue(
                        format!("iteration.run_period_ms must not be negative, found {}", period)));
                }
                settings.run_period = Duration::from_micros((period * 1000.0).round() as u64);
            }
            if let Some(tolerance) = optional_number(iteration, "convergence_tolerance", "iteration")? {
                settings.convergence_tolerance = tolerance;
            }
        }

        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(Scenario::from_yaml_str("").unwrap(), Scenario::default());
        assert_eq!(Scenario::from_yaml_str("gains: {}\n").unwrap(), Scenario::default());
    }

    #[test]
    fn test_round_trip_of_defaults() {
        let yaml = Scenario::default().to_yaml();
        let loaded = Scenario::from_yaml_str(&yaml).expect("own output must be readable");
        let default = Scenario::default();
        assert_eq!(loaded.trajectory, default.trajectory);
        assert_eq!(loaded.gains, default.gains);
        assert_eq!(loaded.iteration, default.iteration);
        assert_eq!(loaded.constraints, default.constraints);
        for (a, b) in loaded.joints.coordinates().iter().zip(default.joints.coordinates().iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_clamping() {
        let scenario = Scenario::from_yaml_str("trajectory: { samples: 5000 }\niteration: { dt: 0.0 }\n").unwrap();
        assert_eq!(scenario.trajectory.samples, MAX_SAMPLES);
        assert_eq!(scenario.iteration.dt, MIN_DT);
        let scenario = Scenario::from_yaml_str("trajectory: { samples: 2 }\n").unwrap();
        assert_eq!(scenario.trajectory.samples, MIN_SAMPLES);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(Scenario::from_yaml_str("error: { real: [1, 0, 0] }"),
            Err(ParameterError::InvalidLength { expected: 4, found: 3, .. })));
        assert!(matches!(Scenario::from_yaml_str("trajectory: { method: spline }"),
            Err(ParameterError::InvalidValue(_))));
        assert!(matches!(Scenario::from_yaml_str("target: { mode: dual_quaternion, real: [1, 0, 0, 0] }"),
            Err(ParameterError::MissingField(_))));
        assert!(matches!(Scenario::from_yaml_str("gains: { orientation: [a, 2] }"),
            Err(ParameterError::ParseError(_))));
        assert!(matches!(Scenario::from_yaml_str("joints: [{}, {}, {}]"),
            Err(ParameterError::InvalidLength { expected: 4, found: 3, .. })));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(Scenario::from_yaml_file("src/tests/data/no_such_file.yaml"),
            Err(ParameterError::IoError(_))));
    }
}
