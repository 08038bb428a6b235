use std::time::Duration;
use nalgebra::{Quaternion, Vector3};
use crate::constraints::Constraints;
use crate::controller::Gains;
use crate::joint::{Joint, JointAxis};
use crate::parameter_error::ParameterError;
use crate::parameters::Scenario;
use crate::target::TargetSpec;
use crate::trajectory::{TrajectoryMethod, MIN_SAMPLES};

const READ_ERROR: &'static str = "Failed to load scenario from file";

#[test]
fn test_reference_scenario_from_yaml() {
    let filename = "src/tests/data/reference_arm.yaml";
    let loaded = Scenario::from_yaml_file(filename).expect(READ_ERROR);
    let expected = Scenario::default();

    for (a, b) in loaded.joints.joints.iter().zip(expected.joints.joints.iter()) {
        assert_eq!(a.axis(), b.axis());
        assert_eq!(a.is_rotational(), b.is_rotational());
        assert!((a.coordinate() - b.coordinate()).abs() < 1e-12);
    }
    assert_eq!(loaded.joints.links(), expected.joints.links());
    assert_eq!(loaded.constraints, expected.constraints);
    assert_eq!(loaded.error, expected.error);
    assert_eq!(loaded.trajectory, expected.trajectory);
    assert_eq!(loaded.gains, expected.gains);
    assert_eq!(loaded.iteration, expected.iteration);

    match loaded.target {
        TargetSpec::Pose { position, axis, angle } => {
            assert_eq!(position, Vector3::new(0.7, 0.2, 0.3));
            assert_eq!(axis, Vector3::z());
            assert!((angle - 45.0_f64.to_radians()).abs() < 1e-12);
        }
        other => panic!("Pose target expected, found {:?}", other),
    }
}

#[test]
fn test_custom_scenario_from_yaml() {
    let filename = "src/tests/data/custom_axes.yaml";
    let loaded = Scenario::from_yaml_file(filename).expect(READ_ERROR);

    assert_eq!(loaded.joints.joints[0].axis(), JointAxis::Custom(Vector3::new(0.0, 0.0, 2.0)));
    assert_eq!(loaded.joints.joints[1].axis(), JointAxis::X);
    assert!((loaded.joints.joints[2].coordinate() + 90.0_f64.to_radians()).abs() < 1e-12);
    assert_eq!(loaded.joints.joints[3], Joint::prismatic(-0.1, JointAxis::Z));
    assert_eq!(loaded.joints.links(), [0.3, 0.7, 0.25, 0.0]);

    assert_eq!(loaded.constraints, Constraints::new([-1.5, -1.5, -3.0, -0.5], [1.5, 1.5, 3.0, 0.5]));
    assert_eq!(loaded.error.pose.real, Quaternion::new(0.0, 0.0, 0.0, 2.0));
    assert_eq!(loaded.error.normalized().pose.real, Quaternion::new(0.0, 0.0, 0.0, 1.0));

    let goal = loaded.target.resolve();
    assert_eq!(goal.real, Quaternion::identity());
    assert_eq!(goal.dual, Quaternion::new(0.0, 0.35, 0.1, 0.15));

    assert_eq!(loaded.trajectory.method, TrajectoryMethod::Geometric);
    assert_eq!(loaded.trajectory.samples, 25);
    assert_eq!(loaded.gains, Gains::new([1.0, 0.0], [0.5, 4.0]));
    assert_eq!(loaded.gains.kappa_orientation(), 1.0);

    assert_eq!(loaded.iteration.dt, 0.02);
    assert!(!loaded.iteration.auto_advance);
    assert_eq!(loaded.iteration.run_period, Duration::from_millis(50));
    // Not given in the file
    assert_eq!(loaded.iteration.convergence_tolerance, 0.01);
}

#[test]
fn test_partial_scenario_from_yaml() {
    let filename = "src/tests/data/partial.yaml";
    let loaded = Scenario::from_yaml_file(filename).expect(READ_ERROR);
    assert_eq!(loaded.trajectory.samples, MIN_SAMPLES);
    assert_eq!(loaded.iteration.dt, 1.0);
    assert_eq!(loaded.joints, Scenario::default().joints);
    assert_eq!(loaded.target, Scenario::default().target);
}

#[test]
fn test_invalid_link_is_rejected() {
    let filename = "src/tests/data/invalid_link.yaml";
    match Scenario::from_yaml_file(filename) {
        Err(ParameterError::InvalidValue(message)) => assert!(message.contains("joints[1].link"), "{}", message),
        other => panic!("InvalidValue expected, found {:?}", other),
    }
}

#[test]
fn test_written_scenario_is_readable() {
    let mut scenario = Scenario::from_yaml_file("src/tests/data/custom_axes.yaml").expect(READ_ERROR);
    scenario.target_from_current();
    let reloaded = Scenario::from_yaml_str(&scenario.to_yaml()).expect("own output must be readable");
    assert_eq!(reloaded.target, scenario.target);
    assert_eq!(reloaded.constraints, scenario.constraints);
    assert_eq!(reloaded.trajectory, scenario.trajectory);
    assert_eq!(reloaded.error, scenario.error);
}
