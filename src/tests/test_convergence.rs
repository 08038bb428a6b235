use std::sync::atomic::AtomicBool;
use crate::dual_quaternion::{approx_eq, from_axis_angle, from_rotation_translation};
use crate::iteration::{IterationDriver, IterationStatus, Pacing};
use crate::parameters::Scenario;
use crate::target::ErrorModel;
use crate::trajectory::TrajectoryMethod;
use crate::tests::test_utils::reference_arm;
use nalgebra::Vector3;

/// Target equal to the current pose, trajectory start equal to its end.
fn scenario_at_rest() -> (Scenario, IterationDriver) {
    let mut scenario = Scenario::default();
    scenario.joints = reference_arm();
    scenario.target_from_current();
    scenario.iteration.auto_advance = true;
    let mut driver = IterationDriver::new();
    driver.reset(&scenario);
    (scenario, driver)
}

#[test]
fn test_converges_when_target_is_current_pose() {
    for method in [TrajectoryMethod::LinearBlend, TrajectoryMethod::Geometric] {
        let (mut scenario, mut driver) = scenario_at_rest();
        scenario.trajectory.method = method;
        let samples = scenario.trajectory.sample_count() as u64;
        let stop = AtomicBool::new(false);
        let status = driver.run_blocking(&mut scenario, &stop, Some(samples), Pacing::Immediate);

        assert_eq!(status, IterationStatus::Converged, "{:?}", method);
        assert!(driver.iteration() <= samples);
        let latest = driver.history().latest().expect("at least one step was made");
        assert!(latest.orientation_error_norm < 0.01);
        assert!(latest.translation_error_norm < 0.01);
        assert!(!driver.is_running());
    }
}

#[test]
fn test_background_run_finishes_on_convergence() {
    let (scenario, driver) = scenario_at_rest();
    let handle = driver.spawn(scenario, None, Pacing::Immediate);
    let (driver, _) = handle.join().expect("run loop must finish by itself");
    assert_eq!(driver.status(), IterationStatus::Converged);
    assert!(driver.iteration() > 0);
}

#[test]
fn test_arm_stays_at_rest() {
    let (mut scenario, mut driver) = scenario_at_rest();
    let initial = scenario.joints;
    for _ in 0..5 {
        driver.step(&mut scenario);
    }
    for (a, b) in scenario.joints.coordinates().iter().zip(initial.coordinates().iter()) {
        assert!((a - b).abs() < 1e-9);
    }
    assert!(approx_eq(&driver.base_pose().unwrap(), &scenario.target.resolve(), 1e-9));
}

#[test]
fn test_error_model_is_seen_by_controller() {
    let (mut scenario, mut driver) = scenario_at_rest();
    scenario.error = ErrorModel::new(from_rotation_translation(
        &from_axis_angle(&Vector3::z(), 0.2), &Vector3::new(0.05, 0.0, 0.0)));
    let result = driver.step(&mut scenario);
    assert!(result.control.orientation_error_norm > 0.05);
    assert!(driver.history().latest().unwrap().orientation_error_norm > 0.05);
}

#[test]
fn test_restart_after_convergence() {
    let (mut scenario, mut driver) = scenario_at_rest();
    let stop = AtomicBool::new(false);
    assert_eq!(driver.run_blocking(&mut scenario, &stop, Some(100), Pacing::Immediate),
               IterationStatus::Converged);
    let steps = driver.iteration();
    // Start again from Converged: one more step, converged again
    assert_eq!(driver.run_blocking(&mut scenario, &stop, Some(100), Pacing::Immediate),
               IterationStatus::Converged);
    assert_eq!(driver.iteration(), steps + 1);
}
