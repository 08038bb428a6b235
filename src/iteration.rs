//! Iteration driver: applies controller increments step by step and tracks convergence.
//!
//! The driver owns the only state that survives between evaluations (iteration counter,
//! trajectory index, captured base pose, status and error history). Everything else is
//! recomputed from the [`Scenario`] on every evaluation.
//!
//! The periodic run loop checks its cancellation flag once per period, before the step.
//! A step is never interrupted, so pausing takes effect at the next period boundary.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use anyhow::anyhow;
use tracing::{debug, info, warn};
use crate::chain::forward;
use crate::kinematic_traits::Pose;
use crate::kinematics_impl::{compute_kinematics, KinematicsResult};
use crate::parameters::Scenario;

/// Number of error samples kept in the history
pub const HISTORY_CAPACITY: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterationStatus {
    #[default]
    Idle,
    /// One-shot step in progress
    Stepping,
    /// Periodic stepping
    Running,
    /// Run loop stopped itself because both errors were below the tolerance
    Converged,
}

/// Error norms recorded after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorSample {
    pub iteration: u64,
    pub orientation_error_norm: f64,
    pub translation_error_norm: f64,
}

/// Bounded FIFO of error samples. Once [`HISTORY_CAPACITY`] is exceeded, the oldest
/// sample is evicted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorHistory {
    samples: VecDeque<ErrorSample>,
}

impl ErrorHistory {
    pub fn new() -> Self {
        ErrorHistory { samples: VecDeque::with_capacity(HISTORY_CAPACITY + 1) }
    }

    pub fn push(&mut self, sample: ErrorSample) {
        self.samples.push_back(sample);
        while self.samples.len() > HISTORY_CAPACITY {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&ErrorSample> {
        self.samples.back()
    }

    /// Oldest sample first
    pub fn iter(&self) -> impl Iterator<Item = &ErrorSample> {
        self.samples.iter()
    }

    /// Most recent sample first, the order used for display
    pub fn newest_first(&self) -> impl Iterator<Item = &ErrorSample> {
        self.samples.iter().rev()
    }
}

/// State persisting across evaluations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IterationState {
    pub iteration: u64,
    pub trajectory_index: usize,
    /// Captured on the first evaluation and on reset
    pub base_pose: Option<Pose>,
    pub status: IterationStatus,
    pub history: ErrorHistory,
}

/// How the run loop spaces its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Wait for the configured run period between steps
    Realtime,
    /// Step back to back
    Immediate,
}

#[derive(Debug, Clone, Default)]
pub struct IterationDriver {
    state: IterationState,
}

impl IterationDriver {
    pub fn new() -> Self {
        IterationDriver { state: IterationState::default() }
    }

    pub fn state(&self) -> &IterationState {
        &self.state
    }

    pub fn status(&self) -> IterationStatus {
        self.state.status
    }

    pub fn iteration(&self) -> u64 {
        self.state.iteration
    }

    pub fn trajectory_index(&self) -> usize {
        self.state.trajectory_index
    }

    pub fn base_pose(&self) -> Option<Pose> {
        self.state.base_pose
    }

    pub fn history(&self) -> &ErrorHistory {
        &self.state.history
    }

    pub fn is_running(&self) -> bool {
        self.state.status == IterationStatus::Running
    }

    /// Base pose of the trajectory, captured from the current end-effector if not yet known.
    fn ensure_base(&mut self, scenario: &Scenario) -> Pose {
        *self.state.base_pose.get_or_insert_with(|| forward(&scenario.joints))
    }

    /// Evaluates the scenario at the current trajectory index. The stored index is clamped
    /// to the trajectory length.
    pub fn evaluate(&mut self, scenario: &Scenario) -> KinematicsResult {
        let base = self.ensure_base(scenario);
        let result = compute_kinematics(scenario, Some(&base), self.state.trajectory_index);
        self.state.trajectory_index = result.trajectory.current_index;
        result
    }

    /// Executes one step and returns the evaluation at the new configuration.
    ///
    /// The increment computed at the current configuration is applied (clamped into
    /// the joint ranges), the iteration counter is increased and, with auto advance, the
    /// trajectory index moves to the next sample. The error norms after the step are
    /// recorded. While running, the driver becomes [`IterationStatus::Converged`] if both
    /// norms are below the tolerance.
    pub fn step(&mut self, scenario: &mut Scenario) -> KinematicsResult {
        let running = self.is_running();
        if !running {
            self.state.status = IterationStatus::Stepping;
        }

        let before = self.evaluate(scenario);
        scenario.joints.apply_increment(&before.control.increment, &scenario.constraints);
        self.state.iteration += 1;
        if scenario.iteration.auto_advance {
            let last = before.trajectory.len().saturating_sub(1);
            self.state.trajectory_index = (self.state.trajectory_index + 1).min(last);
        }

        let after = self.evaluate(scenario);
        let control = &after.control;
        self.state.history.push(ErrorSample {
            iteration: self.state.iteration,
            orientation_error_norm: control.orientation_error_norm,
            translation_error_norm: control.translation_error_norm,
        });
        debug!(
            "step {}: index {}, |õ| = {:.6}, |t̃| = {:.6}",
            self.state.iteration, self.state.trajectory_index,
            control.orientation_error_norm, control.translation_error_norm
        );

        if !running {
            self.state.status = IterationStatus::Idle;
        } else if control.is_converged(scenario.iteration.convergence_tolerance) {
            self.state.status = IterationStatus::Converged;
            info!("Converged after {} iterations", self.state.iteration);
        }
        after
    }

    /// Enters the running state. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state.status = IterationStatus::Running;
        info!("Run started at iteration {}", self.state.iteration);
        true
    }

    /// Leaves the running state (pause).
    pub fn stop(&mut self) {
        if self.is_running() {
            self.state.status = IterationStatus::Idle;
            info!("Run paused at iteration {}", self.state.iteration);
        }
    }

    /// Stops, captures the current end-effector pose as the new base pose and clears
    /// the counter, trajectory index and history.
    pub fn reset(&mut self, scenario: &Scenario) {
        self.stop();
        self.state = IterationState {
            base_pose: Some(forward(&scenario.joints)),
            ..IterationState::default()
        };
        info!("Iteration reset");
    }

    /// Runs the loop on the current thread until the stop flag is raised, the driver
    /// converges or `max_steps` steps were made. The flag is checked before every step.
    ///
    /// # Returns
    ///
    /// Final status: [`IterationStatus::Converged`] or [`IterationStatus::Idle`].
    pub fn run_blocking(&mut self, scenario: &mut Scenario, stop: &AtomicBool, max_steps: Option<u64>,
                        pacing: Pacing) -> IterationStatus {
        self.start();
        let period = scenario.iteration.run_period;
        let mut steps = 0u64;

        loop {
            if stop.load(Ordering::SeqCst) || max_steps.is_some_and(|max| steps >= max) {
                self.stop();
                break;
            }

            let started = Instant::now();
            self.step(scenario);
            steps += 1;
            if !self.is_running() {
                break;
            }

            if pacing == Pacing::Realtime {
                let elapsed = started.elapsed();
                if let Some(sleep_time) = period.checked_sub(elapsed) {
                    thread::sleep(sleep_time);
                } else {
                    warn!("Run loop overrun by {:?}", elapsed - period);
                }
            }
        }
        self.status()
    }

    /// Moves the driver and the scenario into a background thread running
    /// [`IterationDriver::run_blocking`]. Both are handed back by [`RunHandle::join`].
    pub fn spawn(self, scenario: Scenario, max_steps: Option<u64>, pacing: Pacing) -> RunHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();
        let thread = thread::spawn(move || {
            let mut driver = self;
            let mut scenario = scenario;
            driver.run_blocking(&mut scenario, &stop_clone, max_steps, pacing);
            (driver, scenario)
        });
        RunHandle { stop, thread }
    }
}

/// Handle to the background run loop
pub struct RunHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<(IterationDriver, Scenario)>,
}

impl RunHandle {
    /// Requests the loop to pause at the next period boundary
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// True while the loop thread has not finished
    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Waits for the loop to finish (without stopping it) and returns the driver and scenario.
    pub fn join(self) -> anyhow::Result<(IterationDriver, Scenario)> {
        self.thread.join().map_err(|_| anyhow!("Run loop thread panicked"))
    }

    /// Stops the loop and waits for it.
    pub fn stop_and_join(self) -> anyhow::Result<(IterationDriver, Scenario)> {
        self.stop();
        self.join()
    }
}
