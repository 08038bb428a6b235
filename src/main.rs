//! Runs the resolved-rate iteration for a scenario and prints the kinematics along the way.
//!
//! Usage:
//!   dq-kinematics
//!   dq-kinematics --scenario src/tests/data/reference_arm.yaml --verify --max-steps 200
//!   RUST_LOG=debug dq-kinematics --realtime

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rs_dq_kinematics::iteration::{IterationDriver, Pacing};
use rs_dq_kinematics::kinematics_impl::KinematicsResult;
use rs_dq_kinematics::parameters::Scenario;
use rs_dq_kinematics::utils::{dump_joints, dump_pose, format_vector};
use rs_dq_kinematics::verification::verify_jacobian;

#[derive(Parser)]
#[command(about = "Dual quaternion kinematics and resolved-rate control of a 4-axis RRRP arm")]
struct Args {
    /// Scenario YAML file. Built-in reference scenario if not given.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Maximal number of iteration steps
    #[arg(long, default_value_t = 500)]
    max_steps: u64,

    /// Wait for the run period between steps
    #[arg(long)]
    realtime: bool,

    /// Compare the analytic Jacobian with finite differences
    #[arg(long)]
    verify: bool,

    /// Print the scenario as YAML
    #[arg(long)]
    dump: bool,
}

fn print_result(result: &KinematicsResult) {
    print!("x12:  ");
    dump_pose(&result.chain.x12());
    print!("x123: ");
    dump_pose(&result.chain.x123());
    print!("xN:   ");
    dump_pose(&result.end_effector());
    print!("real: ");
    dump_pose(&result.real);
    print!("goal: ");
    dump_pose(&result.target_goal);

    for (i, column) in result.jacobian.columns().iter().enumerate() {
        println!("J[{}] = {}", i + 1, format_vector(column.as_slice()));
    }

    let control = &result.control;
    println!("kappa_o = {:.4}, kappa_t = {:.4}, gamma = {:.4}",
             control.kappa_orientation, control.kappa_translation, control.gamma);
    println!("o~ = {}, t~ = {}", format_vector(control.orientation_error.as_slice()),
             format_vector(control.translation_error.as_slice()));
    println!("xi_d = {}", format_vector(control.feedforward.as_slice()));
    println!("u = {}", format_vector(control.u.as_slice()));
    println!("qdot = {}", format_vector(&control.qdot));
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::from_yaml_file(path)
            .with_context(|| format!("Failed to load scenario from {}", path.display()))?,
        None => Scenario::default(),
    };

    if args.dump {
        println!("{}", scenario.to_yaml());
    }

    let mut driver = IterationDriver::new();
    println!("Initial joints:");
    dump_joints(&scenario.joints);
    print_result(&driver.evaluate(&scenario));

    if args.verify {
        println!("Jacobian check: {}", verify_jacobian(&scenario.joints));
    }

    let pacing = if args.realtime { Pacing::Realtime } else { Pacing::Immediate };
    let stop = AtomicBool::new(false);
    let status = driver.run_blocking(&mut scenario, &stop, Some(args.max_steps), pacing);

    println!("Error history (newest first):");
    for sample in driver.history().newest_first() {
        println!("{:5} {:.4} {:.4}", sample.iteration, sample.orientation_error_norm,
                 sample.translation_error_norm);
    }
    println!("Final joints:");
    dump_joints(&scenario.joints);
    print_result(&driver.evaluate(&scenario));
    println!("Status after {} iterations: {:?}", driver.iteration(), status);
    Ok(())
}
