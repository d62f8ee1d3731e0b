//! Binary target for the rollback chaos simulation.
//!
//! ```text
//! rollback_chaos [--seed N] [--iterations N] [option=value ...]
//! ```
//!
//! Runs the rollback workload against a three-coordinator, five-replica
//! cluster, once per seed. Set `RUST_LOG` to see the fault sequence.

use std::process::ExitCode;

use clap::Parser;
use rollback::{RollbackWorkload, WorkloadOptions};
use rollback_sim::{NetworkAddress, ProcessRole, SimWorld, SimulationRunner, run_simulation};
use tracing_subscriber::EnvFilter;

const COORDINATORS: &[&str] = &["10.0.1.1:4500", "10.0.1.2:4500", "10.0.1.3:4500"];
const REPLICAS: &[&str] = &[
    "10.0.2.1:4500",
    "10.0.2.2:4500",
    "10.0.2.3:4500",
    "10.0.2.4:4500",
    "10.0.1.1:4501",
];

#[derive(Parser, Debug)]
#[command(name = "rollback_chaos")]
#[command(about = "Run the rollback workload against a simulated cluster")]
#[command(long_about = None)]
struct Args {
    /// First seed to run
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of consecutive seeds to run
    #[arg(long, default_value_t = 10)]
    iterations: u64,

    /// Workload options as key=value pairs (e.g. clogDuration=1.5)
    #[arg(value_name = "OPTION")]
    options: Vec<String>,
}

fn build_world() -> Result<SimWorld, String> {
    let sim = SimWorld::new();
    for (addrs, role) in [
        (COORDINATORS, ProcessRole::Coordinator),
        (REPLICAS, ProcessRole::Replica),
    ] {
        for addr in addrs {
            let address: NetworkAddress = addr.parse().map_err(|e| format!("{addr}: {e}"))?;
            sim.register_process(address, role);
        }
    }
    Ok(sim)
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init();

    let args = Args::parse();
    let options = match WorkloadOptions::parse_args(args.options.iter().map(String::as_str)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut failures = 0;
    for seed in args.seed..args.seed.saturating_add(args.iterations) {
        let workload = match RollbackWorkload::from_options(&options) {
            Ok(w) => w,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        };
        let sim = match build_world() {
            Ok(sim) => sim,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        };

        match run_simulation(SimulationRunner::new(sim, seed).workload(workload)) {
            Ok(report) => {
                if !report.is_success() {
                    failures += 1;
                }
                eprint!("{report}");
            }
            Err(e) => {
                failures += 1;
                eprintln!("seed {seed}: {e}");
            }
        }
    }

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        eprintln!("{failures} of {} seed(s) failed", args.iterations);
        ExitCode::FAILURE
    }
}
