use clap::Parser;
use comm::{Communicator, LocalGroup};
use compute::Backend;
use compute_selector::{BackendArgs, DefaultBackend};
use data::parameters::{Config, Parameters, DEFAULT_REPORT_INTERVAL};
use eyre::Result;
use log::info;
use solver::{Report, Simulation, ROOT};
use std::{num::NonZeroUsize, path::PathBuf};

/// Perform a distributed heat equation simulation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of grid rows handled by each rank
    nx: NonZeroUsize,

    /// Number of grid columns
    ny: NonZeroUsize,

    /// Number of simulation time steps
    ni: NonZeroUsize,

    /// Number of ranks the grid rows are split across
    #[arg(short, long, default_value_t = NonZeroUsize::MIN)]
    ranks: NonZeroUsize,

    /// Path to the results output file
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Number of time steps between two energy reports
    #[arg(long, default_value_t = DEFAULT_REPORT_INTERVAL)]
    report_interval: NonZeroUsize,

    /// Simulated time interval on each time step
    #[arg(short, long)]
    time_step: Option<f64>,

    /// Display a progress bar instead of energy reports
    #[arg(long)]
    progress: bool,

    /// Backend-specific CLI arguments
    #[command(flatten)]
    backend: BackendArgs,
}

fn main() -> Result<()> {
    // Enable logging to stderr
    ui::init_logger();

    // Parse CLI arguments and check the simulation configuration
    let args = Args::parse();
    let params = Parameters::new(Config {
        local_rows: args.nx,
        cols: args.ny,
        num_iterations: args.ni.get(),
        report_interval: args.report_interval,
        time_step: args.time_step,
    })?;
    info!(
        "Using dx = {}, dt = {}, diffusion number = {}",
        params.dx(),
        params.dt(),
        params.diffusion_number()
    );

    // Set up the compute backend, shared by all ranks
    let backend = DefaultBackend::new(args.backend)?;

    // Set up progress reporting
    let progress = if args.progress {
        let num_reports = params.num_iterations().div_ceil(params.report_interval());
        Some(ui::init_progress_reporting("Running simulation", num_reports)?)
    } else {
        None
    };

    // Run the simulation on every rank
    let (backend, output, progress) = (&backend, &args.output, &progress);
    let results = LocalGroup::run(args.ranks.get(), |comm| {
        let is_root = comm.topology().position() == ROOT;
        let mut simulation = Simulation::new(params, comm, backend);
        let summary = simulation.run(|report: Report| match progress {
            Some(progress) => progress.inc(1),
            None => eprintln!("{report}"),
        })?;
        if is_root {
            if let Some(progress) = progress {
                progress.finish();
            }
            eprintln!("{summary}");
        }
        simulation.write_output(output)
    });
    for result in results {
        result?;
    }
    info!("Results written to {}", args.output.display());
    Ok(())
}
