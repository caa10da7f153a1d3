//! Distributed solver of the 2D heat equation
//!
//! The global domain is split along its rows across a chain of ranks. On each
//! time step, every rank exchanges halo rows with its neighbors, updates its
//! share of the domain with the five-point stencil, and the energy of the
//! whole domain is summed on the first rank.

pub mod halo;
pub mod output;

use comm::Communicator;
use compute::{stencil::stencil, Backend};
use data::{
    field::{Evolving, Field},
    grid::GridRange,
    parameters::Parameters,
    Precision,
};
use log::info;
use std::{
    fmt::{self, Display, Formatter},
    io,
    path::Path,
    time::{Duration, Instant},
};
use thiserror::Error;

/// Rank on which the energy is reduced and reported
pub const ROOT: usize = 0;

/// One rank's share of a heat equation simulation
pub struct Simulation<'backend, C: Communicator, B: Backend> {
    /// Simulation parameters, including this rank's topology
    params: Parameters,

    /// Link to the other ranks
    comm: C,

    /// Compute backend, possibly shared with other ranks
    backend: &'backend B,

    /// Input and output fields of the current time step
    fields: Evolving,
}
//
impl<'backend, C: Communicator, B: Backend> Simulation<'backend, C, B> {
    /// Set up this rank's share of the simulation, starting from a field that
    /// is zero everywhere
    pub fn new(params: Parameters, comm: C, backend: &'backend B) -> Self {
        let params = params.with_topology(comm.topology());
        let fields = Evolving::for_parameters(&params);
        Self {
            params,
            comm,
            backend,
            fields,
        }
    }

    /// Simulation parameters
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Link to the other ranks
    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Most recent field, i.e. the input of the next time step
    pub fn field(&self) -> &Field {
        self.fields.input()
    }

    /// Mutable access to the fields, e.g. to set up initial conditions
    pub fn fields_mut(&mut self) -> &mut Evolving {
        &mut self.fields
    }

    /// Perform one time step
    ///
    /// Returns the energy of the global domain on the [`ROOT`] rank, and `None`
    /// on other ranks.
    pub fn step(&mut self) -> Result<Option<Precision>> {
        let (comm, backend, params) = (&self.comm, self.backend, &self.params);
        let fields = &mut self.fields;
        let mut energy = halo::toward_lower(comm, backend, fields, params)?;
        energy += halo::toward_higher(comm, backend, fields, params)?;
        energy += stencil(backend, fields, &GridRange::interior(params), params);
        let total = comm.reduce_sum(energy, ROOT)?;
        fields.flip();
        Ok(total)
    }

    /// Perform all the configured time steps
    ///
    /// On the [`ROOT`] rank, `on_report` is called with the global energy every
    /// `report_interval` steps, starting with the first one.
    pub fn run(&mut self, mut on_report: impl FnMut(Report)) -> Result<RunSummary> {
        let params = self.params;
        let topology = params.topology();
        if topology.position() == ROOT {
            info!(
                "Simulating {} steps over a {}x{} domain split across {} ranks",
                params.num_iterations(),
                params.global_rows(),
                params.global_cols(),
                topology.count()
            );
        }

        let start = Instant::now();
        for iteration in 0..params.num_iterations() {
            let energy = self.step()?;
            if let Some(energy) = energy.filter(|_| params.is_report_iteration(iteration)) {
                on_report(Report {
                    iteration,
                    time: params.simulated_time(iteration),
                    energy,
                });
            }
        }
        let elapsed = start.elapsed();
        if topology.position() == ROOT {
            info!("Simulation done in {elapsed:?}");
        }
        Ok(RunSummary {
            local_rows: params.local_rows(),
            cols: params.cols(),
            iterations: params.num_iterations(),
            elapsed,
        })
    }

    /// Write the most recent field into the shared output file at `path`
    ///
    /// This is a collective operation that all ranks must take part in.
    pub fn write_output(&self, path: impl AsRef<Path>) -> Result<()> {
        output::write_collective(&self.comm, path.as_ref(), &self.params, self.field())
    }
}

/// Energy of the global domain at some point of the simulation
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Report {
    /// Time step at which the energy was measured
    pub iteration: usize,

    /// Simulated time at the start of that time step
    pub time: Precision,

    /// Energy of the global domain at the end of that time step
    pub energy: Precision,
}
//
impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "E(t={}) = {}", self.time, self.energy)
    }
}

/// Performance summary of a simulation run, as seen from one rank
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Number of rows handled by the rank, halos excluded
    pub local_rows: usize,

    /// Number of grid columns
    pub cols: usize,

    /// Number of time steps
    pub iterations: usize,

    /// Wall-clock duration of the time steps
    pub elapsed: Duration,
}
//
impl RunSummary {
    /// Size of the rank's input and output fields in GB
    pub fn grid_size_gb(&self) -> f64 {
        (self.local_rows * self.cols * std::mem::size_of::<Precision>() * 2) as f64 / 1e9
    }

    /// Achieved memory bandwidth in GB/s, assuming each step reads the input
    /// field and writes the output field once
    pub fn bandwidth_gbps(&self) -> f64 {
        self.grid_size_gb() * self.iterations as f64 / self.elapsed.as_secs_f64()
    }
}
//
impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Domain {}x{} ({} GB): {} GB/s",
            self.local_rows,
            self.cols,
            self.grid_size_gb(),
            self.bandwidth_gbps()
        )
    }
}

/// Things that can go wrong during a simulation
#[derive(Debug, Error)]
pub enum Error {
    /// Communication with another rank failed
    #[error("failed to communicate with another rank")]
    Comm(#[from] comm::Error),

    /// Failed to write the output file
    #[error("failed to write output file")]
    Io(#[from] io::Error),

    /// Output file size would overflow
    #[error("output file would not fit in the address space")]
    OutputTooLarge,
}

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, Error>;
