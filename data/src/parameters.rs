//! Simulation parameters

use crate::{topology::Topology, Precision};
use std::num::NonZeroUsize;
use thiserror::Error;

/// Thermal diffusivity
pub const DIFFUSIVITY: Precision = 1.0;

/// Default number of iterations between two energy reports
pub const DEFAULT_REPORT_INTERVAL: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(interval) => interval,
    None => unreachable!(),
};

/// User-provided simulation configuration, from which [`Parameters`] derive
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    /// Number of grid rows handled by each rank, halos excluded
    pub local_rows: NonZeroUsize,

    /// Number of grid columns
    pub cols: NonZeroUsize,

    /// Number of simulation time steps
    pub num_iterations: usize,

    /// Number of time steps between two energy reports
    pub report_interval: NonZeroUsize,

    /// Time step, overriding the default of `dx² / (5 * DIFFUSIVITY)`
    pub time_step: Option<Precision>,
}
//
impl Config {
    /// Configuration with default report interval and time step
    pub fn new(local_rows: NonZeroUsize, cols: NonZeroUsize, num_iterations: usize) -> Self {
        Self {
            local_rows,
            cols,
            num_iterations,
            report_interval: DEFAULT_REPORT_INTERVAL,
            time_step: None,
        }
    }
}

/// Computation parameters
///
/// Built once from a [`Config`], then only the rank topology is filled in
/// once the process group has been set up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Grid spacing
    dx: Precision,

    /// Time step
    dt: Precision,

    /// Number of rows handled by this rank, halos excluded
    local_rows: usize,

    /// Number of grid columns
    cols: usize,

    /// Number of time steps
    num_iterations: usize,

    /// Number of time steps between energy reports
    report_interval: usize,

    /// Position of this rank in the decomposition chain
    topology: Topology,
}
//
impl Parameters {
    /// Derive parameters from the user configuration
    ///
    /// Geometries where the boundary strips would overlap with each other or
    /// with the Dirichlet columns are rejected, and so are time steps for which
    /// the explicit scheme is unstable.
    pub fn new(config: Config) -> Result<Self, Error> {
        let local_rows = usize::from(config.local_rows);
        let cols = usize::from(config.cols);
        if local_rows < 2 {
            return Err(Error::TooFewRows(local_rows));
        }
        if cols < 3 {
            return Err(Error::TooFewCols(cols));
        }

        let dx = 1.0 / local_rows as Precision;
        let dt = config
            .time_step
            .unwrap_or(dx * dx / (5.0 * DIFFUSIVITY));
        if !(dt.is_finite() && dt > 0.0) {
            return Err(Error::BadTimeStep(dt));
        }

        let result = Self {
            dx,
            dt,
            local_rows,
            cols,
            num_iterations: config.num_iterations,
            report_interval: config.report_interval.into(),
            topology: Topology::single(),
        };
        let gamma = result.diffusion_number();
        if 4.0 * gamma >= 1.0 {
            return Err(Error::Unstable { dt, gamma });
        }
        Ok(result)
    }

    /// Record where this rank sits in the decomposition chain
    pub fn with_topology(self, topology: Topology) -> Self {
        Self { topology, ..self }
    }

    /// Grid spacing
    pub fn dx(&self) -> Precision {
        self.dx
    }

    /// Time step
    pub fn dt(&self) -> Precision {
        self.dt
    }

    /// Number of rows handled by this rank, halos excluded
    pub fn local_rows(&self) -> usize {
        self.local_rows
    }

    /// Number of grid columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of time steps
    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    /// Number of time steps between energy reports
    pub fn report_interval(&self) -> usize {
        self.report_interval
    }

    /// Position of this rank in the decomposition chain
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Diffusion number γ
    pub fn diffusion_number(&self) -> Precision {
        DIFFUSIVITY * self.dt / (self.dx * self.dx)
    }

    /// Number of rows of the global domain
    pub fn global_rows(&self) -> usize {
        self.local_rows * self.topology.count()
    }

    /// Number of columns of the global domain
    pub fn global_cols(&self) -> usize {
        self.cols
    }

    /// Shape of the local field, including the two halo rows
    pub fn field_shape(&self) -> [usize; 2] {
        [self.local_rows + 2, self.cols]
    }

    /// Simulated time at the start of a given iteration
    pub fn simulated_time(&self, iteration: usize) -> Precision {
        iteration as Precision * self.dt
    }

    /// Simulated time at the end of the run
    pub fn final_time(&self) -> Precision {
        self.simulated_time(self.num_iterations)
    }

    /// Truth that the energy should be reported at a given iteration
    pub fn is_report_iteration(&self, iteration: usize) -> bool {
        iteration % self.report_interval == 0
    }
}

/// Invalid simulation configuration
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Each rank needs one row next to each halo
    #[error("need at least 2 rows per rank, got {0}")]
    TooFewRows(usize),

    /// Two Dirichlet columns plus at least one computed column are needed
    #[error("need at least 3 columns, got {0}")]
    TooFewCols(usize),

    /// Time step is not a positive number
    #[error("time step must be positive and finite, got {0}")]
    BadTimeStep(Precision),

    /// Explicit scheme would diverge
    #[error("time step {dt} is unstable (diffusion number {gamma} must be below 0.25)")]
    Unstable { dt: Precision, gamma: Precision },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(local_rows: usize, cols: usize, num_iterations: usize) -> Config {
        Config::new(
            NonZeroUsize::new(local_rows).unwrap(),
            NonZeroUsize::new(cols).unwrap(),
            num_iterations,
        )
    }

    #[test]
    fn derived_constants() {
        let params = Parameters::new(config(4, 4, 10)).unwrap();
        assert_eq!(params.dx(), 0.25);
        assert_eq!(params.dt(), 0.0125);
        assert!((params.diffusion_number() - 0.2).abs() < 1e-12);
        assert_eq!(params.field_shape(), [6, 4]);
        assert_eq!(params.global_rows(), 4);
        assert_eq!(params.global_cols(), 4);
        assert!((params.final_time() - 0.125).abs() < 1e-12);
        assert_eq!(params.report_interval(), 1000);
    }

    #[test]
    fn topology_scales_global_rows() {
        let params = Parameters::new(config(8, 5, 1))
            .unwrap()
            .with_topology(Topology::new(2, 3));
        assert_eq!(params.global_rows(), 24);
        assert_eq!(params.topology().position(), 2);
        assert_eq!(params.field_shape(), [10, 5]);
    }

    #[test]
    fn default_time_step_is_stable() {
        for rows in [2, 3, 17, 1000] {
            let params = Parameters::new(config(rows, 3, 1)).unwrap();
            assert!(4.0 * params.diffusion_number() < 1.0);
        }
    }

    #[test]
    fn report_iterations() {
        let params = Parameters::new(Config {
            report_interval: NonZeroUsize::new(3).unwrap(),
            ..config(4, 4, 10)
        })
        .unwrap();
        let reported = (0..10)
            .filter(|&it| params.is_report_iteration(it))
            .collect::<Vec<_>>();
        assert_eq!(reported, [0, 3, 6, 9]);
    }

    #[test]
    fn bad_configurations() {
        assert_eq!(Parameters::new(config(1, 4, 1)), Err(Error::TooFewRows(1)));
        assert_eq!(Parameters::new(config(4, 2, 1)), Err(Error::TooFewCols(2)));
        assert!(matches!(
            Parameters::new(Config {
                time_step: Some(-1.0),
                ..config(4, 4, 1)
            }),
            Err(Error::BadTimeStep(_))
        ));
        assert!(matches!(
            Parameters::new(Config {
                time_step: Some(0.0625),
                ..config(4, 4, 1)
            }),
            Err(Error::Unstable { .. })
        ));
    }
}
