//! Common facilities shared by all compute backends
//!
//! The stencil computation itself is the same for every backend. What differs
//! is how its cells are distributed across the compute resources of a rank,
//! which is abstracted by the [`Backend`] trait.

#[cfg(feature = "criterion")]
pub mod benchmark;
pub mod boundary;
pub mod stencil;

use clap::Args;
use data::{field::Field, grid::GridRange, Precision};

/// Data-parallel reduction over a rectangular range of grid cells
pub trait Backend: Sized + Sync {
    /// Backend-specific CLI arguments
    type CliArgs: Args;

    /// Things that can go wrong when setting up the backend
    type Error: std::error::Error + Send + Sync + 'static;

    /// Set up the backend
    fn new(args: Self::CliArgs) -> Result<Self, Self::Error>;

    /// Call `cell` on every cell of `range`, along with a mutable reference to
    /// the matching value of `output`, and sum the results
    ///
    /// Cells may be processed in any order and concurrently, so the order of
    /// summation is unspecified.
    ///
    /// # Panics
    ///
    /// If `range` is not contained within `output`.
    fn update_reduce<F>(&self, output: &mut Field, range: &GridRange, cell: F) -> Precision
    where
        F: Fn([usize; 2], &mut Precision) -> Precision + Send + Sync;
}

/// Use this as [`Backend::CliArgs`] if the backend has no arguments
#[derive(Args, Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct NoArgs {}

/// Macro that generates a complete criterion benchmark harness for you
#[macro_export]
#[cfg(feature = "criterion")]
macro_rules! criterion_benchmark {
    ($backend:ty) => {
        fn criterion_benchmark(c: &mut $crate::benchmark::criterion::Criterion) {
            $crate::benchmark::criterion_benchmark::<$backend>(c, stringify!($backend))
        }
        $crate::benchmark::criterion::criterion_group!(benches, criterion_benchmark);
        $crate::benchmark::criterion::criterion_main!(benches);
    };
}
