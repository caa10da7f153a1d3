//! Benchmarking utilities
//!
//! Please consider using the macros provided by this crate instead of calling
//! these implementation details directly.

use crate::{stencil::stencil, Backend};
use clap::{Args, Command, FromArgMatches};
use criterion::{BenchmarkId, Criterion, Throughput};
use data::{
    field::Evolving,
    grid::GridRange,
    parameters::{Config, Parameters},
};
use log::debug;
use std::{hint::black_box, num::NonZeroUsize, sync::Once};

/// Re-export criterion for the criterion_benchmark macro
pub use criterion;

// Make sure env_logger is only initialized once
fn init_logger() {
    static INIT_LOGGER: Once = Once::new();
    INIT_LOGGER.call_once(env_logger::init);
}

/// Common criterion benchmark for all stencil backends
/// Use via the criterion_benchmark macro
pub fn criterion_benchmark<B: Backend>(c: &mut Criterion, backend_name: &str) {
    init_logger();

    let args = B::CliArgs::from_arg_matches(
        &B::CliArgs::augment_args(Command::default().no_binary_name(true))
            .get_matches_from(None::<&str>),
    )
    .expect("Failed to parse arguments from defaults & environment");
    let backend = B::new(black_box(args)).expect("Failed to set up compute backend");
    debug!("Benchmarking the {backend_name} backend");

    let mut group = c.benchmark_group(format!("{backend_name}::stencil"));
    for size_pow2 in 3..=11 {
        let size = NonZeroUsize::new(2usize.pow(size_pow2)).expect("Size should be nonzero");
        let params = Parameters::new(Config::new(size, size, 1))
            .expect("Square grids should have valid parameters");
        let range = GridRange::interior(&params);
        debug!("Benchmarking a {size}x{size} grid ({} cells updated per step)", range.len());
        let mut fields = Evolving::for_parameters(&params);
        fields.input_mut().fill(0.5);

        group.throughput(Throughput::Elements(range.len() as u64));
        group.bench_function(
            BenchmarkId::from_parameter(format!("{size}x{size}elems")),
            |b| {
                b.iter(|| {
                    black_box(stencil(&backend, &mut fields, &range, &params));
                    fields.flip();
                });
            },
        );
    }
    group.finish();
}
