//! Parallel implementation of the stencil backend
//!
//! Rows of a range are distributed across rayon tasks, and so are the cells of
//! each row, so that even single-row boundary strips get processed in
//! parallel. Each task writes its own output cells and only reads the input
//! field, so no synchronization is needed beyond the final sum.

mod args;

pub use args::ParallelArgs;

use compute::Backend;
use data::{field::Field, grid::GridRange, Precision};
use log::debug;
use rayon::{prelude::*, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;

/// Multithreaded stencil backend
#[derive(Copy, Clone, Debug)]
pub struct Parallel {
    /// Number of grid cells below which splitting work further is not
    /// considered worthwhile
    min_cells_per_task: usize,
}
//
impl Backend for Parallel {
    type CliArgs = ParallelArgs;

    type Error = Error;

    fn new(args: ParallelArgs) -> Result<Self, Error> {
        if let Some(num_threads) = args.num_threads {
            debug!("Setting up a global thread pool with {num_threads} threads");
            ThreadPoolBuilder::new()
                .num_threads(num_threads.into())
                .build_global()?;
        }
        Ok(Self {
            min_cells_per_task: args.min_cells_per_task.into(),
        })
    }

    fn update_reduce<F>(&self, output: &mut Field, range: &GridRange, cell: F) -> Precision
    where
        F: Fn([usize; 2], &mut Precision) -> Precision + Send + Sync,
    {
        let cols = output.cols();
        assert!(
            range.cols.end <= cols,
            "columns {:?} are out of bounds 0..{cols}",
            range.cols
        );
        let [first_row, first_col] = [range.rows.start, range.cols.start];
        let row_cols = range.cols.clone();
        let min_len = self.min_cells_per_task;
        let cell = &cell;
        output
            .rows_mut(range.rows.clone())
            .par_chunks_mut(cols)
            .enumerate()
            .flat_map(|(row_offset, row)| {
                row[row_cols.clone()]
                    .par_iter_mut()
                    .with_min_len(min_len)
                    .enumerate()
                    .map(move |(col_offset, out)| {
                        cell([first_row + row_offset, first_col + col_offset], out)
                    })
            })
            .sum()
    }
}

/// Things that can go wrong when setting up the parallel backend
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to configure thread pool
    #[error("failed to configure thread pool")]
    ThreadPool(#[from] ThreadPoolBuildError),
}
