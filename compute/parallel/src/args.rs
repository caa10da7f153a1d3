//! CLI arguments

use clap::Args;
use std::num::NonZeroUsize;

/// CLI parameters for the multithreaded implementation
#[derive(Args, Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct ParallelArgs {
    /// Number of processing threads
    ///
    /// The thread pool is shared by all ranks of a local process group. By
    /// default, there is one thread per CPU core.
    #[arg(short = 'j', long, env)]
    pub num_threads: Option<NonZeroUsize>,

    /// Minimal number of grid cells per parallel task
    ///
    /// There is a granularity compromise between exposing opportunities for
    /// parallelism and keeping the overhead of task scheduling low compared
    /// to the cost of updating cells. This is the tuning knob that lets you
    /// fine-tune this compromise.
    #[arg(long, env, default_value_t = NonZeroUsize::new(1024).unwrap())]
    pub min_cells_per_task: NonZeroUsize,
}
