//! Pick the best compute backend allowed by enabled crate features, expose it
//! as a DefaultBackend typedef.

cfg_if::cfg_if! {
    if #[cfg(feature = "compute_parallel")] {
        pub type DefaultBackend = compute_parallel::Parallel;
    } else if #[cfg(feature = "compute_naive")] {
        pub type DefaultBackend = compute_naive::Sequential;
    } else {
        std::compile_error!("Please enable at least one compute backend via crate features");
    }
}

/// CLI arguments of the selected backend
pub type BackendArgs = <DefaultBackend as compute::Backend>::CliArgs;
