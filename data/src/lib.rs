//! Data model of the distributed heat equation simulation

pub mod field;
pub mod grid;
pub mod output;
pub mod parameters;
pub mod topology;

/// Computation precision
pub type Precision = f64;
