//! Dirichlet boundary conditions
//!
//! Boundary values live in cells that the stencil reads but never writes: the
//! first and last column of every row, plus the halo rows of the ranks at the
//! ends of the decomposition chain. Since the input field of a step is the
//! output field of the step before, these cells must be set again before every
//! read.

use data::{field::Field, grid::GridRange, parameters::Parameters, Precision};

/// Value of the leading edge of the global domain (first halo row of rank 0)
pub const LEADING_EDGE: Precision = 1.0;

/// Value of every other edge of the global domain
pub const COLD_EDGE: Precision = 0.0;

/// Set the boundary values that the stencil reads when updating `range`
///
/// For every cell `[row, col]` of the range...
///
/// - If `col == 1`, the cell at `[row, 0]` is set to [`COLD_EDGE`].
/// - If `col == cols - 2`, the cell at `[row, cols - 1]` is set to [`COLD_EDGE`].
/// - On the first rank, if `row == 1`, the cell at `[0, col]` is set to
///   [`LEADING_EDGE`].
/// - On the last rank, if `row == local_rows`, the cell at
///   `[local_rows + 1, col]` is set to [`COLD_EDGE`].
///
/// Injection is idempotent.
pub fn inject(source: &mut Field, range: &GridRange, params: &Parameters) {
    assert_eq!(source.shape(), params.field_shape());
    let cols = params.cols();
    let last_row = params.local_rows();
    let topology = params.topology();

    for row in range.rows.clone() {
        if range.cols.contains(&1) {
            source[[row, 0]] = COLD_EDGE;
        }
        if range.cols.contains(&(cols - 2)) {
            source[[row, cols - 1]] = COLD_EDGE;
        }
    }
    if topology.is_first() && range.rows.contains(&1) {
        for col in range.cols.clone() {
            source[[0, col]] = LEADING_EDGE;
        }
    }
    if topology.is_last() && range.rows.contains(&last_row) {
        for col in range.cols.clone() {
            source[[last_row + 1, col]] = COLD_EDGE;
        }
    }
}
