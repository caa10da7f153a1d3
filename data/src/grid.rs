//! Grid indexing and rectangular ranges of grid cells
//!
//! Fields are stored in row-major order, rows being laid out along the axis on
//! which the global domain is decomposed across ranks.

use crate::parameters::Parameters;
use std::ops::Range;

/// Linear offset of the cell at `[row, col]` in a row-major grid of `shape`
///
/// # Panics
///
/// If the position is outside of the grid. This is a programming error.
#[inline]
pub fn index([rows, cols]: [usize; 2], [row, col]: [usize; 2]) -> usize {
    assert!(row < rows, "row {row} is out of bounds 0..{rows}");
    assert!(col < cols, "column {col} is out of bounds 0..{cols}");
    row * cols + col
}

/// Position of the cell at linear `offset` in a row-major grid of `shape`
///
/// This is the inverse of [`index()`].
///
/// # Panics
///
/// If the offset is outside of the grid.
#[inline]
pub fn position([rows, cols]: [usize; 2], offset: usize) -> [usize; 2] {
    assert!(
        offset < rows * cols,
        "offset {offset} is out of bounds for a {rows}x{cols} grid"
    );
    [offset / cols, offset % cols]
}

/// Rectangular range of grid cells
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GridRange {
    /// Rows covered by the range
    pub rows: Range<usize>,

    /// Columns covered by the range
    pub cols: Range<usize>,
}
//
impl GridRange {
    /// Range covering `rows` × `cols`
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { rows, cols }
    }

    /// Range covering a single cell
    pub fn single([row, col]: [usize; 2]) -> Self {
        Self::new(row..row + 1, col..col + 1)
    }

    /// Rows of the local field that depend on no halo data
    pub fn interior(params: &Parameters) -> Self {
        Self::new(2..params.local_rows(), Self::computed_cols(params))
    }

    /// Row that is next to the halo shared with the lower neighbor
    pub fn lower_strip(params: &Parameters) -> Self {
        Self::new(1..2, Self::computed_cols(params))
    }

    /// Row that is next to the halo shared with the higher neighbor
    pub fn higher_strip(params: &Parameters) -> Self {
        let last = params.local_rows();
        Self::new(last..last + 1, Self::computed_cols(params))
    }

    /// Columns that are updated by the stencil, Dirichlet columns excluded
    fn computed_cols(params: &Parameters) -> Range<usize> {
        1..params.cols() - 1
    }

    /// Number of columns covered by the range
    pub fn width(&self) -> usize {
        self.cols.len()
    }

    /// Number of cells covered by the range
    pub fn len(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    /// Truth that the range covers no cell
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truth that the range covers a given cell
    pub fn contains(&self, [row, col]: [usize; 2]) -> bool {
        self.rows.contains(&row) && self.cols.contains(&col)
    }

    /// Position of the `idx`-th cell of the range, flattened in row-major order
    #[inline]
    pub fn position(&self, idx: usize) -> [usize; 2] {
        debug_assert!(idx < self.len());
        let width = self.width();
        [idx / width + self.rows.start, idx % width + self.cols.start]
    }

    /// Iterate over the cells of the range in row-major order
    pub fn iter(&self) -> impl Iterator<Item = [usize; 2]> + '_ {
        (0..self.len()).map(|idx| self.position(idx))
    }
}
