//! Scalar field storage

use crate::{grid, parameters::Parameters, Precision};
use std::ops::{Index, IndexMut, Range};

/// Scalar field over a rank's local grid, including one halo row on each side
/// of the decomposition axis
///
/// Storage is a flat row-major buffer which can only be accessed through
/// bounds-checked 2D coordinates or whole rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Number of rows and columns, halo rows included
    shape: [usize; 2],

    /// Field values
    values: Box<[Precision]>,
}
//
impl Field {
    /// Set up an all-zeros field of a given shape
    pub fn zeros(shape: [usize; 2]) -> Self {
        Self {
            shape,
            values: vec![0.0; shape[0] * shape[1]].into_boxed_slice(),
        }
    }

    /// Set up an all-zeros field sized for this rank's share of the domain
    pub fn for_parameters(params: &Parameters) -> Self {
        Self::zeros(params.field_shape())
    }

    /// Number of rows and columns, halo rows included
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    /// Number of rows, halo rows included
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// Access a row of the field
    pub fn row(&self, row: usize) -> &[Precision] {
        let start = grid::index(self.shape, [row, 0]);
        &self.values[start..start + self.cols()]
    }

    /// Mutably access a row of the field
    pub fn row_mut(&mut self, row: usize) -> &mut [Precision] {
        let start = grid::index(self.shape, [row, 0]);
        let cols = self.cols();
        &mut self.values[start..start + cols]
    }

    /// Mutably access a set of consecutive rows, as one row-major slice
    pub fn rows_mut(&mut self, rows: Range<usize>) -> &mut [Precision] {
        assert!(
            rows.start <= rows.end && rows.end <= self.rows(),
            "rows {rows:?} are out of bounds 0..{}",
            self.rows()
        );
        let cols = self.cols();
        &mut self.values[rows.start * cols..rows.end * cols]
    }

    /// Values of the rows owned by this rank, halo rows excluded
    pub fn interior(&self) -> &[Precision] {
        let cols = self.cols();
        &self.values[cols..self.values.len() - cols]
    }

    /// Set every value of the field, halos included
    pub fn fill(&mut self, value: Precision) {
        self.values.fill(value);
    }
}
//
impl Index<[usize; 2]> for Field {
    type Output = Precision;

    #[inline]
    fn index(&self, pos: [usize; 2]) -> &Precision {
        &self.values[grid::index(self.shape, pos)]
    }
}
//
impl IndexMut<[usize; 2]> for Field {
    #[inline]
    fn index_mut(&mut self, pos: [usize; 2]) -> &mut Precision {
        &mut self.values[grid::index(self.shape, pos)]
    }
}

/// Pair of fields where one acts as an input and the other as an output
///
/// Each time step reads the input field and writes the output field, then
/// [`flip()`](Self::flip) makes the output become the input of the next step.
#[derive(Clone, Debug, PartialEq)]
pub struct Evolving([Field; 2]);
//
impl Evolving {
    /// Set up all-zeros input and output fields of a given shape
    pub fn zeros(shape: [usize; 2]) -> Self {
        Self([Field::zeros(shape), Field::zeros(shape)])
    }

    /// Set up all-zeros fields sized for this rank's share of the domain
    pub fn for_parameters(params: &Parameters) -> Self {
        Self::zeros(params.field_shape())
    }

    /// Shape of the fields, halo rows included
    pub fn shape(&self) -> [usize; 2] {
        self.0[0].shape()
    }

    /// Access the input field
    ///
    /// After a step has been performed and the fields have been flipped, this
    /// is the most recent result.
    pub fn input(&self) -> &Field {
        &self.0[0]
    }

    /// Mutably access the input field
    pub fn input_mut(&mut self) -> &mut Field {
        &mut self.0[0]
    }

    /// Access the output field
    pub fn output(&self) -> &Field {
        &self.0[1]
    }

    /// Access the input and output field
    ///
    /// The input is mutable because boundary conditions are injected into it
    /// right before it is read.
    pub fn in_out(&mut self) -> (&mut Field, &mut Field) {
        let [input, output] = &mut self.0;
        (input, output)
    }

    /// Make the output field become the input one
    pub fn flip(&mut self) {
        let [input, output] = &mut self.0;
        std::mem::swap(input, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_contiguous() {
        let mut field = Field::zeros([4, 3]);
        field[[1, 0]] = 1.0;
        field[[1, 2]] = 2.0;
        field[[2, 1]] = 3.0;
        assert_eq!(field.row(1), [1.0, 0.0, 2.0]);
        assert_eq!(field.interior(), [1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        field.row_mut(3).copy_from_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(field[[3, 1]], 5.0);
        assert_eq!(field.rows_mut(2..4), [0.0, 3.0, 0.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_access() {
        let field = Field::zeros([4, 3]);
        let _ = field[[4, 0]];
    }

    #[test]
    fn flip_swaps_roles() {
        let mut fields = Evolving::zeros([4, 3]);
        {
            let (input, output) = fields.in_out();
            input.fill(1.0);
            output.fill(2.0);
        }
        fields.flip();
        assert!(fields.input().interior().iter().all(|&v| v == 2.0));
        assert!(fields.output().interior().iter().all(|&v| v == 1.0));
    }
}
