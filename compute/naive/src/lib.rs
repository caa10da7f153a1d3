//! Naive implementation of the stencil backend
//!
//! Cells of a range are processed one after another on the calling thread, by
//! walking the range's flattened 1D index space.

use compute::{Backend, NoArgs};
use data::{field::Field, grid::GridRange, Precision};
use std::convert::Infallible;

/// Sequential stencil backend
#[derive(Copy, Clone, Debug, Default)]
pub struct Sequential;
//
impl Backend for Sequential {
    type CliArgs = NoArgs;

    type Error = Infallible;

    fn new(_args: NoArgs) -> Result<Self, Infallible> {
        Ok(Self)
    }

    fn update_reduce<F>(&self, output: &mut Field, range: &GridRange, cell: F) -> Precision
    where
        F: Fn([usize; 2], &mut Precision) -> Precision + Send + Sync,
    {
        (0..range.len())
            .map(|idx| {
                let pos = range.position(idx);
                cell(pos, &mut output[pos])
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visits_every_cell_once() {
        let mut output = Field::zeros([5, 4]);
        let range = GridRange::new(1..4, 1..3);
        let sum = Sequential.update_reduce(&mut output, &range, |[x, y], out| {
            *out += 1.0;
            (10 * x + y) as Precision
        });
        assert_eq!(sum, 11.0 + 12.0 + 21.0 + 22.0 + 31.0 + 32.0);
        for x in 0..5 {
            for y in 0..4 {
                let expected = if range.contains([x, y]) { 1.0 } else { 0.0 };
                assert_eq!(output[[x, y]], expected);
            }
        }
    }
}
