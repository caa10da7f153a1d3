//! Five-point explicit finite-difference stencil of the heat equation

use crate::{boundary, Backend};
use data::{field::Evolving, grid::GridRange, parameters::Parameters, Precision};

/// Advance the cells of `range` by one time step
///
/// Boundary values are first injected into the input field, then the output
/// field is computed from the input field as...
///
/// ```text
/// out[x, y] = (1 - 4γ)·in[x, y] + γ·(in[x+1, y] + in[x-1, y] + in[x, y+1] + in[x, y-1])
/// ```
///
/// ...where γ is the diffusion number. The result is the energy of the updated
/// cells, i.e. the sum of `0.5·out[x, y]²·dx²` over the range.
///
/// A single cell can be updated using a [`GridRange::single()`] range.
///
/// # Panics
///
/// If the fields do not have the shape expected by `params`, or if `range`
/// covers halo rows or Dirichlet columns.
pub fn stencil(
    backend: &impl Backend,
    fields: &mut Evolving,
    range: &GridRange,
    params: &Parameters,
) -> Precision {
    let [rows, cols] = params.field_shape();
    assert_eq!(fields.shape(), [rows, cols], "fields do not match parameters");
    if range.is_empty() {
        return 0.0;
    }
    assert!(
        range.rows.start >= 1 && range.rows.end < rows,
        "rows {:?} reach into the halos",
        range.rows
    );
    assert!(
        range.cols.start >= 1 && range.cols.end < cols,
        "columns {:?} reach into the Dirichlet edges",
        range.cols
    );

    let (input, output) = fields.in_out();
    boundary::inject(input, range, params);
    let input = &*input;

    let gamma = params.diffusion_number();
    let center_weight = 1.0 - 4.0 * gamma;
    let cell_area = params.dx() * params.dx();
    backend.update_reduce(output, range, |[x, y], out| {
        let neighbors =
            input[[x + 1, y]] + input[[x - 1, y]] + input[[x, y + 1]] + input[[x, y - 1]];
        let value = center_weight * input[[x, y]] + gamma * neighbors;
        *out = value;
        0.5 * value * value * cell_area
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoArgs;
    use data::{field::Field, parameters::Config, topology::Topology};
    use std::{convert::Infallible, num::NonZeroUsize};

    /// Minimal sequential backend
    struct Serial;
    //
    impl Backend for Serial {
        type CliArgs = NoArgs;
        type Error = Infallible;

        fn new(_args: NoArgs) -> Result<Self, Infallible> {
            Ok(Self)
        }

        fn update_reduce<F>(&self, output: &mut Field, range: &GridRange, cell: F) -> Precision
        where
            F: Fn([usize; 2], &mut Precision) -> Precision + Send + Sync,
        {
            range.iter().map(|pos| cell(pos, &mut output[pos])).sum()
        }
    }

    fn params(local_rows: usize, cols: usize, topology: Topology) -> Parameters {
        Parameters::new(Config::new(
            NonZeroUsize::new(local_rows).unwrap(),
            NonZeroUsize::new(cols).unwrap(),
            1,
        ))
        .unwrap()
        .with_topology(topology)
    }

    #[test]
    fn zero_field_has_zero_energy() {
        let params = params(6, 5, Topology::new(1, 3));
        let mut fields = Evolving::for_parameters(&params);
        for range in [
            GridRange::lower_strip(&params),
            GridRange::higher_strip(&params),
            GridRange::interior(&params),
            GridRange::single([3, 2]),
            GridRange::new(2..2, 1..4),
        ] {
            assert_eq!(stencil(&Serial, &mut fields, &range, &params), 0.0);
        }
        assert!(fields.output().interior().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn explicit_update_formula() {
        let params = params(4, 5, Topology::new(1, 3));
        let gamma = params.diffusion_number();
        let mut fields = Evolving::for_parameters(&params);
        let input_value = |[x, y]: [usize; 2]| ((x * 7 + y * 3) % 5) as Precision / 4.0;
        {
            let input = fields.input_mut();
            for x in 0..6 {
                for y in 1..4 {
                    input[[x, y]] = input_value([x, y]);
                }
            }
        }
        let range = GridRange::new(1..5, 1..4);
        let energy = stencil(&Serial, &mut fields, &range, &params);

        let mut expected_energy = 0.0;
        for [x, y] in range.iter() {
            // Dirichlet columns are zero, halos belong to the neighbors
            let value_at = |[x, y]: [usize; 2]| {
                if y == 0 || y == 4 {
                    0.0
                } else {
                    input_value([x, y])
                }
            };
            let expected = (1.0 - 4.0 * gamma) * value_at([x, y])
                + gamma
                    * (value_at([x + 1, y])
                        + value_at([x - 1, y])
                        + value_at([x, y + 1])
                        + value_at([x, y - 1]));
            let actual = fields.output()[[x, y]];
            assert!((actual - expected).abs() < 1e-12, "at [{x}, {y}]");
            expected_energy += 0.5 * expected * expected * params.dx() * params.dx();
        }
        assert!((energy - expected_energy).abs() < 1e-12);
    }

    #[test]
    fn single_cell_matches_range() {
        let params = params(4, 6, Topology::single());
        let mut by_range = Evolving::for_parameters(&params);
        by_range.input_mut()[[2, 2]] = 1.0;
        let mut by_cell = by_range.clone();

        let range = GridRange::interior(&params);
        let range_energy = stencil(&Serial, &mut by_range, &range, &params);
        let cell_energy = range
            .iter()
            .map(|pos| stencil(&Serial, &mut by_cell, &GridRange::single(pos), &params))
            .sum::<Precision>();
        assert_eq!(by_range, by_cell);
        assert!((range_energy - cell_energy).abs() < 1e-15);
    }

    #[test]
    fn leading_edge_heats_first_row() {
        let params = params(4, 4, Topology::single());
        let mut fields = Evolving::for_parameters(&params);
        let energy = stencil(&Serial, &mut fields, &GridRange::lower_strip(&params), &params);
        let gamma = params.diffusion_number();
        assert_eq!(fields.output().row(1), [0.0, gamma, gamma, 0.0]);
        let expected = 2.0 * 0.5 * gamma * gamma * params.dx() * params.dx();
        assert!((energy - expected).abs() < 1e-15);
    }

    #[test]
    #[should_panic]
    fn halo_rows_are_not_computed() {
        let params = params(4, 4, Topology::single());
        let mut fields = Evolving::for_parameters(&params);
        stencil(&Serial, &mut fields, &GridRange::new(0..1, 1..3), &params);
    }
}
