//! Halo exchange with the neighbors of the decomposition chain
//!
//! The exchange is split in two halves, one per neighbor, each of which is
//! immediately followed by the update of the row that depends on the halo it
//! just received. The halves are independent of each other and can be invoked
//! in any order, so that the communication latency of one direction overlaps
//! with computations of the other direction.
//!
//! The lower half sends before receiving, so a rank waiting on its higher
//! neighbor is always eventually served. Sends never wait for the matching
//! receive to be posted.

use comm::{Communicator, Tag};
use compute::{stencil::stencil, Backend};
use data::{
    field::{Evolving, Field},
    grid::GridRange,
    parameters::Parameters,
    Precision,
};
use log::trace;

/// Tag of rows sent to the lower neighbor
pub const TO_LOWER: Tag = Tag(0);

/// Tag of rows sent to the higher neighbor
pub const TO_HIGHER: Tag = Tag(1);

/// Exchange halos with the lower neighbor, if any, then update the row next to
/// the lower halo and return its energy
pub fn toward_lower(
    comm: &impl Communicator,
    backend: &impl Backend,
    fields: &mut Evolving,
    params: &Parameters,
) -> comm::Result<Precision> {
    exchange_lower(comm, fields.input_mut(), params)?;
    Ok(stencil(
        backend,
        fields,
        &GridRange::lower_strip(params),
        params,
    ))
}

/// Exchange halos with the higher neighbor, if any, then update the row next
/// to the higher halo and return its energy
pub fn toward_higher(
    comm: &impl Communicator,
    backend: &impl Backend,
    fields: &mut Evolving,
    params: &Parameters,
) -> comm::Result<Precision> {
    exchange_higher(comm, fields.input_mut(), params)?;
    Ok(stencil(
        backend,
        fields,
        &GridRange::higher_strip(params),
        params,
    ))
}

/// Send the first owned row to the lower neighbor and receive its last owned
/// row into the lower halo
pub fn exchange_lower(
    comm: &impl Communicator,
    field: &mut Field,
    params: &Parameters,
) -> comm::Result<()> {
    let Some(lower) = params.topology().lower() else {
        return Ok(());
    };
    trace!(
        "Rank {} exchanges halos with rank {lower}",
        params.topology().position()
    );
    comm.send(lower, TO_LOWER, field.row(1))?;
    comm.receive_into(lower, TO_HIGHER, field.row_mut(0))
}

/// Receive the first owned row of the higher neighbor into the higher halo and
/// send it the last owned row
pub fn exchange_higher(
    comm: &impl Communicator,
    field: &mut Field,
    params: &Parameters,
) -> comm::Result<()> {
    let Some(higher) = params.topology().higher() else {
        return Ok(());
    };
    trace!(
        "Rank {} exchanges halos with rank {higher}",
        params.topology().position()
    );
    let last = params.local_rows();
    comm.receive_into(higher, TO_LOWER, field.row_mut(last + 1))?;
    comm.send(higher, TO_HIGHER, field.row(last))
}
