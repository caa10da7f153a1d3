//! Collective write of the final field
//!
//! All ranks write into one shared file whose layout is described in
//! [`data::output`]. The first rank creates the file and writes its header,
//! then every rank writes its own block of values at an offset that only
//! depends on its chain position.

use crate::{Error, Result};
use comm::Communicator;
use data::{
    field::Field,
    output::{self, Header, DIMENSIONS_OFFSET, TIME_OFFSET},
    parameters::Parameters,
};
use log::debug;
use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
};

/// Write the local part of `field` (halo rows excluded) into the shared
/// output file at `path`
///
/// This is a collective operation: every rank of the group must call it with
/// the same path. It only returns once the data of all ranks has been written
/// and synced to storage.
pub fn write_collective(
    comm: &impl Communicator,
    path: &Path,
    params: &Parameters,
    field: &Field,
) -> Result<()> {
    assert_eq!(field.shape(), params.field_shape());
    let topology = params.topology();
    let header = Header::new(params);

    // The first rank creates and sizes the file, others wait for it
    let file = if topology.is_first() {
        let file_len = header.file_len().ok_or(Error::OutputTooLarge)?;
        debug!("Creating {file_len}-byte output file {}", path.display());
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.set_len(file_len as u64)?;
        comm.barrier()?;
        file
    } else {
        comm.barrier()?;
        OpenOptions::new().write(true).open(path)?
    };

    // Write the header and this rank's block concurrently
    let block = output::encode_values(field.interior());
    let block_offset = output::block_offset(params);
    debug!(
        "Rank {} writes {} bytes at offset {block_offset}",
        topology.position(),
        block.len()
    );
    let file = &file;
    std::thread::scope(|s| {
        let header_writes = topology.is_first().then(|| {
            [
                s.spawn(move || write_all_at(file, header.dimensions_bytes(), DIMENSIONS_OFFSET)),
                s.spawn(move || write_all_at(file, header.time_bytes(), TIME_OFFSET)),
            ]
        });
        write_all_at(file, block, block_offset)?;
        for write in header_writes.into_iter().flatten() {
            write
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload))?;
        }
        Ok::<_, io::Error>(())
    })?;

    // The file is complete once every rank has flushed its writes
    file.sync_data()?;
    comm.barrier()?;
    Ok(())
}

/// Write a whole buffer at a given offset of a file
#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

/// Write a whole buffer at a given offset of a file
#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(written) => {
                buf = &buf[written..];
                offset += written as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
