//! Binary layout of the simulation output file
//!
//! The file starts with a fixed-size header...
//!
//! | offset | size | content                          |
//! |--------|------|----------------------------------|
//! | 0      | 8    | global row count (u64)           |
//! | 8      | 8    | global column count (u64)        |
//! | 16     | 8    | final simulated time (f64)       |
//!
//! ...followed by the field values of every rank, halo rows excluded, one
//! contiguous row-major block per rank in chain position order. All numbers
//! use the native byte order of the machine that ran the simulation.

use crate::{parameters::Parameters, Precision};
use bytemuck::{Pod, Zeroable};
use ndarray::{Array2, ArrayView2, Axis, ShapeError};
use std::{fs, io, path::Path};
use thiserror::Error;

/// Size of the file header in bytes
pub const HEADER_LEN: usize = std::mem::size_of::<Header>();

/// Offset of the grid dimensions within the file
pub const DIMENSIONS_OFFSET: u64 = std::mem::offset_of!(Header, rows) as u64;

/// Offset of the final simulated time within the file
pub const TIME_OFFSET: u64 = std::mem::offset_of!(Header, time) as u64;

/// Size of one field value in bytes
const VALUE_LEN: usize = std::mem::size_of::<Precision>();

/// Output file header, stored as is at the start of the file
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Header {
    /// Number of rows of the global domain
    pub rows: u64,

    /// Number of columns of the global domain
    pub cols: u64,

    /// Simulated time at the end of the run
    pub time: Precision,
}
//
impl Header {
    /// Header describing the outcome of a simulation run
    pub fn new(params: &Parameters) -> Self {
        Self {
            rows: params.global_rows() as u64,
            cols: params.global_cols() as u64,
            time: params.final_time(),
        }
    }

    /// Encoded grid dimensions, to be stored at [`DIMENSIONS_OFFSET`]
    pub fn dimensions_bytes(&self) -> &[u8] {
        &bytemuck::bytes_of(self)[DIMENSIONS_OFFSET as usize..TIME_OFFSET as usize]
    }

    /// Encoded final time, to be stored at [`TIME_OFFSET`]
    pub fn time_bytes(&self) -> &[u8] {
        &bytemuck::bytes_of(self)[TIME_OFFSET as usize..]
    }

    /// Encode the full header
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        bytemuck::cast(*self)
    }

    /// Decode a header
    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Self {
        bytemuck::pod_read_unaligned(bytes)
    }

    /// Expected total file size in bytes, if it fits in memory addresses
    pub fn file_len(&self) -> Option<usize> {
        usize::try_from(self.rows)
            .ok()?
            .checked_mul(usize::try_from(self.cols).ok()?)?
            .checked_mul(VALUE_LEN)?
            .checked_add(HEADER_LEN)
    }
}

/// Offset of this rank's block of values within the output file
pub fn block_offset(params: &Parameters) -> u64 {
    (HEADER_LEN + params.topology().position() * block_len(params)) as u64
}

/// Size of one rank's block of values in bytes
pub fn block_len(params: &Parameters) -> usize {
    params.local_rows() * params.cols() * VALUE_LEN
}

/// Encode field values for storage
pub fn encode_values(values: &[Precision]) -> &[u8] {
    bytemuck::cast_slice(values)
}

/// Contents of an output file
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    /// File header
    header: Header,

    /// Values of the global domain
    values: Array2<Precision>,
}
//
impl Output {
    /// Read an output file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::decode(&fs::read(path)?)
    }

    /// Decode the contents of an output file
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header_bytes: &[u8; HEADER_LEN] = bytes
            .get(..HEADER_LEN)
            .and_then(|header| header.try_into().ok())
            .ok_or(Error::BadLength {
                expected: None,
                actual: bytes.len(),
            })?;
        let header = Header::decode(header_bytes);
        let expected = header.file_len();
        if expected != Some(bytes.len()) {
            return Err(Error::BadLength {
                expected,
                actual: bytes.len(),
            });
        }
        let values = bytemuck::pod_collect_to_vec::<u8, Precision>(&bytes[HEADER_LEN..]);
        let values = Array2::from_shape_vec((header.rows as usize, header.cols as usize), values)?;
        Ok(Self { header, values })
    }

    /// File header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Values of the global domain, in global row order
    pub fn values(&self) -> ArrayView2<'_, Precision> {
        self.values.view()
    }

    /// Split the values into the blocks written by each of `num_ranks` ranks
    ///
    /// # Panics
    ///
    /// If the global rows cannot be evenly split across `num_ranks`.
    pub fn blocks(&self, num_ranks: usize) -> impl Iterator<Item = ArrayView2<'_, Precision>> {
        let rows = self.values.nrows();
        assert!(
            num_ranks > 0 && rows % num_ranks == 0,
            "{rows} rows cannot be evenly split across {num_ranks} ranks"
        );
        self.values.axis_chunks_iter(Axis(0), rows / num_ranks)
    }
}

/// Things that can go wrong when reading an output file
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read the file
    #[error("failed to read output file")]
    Io(#[from] io::Error),

    /// File size does not match the header
    #[error("output file is {actual} bytes long, expected {expected:?} bytes")]
    BadLength {
        expected: Option<usize>,
        actual: usize,
    },

    /// Values do not form the expected grid
    #[error("output values do not match the header's grid shape")]
    Shape(#[from] ShapeError),
}

/// Result type for output file reading
pub type Result<T> = std::result::Result<T, Error>;
