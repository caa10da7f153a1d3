//! Message passing between the ranks of a linear decomposition chain
//!
//! The simulation engine only relies on the [`Communicator`] trait. This crate
//! also provides [`LocalGroup`], an implementation where every rank is a thread
//! of the current process and ranks only share data through messages.

pub mod local;

pub use local::{LocalComm, LocalGroup};

use data::{topology::Topology, Precision};
use thiserror::Error;

/// Message tag, used to tell apart messages exchanged by the same two ranks
///
/// Tags above [`Tag::MAX_USER`] are reserved for collective operations.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Tag(pub u16);
//
impl Tag {
    /// Highest tag value that point-to-point users may pick
    pub const MAX_USER: u16 = u16::MAX - 16;

    /// Tag of partial sums sent to the root of a reduction
    pub(crate) const REDUCE: Self = Self(u16::MAX);

    /// Tag of barrier arrival and release notifications
    pub(crate) const BARRIER: Self = Self(u16::MAX - 1);

    /// Check that a tag is not reserved for collective operations
    pub(crate) fn check_user(self) -> Result<Self> {
        if self.0 <= Self::MAX_USER {
            Ok(self)
        } else {
            Err(Error::ReservedTag(self))
        }
    }
}

/// Process group primitives needed by the simulation
///
/// Point-to-point messages between two ranks are matched by tag, and messages
/// with the same source and tag are received in the order where they were
/// sent. Sends never wait for the matching receive to be posted.
pub trait Communicator {
    /// Position of this rank in the chain
    fn topology(&self) -> Topology;

    /// Send values to rank `dest`
    ///
    /// Tags above [`Tag::MAX_USER`] are rejected.
    fn send(&self, dest: usize, tag: Tag, values: &[Precision]) -> Result<()>;

    /// Receive values from rank `source` into `buffer`
    ///
    /// Blocks until a message with the right tag has been sent by `source`.
    /// Tags above [`Tag::MAX_USER`] are rejected.
    fn receive_into(&self, source: usize, tag: Tag, buffer: &mut [Precision]) -> Result<()>;

    /// Sum `value` across all ranks
    ///
    /// The sum is only returned on rank `root`, other ranks get `None`. Every
    /// rank of the group must take part.
    fn reduce_sum(&self, value: Precision, root: usize) -> Result<Option<Precision>>;

    /// Wait for all ranks of the group to reach this point
    fn barrier(&self) -> Result<()>;
}

/// Things that can go wrong when communicating with other ranks
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// Tried to talk to a rank that does not exist
    #[error("rank {peer} is not part of a group of {count} ranks")]
    InvalidPeer { peer: usize, count: usize },

    /// Peer rank has stopped communicating
    #[error("rank {0} has left the process group")]
    Disconnected(usize),

    /// Tag is reserved for collective operations
    #[error("{0:?} is reserved for collective operations")]
    ReservedTag(Tag),

    /// Received message does not fit the receive buffer
    #[error("expected a message of {expected} values, received {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Result type for communication operations
pub type Result<T> = std::result::Result<T, Error>;
