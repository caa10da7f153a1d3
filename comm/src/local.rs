//! Process group whose ranks are threads of the current process

use crate::{Communicator, Error, Result, Tag};
use crossbeam_channel::{Receiver, Sender};
use data::{topology::Topology, Precision};
use log::{debug, trace};
use std::{cell::RefCell, collections::VecDeque};

/// Message exchanged between two ranks
#[derive(Debug)]
struct Message {
    /// Tag used for matching on the receiver side
    tag: Tag,

    /// Payload
    values: Vec<Precision>,
}

/// Group of ranks that live in the current process
///
/// Each rank gets a [`LocalComm`] endpoint which is meant to be moved to its
/// own thread. Every ordered pair of ranks is connected by an unbounded
/// channel, so sends never block.
#[derive(Debug)]
pub struct LocalGroup;
//
impl LocalGroup {
    /// Set up a group of `count` ranks, returning their endpoints in chain order
    ///
    /// # Panics
    ///
    /// If `count` is zero.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(count: usize) -> Vec<LocalComm> {
        assert!(count > 0, "a process group needs at least one rank");
        debug!("Setting up a local process group of {count} ranks");

        // channels[source][dest]
        let channels = (0..count)
            .map(|_| {
                (0..count)
                    .map(|_| crossbeam_channel::unbounded())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        (0..count)
            .map(|position| LocalComm {
                topology: Topology::new(position, count),
                outboxes: (0..count)
                    .map(|dest| channels[position][dest].0.clone())
                    .collect(),
                inboxes: (0..count)
                    .map(|source| channels[source][position].1.clone())
                    .collect(),
                pending: RefCell::new((0..count).map(|_| VecDeque::new()).collect()),
            })
            .collect()
    }

    /// Run `rank_main` on every rank of a new group of `count` ranks, each in
    /// its own thread, and collect the results in chain order
    ///
    /// If any rank panics, the panic is propagated once all ranks are done.
    pub fn run<T: Send>(count: usize, rank_main: impl Fn(LocalComm) -> T + Sync) -> Vec<T> {
        let comms = Self::new(count);
        let rank_main = &rank_main;
        std::thread::scope(|s| {
            let handles = comms
                .into_iter()
                .map(|comm| s.spawn(move || rank_main(comm)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        })
    }
}

/// Endpoint of a rank within a [`LocalGroup`]
#[derive(Debug)]
pub struct LocalComm {
    /// Position of this rank
    topology: Topology,

    /// Channels towards each rank, indexed by destination
    outboxes: Vec<Sender<Message>>,

    /// Channels from each rank, indexed by source
    inboxes: Vec<Receiver<Message>>,

    /// Messages that were received before being asked for, indexed by source
    pending: RefCell<Vec<VecDeque<Message>>>,
}
//
impl LocalComm {
    /// Check that a rank is part of this group
    fn check_peer(&self, peer: usize) -> Result<()> {
        let count = self.topology.count();
        if peer < count {
            Ok(())
        } else {
            Err(Error::InvalidPeer { peer, count })
        }
    }

    /// Receive the next message from `source` that has a given tag
    fn receive(&self, source: usize, tag: Tag) -> Result<Vec<Precision>> {
        self.check_peer(source)?;
        if let Some(values) = self.take_pending(source, tag) {
            return Ok(values);
        }
        loop {
            let message = self.inboxes[source]
                .recv()
                .map_err(|_| Error::Disconnected(source))?;
            if message.tag == tag {
                return Ok(message.values);
            }
            trace!(
                "Rank {} stashes message {:?} from rank {source}",
                self.topology.position(),
                message.tag
            );
            self.pending.borrow_mut()[source].push_back(message);
        }
    }

    /// Extract the oldest stashed message from `source` that has a given tag
    fn take_pending(&self, source: usize, tag: Tag) -> Option<Vec<Precision>> {
        let mut pending = self.pending.borrow_mut();
        let queue = &mut pending[source];
        let idx = queue.iter().position(|message| message.tag == tag)?;
        queue.remove(idx).map(|message| message.values)
    }

    /// Send a message to `dest`, whatever its tag
    fn post(&self, dest: usize, tag: Tag, values: &[Precision]) -> Result<()> {
        self.check_peer(dest)?;
        self.outboxes[dest]
            .send(Message {
                tag,
                values: values.to_vec(),
            })
            .map_err(|_| Error::Disconnected(dest))
    }

    /// Receive a single value from `source`
    fn receive_scalar(&self, source: usize, tag: Tag) -> Result<Precision> {
        let values = self.receive(source, tag)?;
        let [value] = values[..] else {
            return Err(Error::LengthMismatch {
                expected: 1,
                actual: values.len(),
            });
        };
        Ok(value)
    }

    /// Ranks other than `root`
    fn others(&self, root: usize) -> impl Iterator<Item = usize> {
        (0..self.topology.count()).filter(move |&rank| rank != root)
    }
}
//
impl Communicator for LocalComm {
    fn topology(&self) -> Topology {
        self.topology
    }

    fn send(&self, dest: usize, tag: Tag, values: &[Precision]) -> Result<()> {
        self.post(dest, tag.check_user()?, values)
    }

    fn receive_into(&self, source: usize, tag: Tag, buffer: &mut [Precision]) -> Result<()> {
        let values = self.receive(source, tag.check_user()?)?;
        if values.len() != buffer.len() {
            return Err(Error::LengthMismatch {
                expected: buffer.len(),
                actual: values.len(),
            });
        }
        buffer.copy_from_slice(&values);
        Ok(())
    }

    fn reduce_sum(&self, value: Precision, root: usize) -> Result<Option<Precision>> {
        self.check_peer(root)?;
        if self.topology.position() != root {
            self.post(root, Tag::REDUCE, &[value])?;
            return Ok(None);
        }
        let mut sum = value;
        for source in self.others(root) {
            sum += self.receive_scalar(source, Tag::REDUCE)?;
        }
        Ok(Some(sum))
    }

    fn barrier(&self) -> Result<()> {
        const ROOT: usize = 0;
        if self.topology.position() == ROOT {
            for source in self.others(ROOT) {
                self.receive(source, Tag::BARRIER)?;
            }
            for dest in self.others(ROOT) {
                self.post(dest, Tag::BARRIER, &[])?;
            }
        } else {
            self.post(ROOT, Tag::BARRIER, &[])?;
            self.receive(ROOT, Tag::BARRIER)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    fn init_logger() {
        static INIT_LOGGER: Once = Once::new();
        INIT_LOGGER.call_once(|| {
            let _ = env_logger::builder().is_test(true).try_init();
        });
    }

    #[test]
    fn point_to_point() {
        init_logger();
        let results = LocalGroup::run(2, |comm| {
            let mut buffer = [0.0; 3];
            match comm.topology().position() {
                0 => {
                    comm.send(1, Tag(0), &[1.0, 2.0, 3.0])?;
                    comm.receive_into(1, Tag(1), &mut buffer)?;
                }
                _ => {
                    comm.receive_into(0, Tag(0), &mut buffer)?;
                    comm.send(0, Tag(1), &[4.0, 5.0, 6.0])?;
                }
            }
            Ok::<_, Error>(buffer)
        });
        assert_eq!(results, [Ok([4.0, 5.0, 6.0]), Ok([1.0, 2.0, 3.0])]);
    }

    #[test]
    fn messages_are_matched_by_tag() {
        init_logger();
        let mut comms = LocalGroup::new(2).into_iter();
        let (first, second) = (comms.next().unwrap(), comms.next().unwrap());
        first.send(1, Tag(7), &[7.0]).unwrap();
        first.send(1, Tag(8), &[8.0]).unwrap();
        first.send(1, Tag(7), &[9.0]).unwrap();

        let mut buffer = [0.0];
        second.receive_into(0, Tag(8), &mut buffer).unwrap();
        assert_eq!(buffer, [8.0]);
        second.receive_into(0, Tag(7), &mut buffer).unwrap();
        assert_eq!(buffer, [7.0]);
        second.receive_into(0, Tag(7), &mut buffer).unwrap();
        assert_eq!(buffer, [9.0]);
    }

    #[test]
    fn reduction_to_root() {
        init_logger();
        let results = LocalGroup::run(4, |comm| {
            let position = comm.topology().position();
            comm.reduce_sum(position as Precision + 1.0, 0)
        });
        assert_eq!(results, [Ok(Some(10.0)), Ok(None), Ok(None), Ok(None)]);
    }

    #[test]
    fn barrier_and_repeated_collectives() {
        init_logger();
        let results = LocalGroup::run(3, |comm| {
            let mut sums = Vec::new();
            for step in 0..5 {
                comm.barrier()?;
                sums.push(comm.reduce_sum(step as Precision, 0)?);
            }
            comm.barrier()?;
            Ok::<_, Error>(sums)
        });
        let root = results[0].clone().unwrap();
        assert_eq!(root, [0.0, 3.0, 6.0, 9.0, 12.0].map(Some));
        assert!(results[1..]
            .iter()
            .all(|sums| sums.as_ref().unwrap().iter().all(Option::is_none)));
    }

    #[test]
    fn single_rank_group() {
        init_logger();
        let results = LocalGroup::run(1, |comm| {
            comm.barrier()?;
            comm.reduce_sum(2.5, 0)
        });
        assert_eq!(results, [Ok(Some(2.5))]);
    }

    #[test]
    fn misuse_is_reported() {
        init_logger();
        let mut comms = LocalGroup::new(2);
        let second = comms.pop().unwrap();
        let first = comms.pop().unwrap();
        assert_eq!(
            first.send(2, Tag(0), &[]),
            Err(Error::InvalidPeer { peer: 2, count: 2 })
        );

        first.send(1, Tag(0), &[1.0, 2.0]).unwrap();
        let mut buffer = [0.0];
        assert_eq!(
            second.receive_into(0, Tag(0), &mut buffer),
            Err(Error::LengthMismatch {
                expected: 1,
                actual: 2
            })
        );

        drop(first);
        assert_eq!(
            second.receive_into(0, Tag(0), &mut buffer),
            Err(Error::Disconnected(0))
        );
    }

    #[test]
    fn reserved_tags_are_rejected() {
        init_logger();
        let results = LocalGroup::run(2, |comm| {
            let position = comm.topology().position();
            for tag in [Tag::REDUCE, Tag::BARRIER, Tag(Tag::MAX_USER + 1)] {
                let mut buffer = [0.0];
                assert_eq!(
                    comm.send(1 - position, tag, &[1000.0]),
                    Err(Error::ReservedTag(tag))
                );
                assert_eq!(
                    comm.receive_into(1 - position, tag, &mut buffer),
                    Err(Error::ReservedTag(tag))
                );
            }
            comm.send(1 - position, Tag(Tag::MAX_USER), &[])?;
            comm.receive_into(1 - position, Tag(Tag::MAX_USER), &mut [])?;
            comm.reduce_sum(1.0, 0)
        });
        assert_eq!(results, [Ok(Some(2.0)), Ok(None)]);
    }
}
