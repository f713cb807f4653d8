//! Buffered asynchronous exchange of entity data along a linkage interface.
//!
//! [`Communication::start`] gathers one message per linked peer and posts
//! the sends (and, when every payload has a fixed size, pre-posts the
//! receives with their exact lengths). [`Communication::wait`] scatters the
//! incoming messages as they arrive. Both sides enumerate entities
//! codimension-major and in [`PartitionIter`] order, which is what lets a
//! message carry no ids at all.
//!
//! Any disagreement between what a data handle announces and what it writes
//! or reads, or between the announced and the delivered message length, is a
//! protocol error: the exchange is abandoned, never retried. Posted sends are
//! always completed before the error is returned.

use std::mem::size_of;

use bytemuck::Pod;

use crate::algs::communicator::{Communicator, TagLease, Wait};
use crate::algs::traversal::{EntityInfo, PartitionIter};
use crate::algs::wire::{MessageReader, MessageWriter, WireCount, expect_exact_len};
use crate::mesh_error::{CommError, MeshLatticeError};
use crate::overlap::{CommunicationDirection, Interface, LinkNode};

/// User side of an exchange: which entities carry data and how to pack it.
pub trait DataHandle<const D: usize> {
    /// Item type on the wire.
    type Data: Pod;

    /// Whether entities of this dimension/codimension take part.
    fn contains(&self, dim: usize, codim: usize) -> bool;

    /// Whether every entity of this codimension carries the same number of
    /// items. Must agree on all ranks.
    fn fixed_size(&self, dim: usize, codim: usize) -> bool;

    /// Items gathered for `entity`.
    fn size(&self, entity: &EntityInfo<D>) -> usize;

    /// Write exactly `size(entity)` items.
    fn gather(
        &self,
        writer: &mut MessageWriter,
        entity: &EntityInfo<D>,
    ) -> Result<(), MeshLatticeError>;

    /// Read exactly `n` items sent for `entity`.
    fn scatter(
        &mut self,
        reader: &mut MessageReader,
        entity: &EntityInfo<D>,
        n: usize,
    ) -> Result<(), MeshLatticeError>;
}

struct Pending<H> {
    node: usize,
    expected: usize,
    handle: H,
}

/// An exchange in flight.
pub struct Communication<'a, C: Communicator, const D: usize> {
    comm: &'a C,
    interface: &'a Interface<D>,
    direction: CommunicationDirection,
    lease: TagLease<'a>,
    codims: Vec<usize>,
    fixed: bool,
    sends: Vec<C::SendHandle>,
    /// Pre-posted receives (fixed sizes).
    receives: Vec<Pending<C::RecvHandle>>,
    /// Messages not yet taken by `recv_any` (variable sizes).
    unread: usize,
}

impl<'a, C: Communicator, const D: usize> Communication<'a, C, D> {
    /// Gather and post everything `handle` has to send over `interface`.
    ///
    /// Every message is gathered before anything is posted, so a failing
    /// gather leaves no message or receive behind.
    pub fn start<H: DataHandle<D>>(
        comm: &'a C,
        interface: &'a Interface<D>,
        direction: CommunicationDirection,
        handle: &H,
    ) -> Result<Self, MeshLatticeError> {
        let lease = comm.tags().lease()?;
        let codims: Vec<usize> = (0..=D).filter(|&c| handle.contains(D - c, c)).collect();
        let fixed = codims.iter().all(|&c| handle.fixed_size(D - c, c));

        let mut this = Self {
            comm,
            interface,
            direction,
            lease,
            codims,
            fixed,
            sends: Vec::with_capacity(interface.len()),
            receives: Vec::new(),
            unread: 0,
        };

        let messages = interface
            .iter()
            .map(|node| this.gather(node, handle))
            .collect::<Result<Vec<_>, _>>()?;

        if this.fixed {
            for (k, node) in interface.iter().enumerate() {
                let expected = this.message_len(node, handle);
                log::trace!(
                    "rank {} expects {expected} bytes from {}",
                    comm.rank(),
                    node.rank()
                );
                let recv = comm.irecv(node.rank(), this.lease.tag(), expected);
                this.receives.push(Pending {
                    node: k,
                    expected,
                    handle: recv,
                });
            }
        } else {
            this.unread = interface.len();
        }

        for (node, message) in interface.iter().zip(&messages) {
            log::trace!(
                "rank {} sends {} bytes to {}",
                comm.rank(),
                message.len(),
                node.rank()
            );
            this.sends
                .push(comm.isend(node.rank(), this.lease.tag(), message.as_bytes()));
        }
        Ok(this)
    }

    /// Receive and scatter every incoming message, then complete the sends.
    ///
    /// On error the messages still in flight are received and discarded
    /// before returning, so a later exchange on the same tag starts clean.
    pub fn wait<H: DataHandle<D>>(mut self, handle: &mut H) -> Result<(), MeshLatticeError> {
        if self.fixed {
            while !self.receives.is_empty() {
                // block on the first receive when none has completed yet
                let k = self
                    .receives
                    .iter_mut()
                    .position(|p| p.handle.is_complete())
                    .unwrap_or(0);
                let Pending {
                    node,
                    expected,
                    handle: recv,
                } = self.receives.swap_remove(k);
                let peer = self.interface_node(node).rank();
                let data = recv.wait().ok_or_else(|| missing_message(peer))?;
                expect_exact_len(peer, data.len(), expected)?;
                self.scatter(node, data, handle)?;
            }
        } else {
            let mut done = vec![false; self.interface.len()];
            while self.unread > 0 {
                let (peer, data) = self.comm.recv_any(self.lease.tag())?;
                self.unread -= 1;
                let node = self
                    .interface
                    .iter()
                    .enumerate()
                    .position(|(k, n)| n.rank() == peer && !done[k])
                    .ok_or(MeshLatticeError::UnexpectedPeer(peer))?;
                done[node] = true;
                self.scatter(node, data, handle)?;
            }
        }
        self.drain_sends();
        Ok(())
    }

    fn interface_node(&self, k: usize) -> &'a LinkNode<D> {
        let interface: &'a Interface<D> = self.interface;
        &interface.iter().as_slice()[k]
    }

    /// Exact byte length of the message `node` will deliver (fixed sizes only).
    fn message_len<H: DataHandle<D>>(&self, node: &LinkNode<D>, handle: &H) -> usize {
        let list = node.receive_list(self.direction);
        self.codims
            .iter()
            .flat_map(|&c| PartitionIter::new(list, c))
            .map(|e| handle.size(&e) * size_of::<H::Data>())
            .sum()
    }

    fn gather<H: DataHandle<D>>(
        &self,
        node: &LinkNode<D>,
        handle: &H,
    ) -> Result<MessageWriter, MeshLatticeError> {
        let list = node.send_list(self.direction);
        let mut writer = MessageWriter::new();
        for &codim in &self.codims {
            let variable = !handle.fixed_size(D - codim, codim);
            for entity in PartitionIter::new(list, codim) {
                let n = handle.size(&entity);
                if variable {
                    writer.write(&WireCount::new(n)?)?;
                }
                let before = writer.len();
                handle.gather(&mut writer, &entity)?;
                expect_exact_len(
                    node.rank(),
                    writer.len() - before,
                    n * size_of::<H::Data>(),
                )?;
            }
        }
        Ok(writer)
    }

    fn scatter<H: DataHandle<D>>(
        &self,
        node: usize,
        data: Vec<u8>,
        handle: &mut H,
    ) -> Result<(), MeshLatticeError> {
        let node = self.interface_node(node);
        let peer = node.rank();
        let list = node.receive_list(self.direction);
        let total = data.len();
        let mut reader = MessageReader::new(peer, data);
        for &codim in &self.codims {
            let variable = !handle.fixed_size(D - codim, codim);
            for entity in PartitionIter::new(list, codim) {
                let n = if variable {
                    reader.read::<WireCount>()?.get()
                } else {
                    handle.size(&entity)
                };
                let before = reader.remaining();
                handle.scatter(&mut reader, &entity, n)?;
                expect_exact_len(
                    peer,
                    before - reader.remaining(),
                    n * size_of::<H::Data>(),
                )?;
            }
        }
        if reader.remaining() != 0 {
            return Err(MeshLatticeError::ProtocolMismatch {
                peer,
                expected: total - reader.remaining(),
                actual: total,
            });
        }
        Ok(())
    }

    fn drain_sends(&mut self) {
        for send in self.sends.drain(..) {
            send.wait();
        }
    }

    /// Receive and drop every message that was not scattered.
    fn drain_receives(&mut self) {
        let unread = self.receives.len() + self.unread;
        if unread > 0 {
            log::debug!(
                "rank {} discards {unread} unread messages with tag {}",
                self.comm.rank(),
                self.lease.tag()
            );
        }
        for pending in self.receives.drain(..) {
            pending.handle.wait();
        }
        while self.unread > 0 {
            self.unread -= 1;
            if self.comm.recv_any(self.lease.tag()).is_err() {
                break;
            }
        }
    }
}

fn missing_message(peer: usize) -> MeshLatticeError {
    MeshLatticeError::CommError {
        neighbor: peer,
        source: Box::new(CommError(format!(
            "receive from rank {peer} completed without a message"
        ))),
    }
}

impl<C: Communicator, const D: usize> Drop for Communication<'_, C, D> {
    fn drop(&mut self) {
        self.drain_sends();
        self.drain_receives();
    }
}

/// Run a complete exchange: start, then wait.
pub fn communicate<C, H, const D: usize>(
    comm: &C,
    interface: &Interface<D>,
    direction: CommunicationDirection,
    handle: &mut H,
) -> Result<(), MeshLatticeError>
where
    C: Communicator,
    H: DataHandle<D>,
{
    Communication::start(comm, interface, direction, &*handle)?.wait(handle)
}
