//! Little-endian wire types and message buffers for entity exchanges.
//!
//! A message is the concatenation of the payloads of the entities of one
//! link, in enumeration order. Entities of codimensions whose payload size
//! varies are preceded by a [`WireCount`] holding their item count.

use bytemuck::{Pod, Zeroable};
use bytes::{Buf, Bytes};
use std::mem::size_of;

use crate::mesh_error::MeshLatticeError;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn expect_exact_len(peer: usize, actual: usize, expected: usize) -> Result<(), MeshLatticeError> {
    if actual == expected {
        Ok(())
    } else {
        Err(MeshLatticeError::ProtocolMismatch {
            peer,
            expected,
            actual,
        })
    }
}

/// Item count carried in front of a variable-size payload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}

impl WireCount {
    /// Fails when `n` does not fit the 32-bit count.
    pub fn new(n: usize) -> Result<Self, MeshLatticeError> {
        let n = u32::try_from(n)
            .map_err(|_| MeshLatticeError::IndexOverflow(format!("item count {n} on the wire")))?;
        Ok(Self { n_le: n.to_le() })
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

static_assertions::assert_eq_size!(WireCount, u32);

/// Growable outgoing message.
#[derive(Debug, Default)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve(&mut self, bytes: usize) -> Result<(), MeshLatticeError> {
        self.buf
            .try_reserve(bytes)
            .map_err(|_| MeshLatticeError::AllocationFailed(self.buf.len().saturating_add(bytes)))
    }

    /// Append one item.
    pub fn write<T: Pod>(&mut self, value: &T) -> Result<(), MeshLatticeError> {
        self.write_slice(std::slice::from_ref(value))
    }

    /// Append a run of items.
    pub fn write_slice<T: Pod>(&mut self, values: &[T]) -> Result<(), MeshLatticeError> {
        let bytes = cast_slice(values);
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Incoming message from `peer`, consumed front to back.
#[derive(Debug)]
pub struct MessageReader {
    peer: usize,
    buf: Bytes,
}

impl MessageReader {
    pub fn new(peer: usize, buf: impl Into<Bytes>) -> Self {
        Self {
            peer,
            buf: buf.into(),
        }
    }

    pub fn peer(&self) -> usize {
        self.peer
    }

    /// Read one item; fails at the end of the message.
    pub fn read<T: Pod>(&mut self) -> Result<T, MeshLatticeError> {
        let n = size_of::<T>();
        if self.buf.remaining() < n {
            return Err(MeshLatticeError::BufferUnderflow { peer: self.peer });
        }
        let value = bytemuck::pod_read_unaligned(&self.buf[..n]);
        self.buf.advance(n);
        Ok(value)
    }

    /// Read `n` items.
    pub fn read_vec<T: Pod>(&mut self, n: usize) -> Result<Vec<T>, MeshLatticeError> {
        (0..n).map(|_| self.read()).collect()
    }

    /// Bytes left unread.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }
}
