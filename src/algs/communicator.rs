//! Thin façade over in-process or inter-process message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking: the exchange engine calls
//! `.wait()` before it trusts that a buffer is ready, and polls
//! `.is_complete()` to pick whichever receive finished first.
//!
//! Every communicator owns a [`TagPool`]. Ranks lease tags in the same
//! collective order, so matching exchanges use matching tags without any
//! global counter.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::mesh_error::MeshLatticeError;

/// Number of tags a pool hands out before wrapping around.
pub const TAG_POOL_SIZE: usize = 256;

/// First tag of the default pool.
pub const DEFAULT_TAG_BASE: u16 = 0x1000;

/// Non-blocking communication interface (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Post a send of `buf` to `peer`; the buffer is copied.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of a `len`-byte message from `peer`. The delivered
    /// message is returned as sent, even when its length differs.
    fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle;
    /// Block until a message with `tag` arrives from any rank.
    fn recv_any(&self, tag: u16) -> Result<(usize, Vec<u8>), MeshLatticeError>;
    /// The tag allocator of this communicator.
    fn tags(&self) -> &TagPool;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
    /// Non-blocking completion test.
    fn is_complete(&mut self) -> bool;
}

/// Cyclic allocator of message tags.
#[derive(Debug)]
pub struct TagPool {
    base: u16,
    next: AtomicU32,
    outstanding: AtomicUsize,
}

impl Default for TagPool {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_BASE)
    }
}

impl TagPool {
    pub fn new(base: u16) -> Self {
        Self {
            base,
            next: AtomicU32::new(0),
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Lease the next tag. Fails when [`TAG_POOL_SIZE`] leases are alive.
    pub fn lease(&self) -> Result<TagLease<'_>, MeshLatticeError> {
        let previous = self.outstanding.fetch_add(1, Ordering::AcqRel);
        if previous >= TAG_POOL_SIZE {
            self.outstanding.fetch_sub(1, Ordering::AcqRel);
            return Err(MeshLatticeError::TagPoolExhausted(previous));
        }
        let k = self.next.fetch_add(1, Ordering::Relaxed) as usize % TAG_POOL_SIZE;
        Ok(TagLease {
            pool: self,
            tag: self.base.wrapping_add(k as u16),
        })
    }

    /// Leases currently alive.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }
}

/// A leased tag, returned to its pool on drop.
#[derive(Debug)]
pub struct TagLease<'a> {
    pool: &'a TagPool,
    tag: u16,
}

impl TagLease<'_> {
    #[inline]
    pub fn tag(&self) -> u16 {
        self.tag
    }
}

impl Drop for TagLease<'_> {
    fn drop(&mut self) {
        self.pool.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A send that completed when it was posted.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sent;

impl Wait for Sent {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
    fn is_complete(&mut self) -> bool {
        true
    }
}

// --- NoComm: single-rank loopback ---

/// Single-rank communicator; messages to rank 0 are delivered to itself.
#[derive(Clone, Debug, Default)]
pub struct NoComm {
    queue: Arc<Mutex<HashMap<u16, VecDeque<Vec<u8>>>>>,
    tags: Arc<TagPool>,
}

impl NoComm {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct LoopbackHandle {
    queue: Arc<Mutex<HashMap<u16, VecDeque<Vec<u8>>>>>,
    tag: u16,
    data: Option<Vec<u8>>,
}

impl LoopbackHandle {
    fn poll(&mut self) -> bool {
        if self.data.is_none() {
            self.data = self
                .queue
                .lock()
                .get_mut(&self.tag)
                .and_then(VecDeque::pop_front);
        }
        self.data.is_some()
    }
}

impl Wait for LoopbackHandle {
    fn wait(mut self) -> Option<Vec<u8>> {
        // nobody else can produce the message
        self.poll();
        self.data.take()
    }
    fn is_complete(&mut self) -> bool {
        self.poll()
    }
}

impl Communicator for NoComm {
    type SendHandle = Sent;
    type RecvHandle = LoopbackHandle;

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn isend(&self, _peer: usize, tag: u16, buf: &[u8]) -> Sent {
        self.queue.lock().entry(tag).or_default().push_back(buf.to_vec());
        Sent
    }

    fn irecv(&self, _peer: usize, tag: u16, _len: usize) -> LoopbackHandle {
        LoopbackHandle {
            queue: Arc::clone(&self.queue),
            tag,
            data: None,
        }
    }

    fn recv_any(&self, tag: u16) -> Result<(usize, Vec<u8>), MeshLatticeError> {
        self.queue
            .lock()
            .get_mut(&tag)
            .and_then(VecDeque::pop_front)
            .map(|data| (0, data))
            .ok_or_else(|| MeshLatticeError::CommError {
                neighbor: 0,
                source: Box::new(crate::mesh_error::CommError(format!(
                    "no message with tag {tag} posted on a single rank"
                ))),
            })
    }

    fn tags(&self) -> &TagPool {
        &self.tags
    }
}

// --- LocalComm: in-process ranks on threads ---
type Key = (usize, usize, u16); // (src, dst, tag)
type Mailbox = DashMap<Key, VecDeque<Bytes>>;

/// Polling schedule of a blocked rank: yield first, then sleep.
#[derive(Default)]
struct Backoff {
    polls: u32,
}

impl Backoff {
    const YIELDS: u32 = 64;
    const MAX_SLEEP_US: u64 = 1000;

    fn snooze(&mut self) {
        if self.polls < Self::YIELDS {
            std::thread::yield_now();
        } else {
            let doublings = (self.polls - Self::YIELDS).min(10);
            let us = (1u64 << doublings).min(Self::MAX_SLEEP_US);
            std::thread::sleep(Duration::from_micros(us));
        }
        self.polls = self.polls.saturating_add(1);
    }
}

/// One rank of an in-process universe. Ranks usually run on separate threads
/// and share a mailbox.
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
    tags: Arc<TagPool>,
}

impl LocalComm {
    /// Create `size` connected ranks.
    pub fn universe(size: usize) -> Vec<LocalComm> {
        let mailbox = Arc::new(Mailbox::new());
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
                tags: Arc::new(TagPool::default()),
            })
            .collect()
    }

    fn pop(&self, key: &Key) -> Option<Bytes> {
        self.mailbox.get_mut(key).and_then(|mut q| q.pop_front())
    }
}

pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
    data: Option<Bytes>,
}

impl LocalHandle {
    fn poll(&mut self) -> bool {
        if self.data.is_none() {
            self.data = self.mailbox.get_mut(&self.key).and_then(|mut q| q.pop_front());
        }
        self.data.is_some()
    }
}

impl Wait for LocalHandle {
    fn wait(mut self) -> Option<Vec<u8>> {
        let mut backoff = Backoff::default();
        while !self.poll() {
            backoff.snooze();
        }
        self.data.take().map(|b| b.to_vec())
    }
    fn is_complete(&mut self) -> bool {
        self.poll()
    }
}

impl Communicator for LocalComm {
    type SendHandle = Sent;
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Sent {
        self.mailbox
            .entry((self.rank, peer, tag))
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        Sent
    }

    fn irecv(&self, peer: usize, tag: u16, _len: usize) -> LocalHandle {
        LocalHandle {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
            data: None,
        }
    }

    fn recv_any(&self, tag: u16) -> Result<(usize, Vec<u8>), MeshLatticeError> {
        let mut backoff = Backoff::default();
        loop {
            for src in 0..self.size {
                if let Some(bytes) = self.pop(&(src, self.rank, tag)) {
                    return Ok((src, bytes.to_vec()));
                }
            }
            backoff.snooze();
        }
    }

    fn tags(&self) -> &TagPool {
        &self.tags
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::point_to_point::{Destination, Source};
    use mpi::request::{Request, StaticScope};
    use mpi::topology::{Communicator as _, SimpleCommunicator};

    /// Communicator over an MPI world. Receive handles share the same
    /// communicator, so they match sends posted on it.
    pub struct MpiComm {
        world: Arc<SimpleCommunicator>,
        tags: TagPool,
        _universe: Option<mpi::environment::Universe>,
    }

    impl MpiComm {
        /// Initialize MPI and wrap its world; `None` if MPI was initialized
        /// already.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            Some(Self {
                world: Arc::new(universe.world()),
                tags: TagPool::default(),
                _universe: Some(universe),
            })
        }

        /// Wrap an existing communicator.
        pub fn from_world(world: SimpleCommunicator) -> Self {
            Self {
                world: Arc::new(world),
                tags: TagPool::default(),
                _universe: None,
            }
        }

        pub fn world(&self) -> &SimpleCommunicator {
            &self.world
        }
    }

    /// A pending send owning its buffer until completion.
    pub struct MpiSendHandle {
        request: Option<Request<'static, [u8], StaticScope>>,
        buffer: *mut [u8],
    }

    impl MpiSendHandle {
        fn finish(&mut self) {
            if let Some(request) = self.request.take() {
                request.wait();
                // SAFETY: `buffer` came from `Box::into_raw` in `isend` and the
                // request that borrowed it has completed.
                drop(unsafe { Box::from_raw(self.buffer) });
            }
        }
    }

    impl Wait for MpiSendHandle {
        fn wait(mut self) -> Option<Vec<u8>> {
            self.finish();
            None
        }
        fn is_complete(&mut self) -> bool {
            match self.request.take() {
                None => true,
                Some(request) => match request.test() {
                    Ok(_) => {
                        // SAFETY: see `finish`.
                        drop(unsafe { Box::from_raw(self.buffer) });
                        true
                    }
                    Err(request) => {
                        self.request = Some(request);
                        false
                    }
                },
            }
        }
    }

    impl Drop for MpiSendHandle {
        fn drop(&mut self) {
            self.finish();
        }
    }

    /// A receive that is matched lazily by probing.
    pub struct MpiRecvHandle {
        world: Arc<SimpleCommunicator>,
        peer: i32,
        tag: i32,
    }

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            let (data, _status) = self
                .world
                .process_at_rank(self.peer)
                .receive_vec_with_tag::<u8>(self.tag);
            Some(data)
        }
        fn is_complete(&mut self) -> bool {
            self.world
                .process_at_rank(self.peer)
                .immediate_probe_with_tag(self.tag)
                .is_some()
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSendHandle {
            let buffer: *mut [u8] = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: the allocation stays alive until the handle reclaims it
            // after the request completed.
            let data: &'static [u8] = unsafe { &*buffer };
            let request = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, data, tag as i32);
            MpiSendHandle {
                request: Some(request),
                buffer,
            }
        }

        fn irecv(&self, peer: usize, tag: u16, _len: usize) -> MpiRecvHandle {
            MpiRecvHandle {
                world: Arc::clone(&self.world),
                peer: peer as i32,
                tag: tag as i32,
            }
        }

        fn recv_any(&self, tag: u16) -> Result<(usize, Vec<u8>), MeshLatticeError> {
            let (msg, status) = self.world.any_process().matched_probe_with_tag(tag as i32);
            let (data, _) = msg.matched_receive_vec::<u8>();
            Ok((status.source_rank() as usize, data))
        }

        fn tags(&self) -> &TagPool {
            &self.tags
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
