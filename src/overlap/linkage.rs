//! `Linkage`: pairwise communication interfaces between ranks.
//!
//! For every other rank the local rank rebuilds that rank's partition pool
//! from the decomposition and intersects role lists: what the local rank
//! sends under an interface is the part of its send-role list that the peer
//! holds in its receive-role list, and vice versa. No communication is
//! needed to set this up.
//!
//! Both sides of a link enumerate their intersection boxes in the same order:
//! the partitions of the smaller rank form the outer loop on both sides. The
//! box list is therefore identical on the two ranks, and each side tags the
//! boxes with its own local partition number.

use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshLatticeError;
use crate::partitioning::{Partition, PartitionIteratorType, PartitionList, PartitionPool};
use crate::topology::Mesh;

/// The five supported interfaces, as (send role, receive role) pairs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceType {
    InteriorBorderInteriorBorder,
    InteriorBorderAll,
    OverlapOverlapFront,
    OverlapAll,
    AllAll,
}

impl InterfaceType {
    pub const ALL: [InterfaceType; 5] = [
        InterfaceType::InteriorBorderInteriorBorder,
        InterfaceType::InteriorBorderAll,
        InterfaceType::OverlapOverlapFront,
        InterfaceType::OverlapAll,
        InterfaceType::AllAll,
    ];

    pub fn send_role(self) -> PartitionIteratorType {
        match self {
            InterfaceType::InteriorBorderInteriorBorder | InterfaceType::InteriorBorderAll => {
                PartitionIteratorType::InteriorBorder
            }
            InterfaceType::OverlapOverlapFront | InterfaceType::OverlapAll => {
                PartitionIteratorType::Overlap
            }
            InterfaceType::AllAll => PartitionIteratorType::All,
        }
    }

    pub fn receive_role(self) -> PartitionIteratorType {
        match self {
            InterfaceType::InteriorBorderInteriorBorder => PartitionIteratorType::InteriorBorder,
            InterfaceType::OverlapOverlapFront => PartitionIteratorType::OverlapFront,
            InterfaceType::InteriorBorderAll
            | InterfaceType::OverlapAll
            | InterfaceType::AllAll => PartitionIteratorType::All,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Forward sends along the send role; backward swaps the roles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommunicationDirection {
    #[default]
    Forward,
    Backward,
}

/// Send and receive boxes shared with one peer.
#[derive(Clone, Debug)]
pub struct LinkNode<const D: usize> {
    rank: usize,
    lists: [Arc<PartitionList<D>>; 2],
}

impl<const D: usize> LinkNode<D> {
    pub fn new(rank: usize, send: Arc<PartitionList<D>>, receive: Arc<PartitionList<D>>) -> Self {
        Self {
            rank,
            lists: [send, receive],
        }
    }

    /// The peer.
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn send_list(&self, direction: CommunicationDirection) -> &PartitionList<D> {
        &self.lists[direction as usize]
    }

    pub fn receive_list(&self, direction: CommunicationDirection) -> &PartitionList<D> {
        &self.lists[1 - direction as usize]
    }

    /// Whether send and receive are one shared list.
    pub fn is_symmetric(&self) -> bool {
        Arc::ptr_eq(&self.lists[0], &self.lists[1])
    }
}

/// All links of one interface type, in increasing peer rank.
#[derive(Clone, Debug, Default)]
pub struct Interface<const D: usize> {
    nodes: Vec<LinkNode<D>>,
}

impl<const D: usize> Interface<D> {
    pub fn iter(&self) -> std::slice::Iter<'_, LinkNode<D>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The link to `rank`, if any.
    pub fn node(&self, rank: usize) -> Option<&LinkNode<D>> {
        self.nodes.iter().find(|n| n.rank == rank)
    }

    fn add(&mut self, node: LinkNode<D>) {
        self.nodes.push(node);
    }
}

impl<'a, const D: usize> IntoIterator for &'a Interface<D> {
    type Item = &'a LinkNode<D>;
    type IntoIter = std::slice::Iter<'a, LinkNode<D>>;
    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[derive(Clone, Debug)]
pub struct Linkage<const D: usize> {
    interfaces: [Interface<D>; 5],
}

impl<const D: usize> Linkage<D> {
    /// Link `rank` (owning `local_pool`) with every other rank of
    /// `decomposition`.
    pub fn new(
        rank: usize,
        local_pool: &PartitionPool<D>,
        decomposition: &[Mesh<D>],
    ) -> Result<Self, MeshLatticeError> {
        if rank >= decomposition.len() {
            return Err(MeshLatticeError::RankOutOfRange {
                rank,
                size: decomposition.len(),
            });
        }
        let peers: Vec<usize> = (0..decomposition.len()).filter(|&p| p != rank).collect();
        let link = |&peer: &usize| link_peer(rank, peer, local_pool, &decomposition[peer]);

        #[cfg(feature = "rayon")]
        let per_peer = peers.par_iter().map(link).collect::<Result<Vec<_>, _>>()?;
        #[cfg(not(feature = "rayon"))]
        let per_peer = peers.iter().map(link).collect::<Result<Vec<_>, _>>()?;

        let mut interfaces: [Interface<D>; 5] = std::array::from_fn(|_| Interface::default());
        for nodes in per_peer {
            for (t, node) in nodes.into_iter().enumerate() {
                if let Some(node) = node {
                    interfaces[t].add(node);
                }
            }
        }

        for t in InterfaceType::ALL {
            log::debug!(
                "rank {rank}: interface {t:?} links {} peers",
                interfaces[t.index()].len()
            );
        }
        Ok(Self { interfaces })
    }

    pub fn interface(&self, t: InterfaceType) -> &Interface<D> {
        &self.interfaces[t.index()]
    }
}

/// Build the links of every interface with one peer. All_All gates the rest:
/// peers that share nothing at all are not linked anywhere.
fn link_peer<const D: usize>(
    rank: usize,
    peer: usize,
    local_pool: &PartitionPool<D>,
    peer_mesh: &Mesh<D>,
) -> Result<[Option<LinkNode<D>>; 5], MeshLatticeError> {
    let mut nodes: [Option<LinkNode<D>>; 5] = std::array::from_fn(|_| None);
    let remote_pool = PartitionPool::new(
        peer_mesh,
        local_pool.global_mesh(),
        local_pool.overlap(),
        local_pool.periodic(),
    )?;
    let all = InterfaceType::AllAll;
    nodes[all.index()] = build(all, rank, peer, local_pool, &remote_pool);
    if nodes[all.index()].is_none() {
        return Ok(nodes);
    }
    for t in &InterfaceType::ALL[..4] {
        nodes[t.index()] = build(*t, rank, peer, local_pool, &remote_pool);
    }
    Ok(nodes)
}

fn build<const D: usize>(
    t: InterfaceType,
    rank: usize,
    peer: usize,
    local_pool: &PartitionPool<D>,
    remote_pool: &PartitionPool<D>,
) -> Option<LinkNode<D>> {
    let (send_role, receive_role) = (t.send_role(), t.receive_role());
    let send = Arc::new(intersect(
        local_pool.get(send_role),
        remote_pool.get(receive_role),
        rank < peer,
    ));
    let receive = if send_role == receive_role {
        Arc::clone(&send)
    } else {
        Arc::new(intersect(
            local_pool.get(receive_role),
            remote_pool.get(send_role),
            rank < peer,
        ))
    };
    if send.is_empty() && receive.is_empty() {
        return None;
    }
    log::trace!(
        "rank {rank} -> {peer} {t:?}: send {} cells, receive {} cells",
        send.volume(),
        receive.volume()
    );
    Some(LinkNode::new(peer, send, receive))
}

/// Pairwise non-empty intersections tagged with the local partition number.
/// `local_outer` selects which list drives the outer loop.
fn intersect<const D: usize>(
    local: &PartitionList<D>,
    remote: &PartitionList<D>,
    local_outer: bool,
) -> PartitionList<D> {
    let mut link = PartitionList::new();
    let mut emit = |l: &Partition<D>, r: &Partition<D>| {
        let common = l.intersect(r);
        if !common.is_empty() {
            link.push(common);
        }
    };
    if local_outer {
        for l in local {
            for r in remote {
                emit(l, r);
            }
        }
    } else {
        for r in remote {
            for l in local {
                emit(l, r);
            }
        }
    }
    link
}
