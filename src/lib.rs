#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-lattice
//!
//! mesh-lattice is the parallel engine behind a structured (Cartesian) mesh
//! for PDE codes. It addresses every entity of a `D`-dimensional lattice with
//! one dyadic integer coordinate, decomposes the lattice among ranks,
//! classifies entities by parallel role, links ranks through communication
//! interfaces and exchanges entity data along them.
//!
//! ## Features
//! - Dyadic [`MultiIndex`](topology::MultiIndex) addressing of cells, faces,
//!   edges and vertices in any dimension
//! - Recursive bisection of the global mesh ([`partitioning::Decomposition`])
//! - Interior/border/overlap/front role lists with periodic wrap-around
//!   ([`partitioning::PartitionPool`])
//! - Pairwise send/receive lists for five interface kinds
//!   ([`overlap::Linkage`])
//! - Buffered asynchronous exchange driven by a user
//!   [`DataHandle`](algs::DataHandle), over pluggable transports: single rank
//!   loopback, in-process thread ranks, and MPI (`mpi-support` feature)
//! - Closed-form Jacobians of axis-aligned entities
//!   ([`geometry::GeometryCache`])
//! - Level hierarchies with isotropic, anisotropic, bisection and arbitrary
//!   refinement ([`grid::Grid`])
//!
//! ## Determinism
//!
//! Decomposition, role lists, linkage and entity enumeration are pure
//! functions of the configuration and the rank count. Two ranks therefore
//! agree on the order of the entities in every message without sending ids.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! mesh-lattice = "0.1"
//! # Optional features:
//! # features = ["mpi-support", "rayon"]
//! ```
//!
//! ```rust
//! use mesh_lattice::prelude::*;
//!
//! let config = GridConfig::<2>::new(Domain::unit(), MultiIndex::new([8, 8]))
//!     .with_overlap(MultiIndex::splat(1));
//! let mut grid = Grid::new(config, 0, 1)?;
//! grid.refine(&RefinementPolicy::Isotropic)?;
//! assert_eq!(grid.leaf().index_set().size(0), 256);
//! # Ok::<(), mesh_lattice::mesh_error::MeshLatticeError>(())
//! ```

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod geometry;
pub mod grid;
pub mod mesh_error;
pub mod overlap;
pub mod partitioning;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communication::{Communication, DataHandle, communicate};
    pub use crate::algs::communicator::{Communicator, LocalComm, NoComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::traversal::{EntityInfo, PartitionIter};
    pub use crate::algs::wire::{MessageReader, MessageWriter};
    pub use crate::data::{IdSet, IndexSet};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::GeometryCache;
    pub use crate::grid::{Domain, Grid, GridConfig, GridDescriptor, GridLevel};
    pub use crate::mesh_error::MeshLatticeError;
    pub use crate::overlap::{CommunicationDirection, InterfaceType, Linkage};
    pub use crate::partitioning::{
        Decomposition, Partition, PartitionIteratorType, PartitionList, PartitionPool,
        PartitionType,
    };
    pub use crate::topology::{Direction, Mesh, MultiIndex, Refinement, RefinementPolicy};
}
