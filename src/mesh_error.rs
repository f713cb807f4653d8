//! MeshLatticeError: Unified error type for mesh-lattice public APIs
//!
//! Every fallible operation in the crate returns this error. Configuration
//! problems are reported while building decompositions, pools and linkages;
//! protocol problems abort the current exchange and are never retried.

use thiserror::Error;

/// Error raised by the transport layer for a single peer.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CommError(pub String);

/// Unified error type for mesh-lattice operations.
#[derive(Debug, Error)]
pub enum MeshLatticeError {
    /// A decomposition was requested for zero ranks.
    #[error("Invalid rank count {0}: at least one rank is required")]
    InvalidRankCount(usize),
    /// Rank does not belong to the decomposition.
    #[error("Rank {rank} is out of range for a decomposition of {size} ranks")]
    RankOutOfRange { rank: usize, size: usize },
    /// Stored rank count differs from the one the grid is restored with.
    #[error("Rank count mismatch: descriptor was written for {expected} ranks, got {actual}")]
    RankCountMismatch { expected: usize, actual: usize },
    /// A refinement policy that cannot be applied to this dimension.
    #[error("Invalid refinement policy: {0}")]
    InvalidRefinement(String),
    /// Periodicity bits outside the dimension or incompatible with the domain.
    #[error("Invalid periodicity {bits:#b} for dimension {dimension}")]
    InvalidPeriodicity { bits: u32, dimension: usize },
    /// Any other inconsistent configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// No partition with the given number lives in the list.
    #[error("Partition number {0} not found")]
    PartitionNotFound(u32),
    /// Requested grid level does not exist.
    #[error("Level {level} out of range (max level {max_level})")]
    LevelOutOfRange { level: usize, max_level: usize },
    /// Index or id computation exceeded the representable range.
    #[error("Index overflow: {0}")]
    IndexOverflow(String),
    /// Declared and transferred byte counts disagree.
    #[error("Protocol mismatch with rank {peer}: expected {expected} bytes, got {actual}")]
    ProtocolMismatch {
        peer: usize,
        expected: usize,
        actual: usize,
    },
    /// A scatter tried to read beyond the end of a message.
    #[error("Cannot read beyond the end of the message from rank {peer}")]
    BufferUnderflow { peer: usize },
    /// A message arrived from a rank that is not linked in the interface.
    #[error("Received message from unexpected rank {0}")]
    UnexpectedPeer(usize),
    /// Transport failure while talking to `neighbor`.
    #[error("Communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A message buffer could not be allocated.
    #[error("Cannot allocate a message buffer of {0} bytes")]
    AllocationFailed(usize),
    /// More communications are outstanding than the tag pool can serve.
    #[error("Tag pool exhausted: {0} communications outstanding")]
    TagPoolExhausted(usize),
    /// Determinant requested for a non-square Jacobian.
    #[error("There is no determinant for a {rows}x{cols} matrix")]
    NotSquare { rows: usize, cols: usize },
}
