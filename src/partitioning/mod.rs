//! Partitioning of the structured mesh among ranks.
//!
//! - [`partition`]: dyadic boxes with neighbor and boundary information
//! - [`partition_list`]: ordered lists of boxes with lookup by number
//! - [`pool`]: the six parallel-role lists of one rank
//! - [`decomposition`]: recursive bisection of the global mesh

pub mod decomposition;
pub mod partition;
pub mod partition_list;
pub mod pool;

pub use decomposition::Decomposition;
pub use partition::Partition;
pub use partition_list::PartitionList;
pub use pool::{PartitionIteratorType, PartitionPool, PartitionType};

#[cfg(test)]
mod tests;
