//! Entity enumeration, message transport and the exchange engine.

pub mod communication;
pub mod communicator;
pub mod traversal;
pub mod wire;

pub use communication::{Communication, DataHandle, communicate};
pub use communicator::{Communicator, LocalComm, NoComm, TagPool, Wait};
#[cfg(feature = "mpi-support")]
pub use communicator::MpiComm;
pub use traversal::{EntityInfo, PartitionIter, entity_count};
