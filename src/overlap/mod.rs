//! Overlap module: communication interfaces between the partitions of
//! different ranks.
//!
//! This module re-exports the [`linkage`] submodule.

pub mod linkage;

pub use linkage::{CommunicationDirection, Interface, InterfaceType, LinkNode, Linkage};
