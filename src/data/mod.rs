//! Entity numbering: dense per-level indices and hierarchy-wide ids.

pub mod id_set;
pub mod index_set;

pub use id_set::IdSet;
pub use index_set::IndexSet;
