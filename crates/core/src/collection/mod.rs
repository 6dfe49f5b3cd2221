//! Ordered block collection and its reorder reconciliation.

pub mod reorder;
pub mod store;

pub use reorder::Reorder;
pub use store::{BlockSnapshot, BlockStore, Change};
