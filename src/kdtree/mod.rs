//! An implementation of an immutable 2D K-D Tree for nearest-neighbor search.

#![warn(missing_docs)]

mod builder;
mod index;
mod r#trait;
mod traversal;

pub use builder::KDTreeBuilder;
pub use index::{Children, KDTree, Neighbor};
pub use r#trait::KDTreeIndex;
pub use traversal::{Axis, Node};

#[cfg(test)]
pub(crate) use r#trait::nearest_with_stats;
