#![doc = include_str!("../README.md")]

mod error;
pub mod kdtree;
mod r#type;

pub use error::{PlanarIndexError, Result};
pub use r#type::{Coord, IndexableNum};

#[cfg(test)]
pub(crate) mod test;
