use num_traits::ToPrimitive;

use crate::r#type::{Coord, IndexableNum};

/// An owned, immutable KDTree.
///
/// Usually this will be created from scratch via [`KDTreeBuilder`][crate::kdtree::KDTreeBuilder]
/// or [`KDTree::from_coords`]. Query it through [`KDTreeIndex`][crate::kdtree::KDTreeIndex].
///
/// Nodes live in flat arrays addressed by position. Position `i` holds the point
/// `coords[2 * i]`, `coords[2 * i + 1]`, its insertion index `ids[i]` and the positions of its
/// children `children[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KDTree<N: IndexableNum> {
    pub(crate) coords: Vec<N>,
    pub(crate) ids: Vec<u32>,
    pub(crate) children: Vec<Children>,
    pub(crate) root: Option<u32>,
}

impl<N: IndexableNum> KDTree<N> {
    pub(crate) fn empty() -> Self {
        Self {
            coords: vec![],
            ids: vec![],
            children: vec![],
            root: None,
        }
    }
}

/// Positions of the two subtrees of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Children {
    pub(crate) low: Option<u32>,
    pub(crate) high: Option<u32>,
}

impl Children {
    /// Position of the low (`<=`) subtree root, if any.
    #[inline]
    pub fn low(&self) -> Option<u32> {
        self.low
    }

    /// Position of the high (`>`) subtree root, if any.
    #[inline]
    pub fn high(&self) -> Option<u32> {
        self.high
    }

    /// Returns `true` if neither subtree exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }
}

/// The result of a nearest-neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<N: IndexableNum> {
    /// Insertion index of the found point.
    pub id: u32,
    /// The found point.
    pub coord: Coord<N>,
    /// Squared Euclidean distance from the query to [`Neighbor::coord`], exact for integer
    /// coordinates.
    pub distance_squared: N::Distance,
}

impl<N: IndexableNum> Neighbor<N> {
    /// Euclidean distance from the query to the found point.
    pub fn distance(&self) -> f64 {
        self.distance_squared.to_f64().unwrap_or(f64::NAN).sqrt()
    }
}
