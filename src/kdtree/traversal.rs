//! Utilities to traverse the KDTree structure.

use std::marker::PhantomData;

use crate::kdtree::KDTreeIndex;
use crate::r#type::{Coord, IndexableNum};

/// The coordinate dimension a node splits its children on.
///
/// The axis is a function of depth only: nodes at even depth split on `x`, nodes at odd depth
/// split on `y`. It is never stored in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Split on the `x` coordinate.
    X,
    /// Split on the `y` coordinate.
    Y,
}

impl Axis {
    /// The splitting axis of a node at `depth` (the root is at depth 0).
    #[inline]
    pub fn from_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Axis::X
        } else {
            Axis::Y
        }
    }

    /// Pick the value on this axis out of an `(x, y)` pair.
    #[inline]
    pub fn select<T>(self, x: T, y: T) -> T {
        match self {
            Axis::X => x,
            Axis::Y => y,
        }
    }

    /// Offset of this axis within an interleaved `[x, y]` pair.
    #[inline]
    pub(crate) fn offset(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// A node in the KDTree.
///
/// Every node holds exactly one indexed point. Points in the [low
/// child](Node::low_child) are less than or equal to this node's point on [`Node::axis`]; points
/// in the [high child](Node::high_child) are strictly greater.
#[derive(Debug, Clone)]
pub struct Node<'a, N: IndexableNum, T: KDTreeIndex<N>> {
    /// The tree that this node is a reference onto
    tree: &'a T,

    /// Position of this node in the tree's node arrays
    pos: u32,

    depth: usize,

    phantom: PhantomData<N>,
}

impl<'a, N: IndexableNum, T: KDTreeIndex<N>> Node<'a, N, T> {
    fn new(tree: &'a T, pos: u32, depth: usize) -> Self {
        Self {
            tree,
            pos,
            depth,
            phantom: PhantomData,
        }
    }

    pub(crate) fn from_root(tree: &'a T) -> Option<Self> {
        tree.root_position().map(|pos| Self::new(tree, pos, 0))
    }

    /// Distance from the root, which is at depth 0.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The axis this node splits its children on.
    #[inline]
    pub fn axis(&self) -> Axis {
        Axis::from_depth(self.depth)
    }

    /// The original insertion index of this node's point.
    pub fn id(&self) -> u32 {
        self.tree.ids()[self.pos as usize]
    }

    /// The point held by this node.
    pub fn coord(&self) -> Coord<N> {
        let coords = self.tree.coords();
        let pos = self.pos as usize;
        Coord::new(coords[2 * pos], coords[2 * pos + 1])
    }

    /// The subtree whose points are `<=` this node on its axis.
    pub fn low_child(&self) -> Option<Node<'a, N, T>> {
        self.tree.children()[self.pos as usize]
            .low()
            .map(|pos| Node::new(self.tree, pos, self.depth + 1))
    }

    /// The subtree whose points are `>` this node on its axis.
    pub fn high_child(&self) -> Option<Node<'a, N, T>> {
        self.tree.children()[self.pos as usize]
            .high()
            .map(|pos| Node::new(self.tree, pos, self.depth + 1))
    }

    /// Returns `true` if this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.tree.children()[self.pos as usize].is_empty()
    }

    /// Returns `true` if this node has at least one child.
    #[inline]
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }
}

#[cfg(test)]
mod test {
    use super::Axis;

    #[test]
    fn axis_alternates_with_depth() {
        assert_eq!(Axis::from_depth(0), Axis::X);
        assert_eq!(Axis::from_depth(1), Axis::Y);
        assert_eq!(Axis::from_depth(2), Axis::X);
        assert_eq!(Axis::from_depth(7), Axis::Y);
        assert_eq!(Axis::Y.select(1, 2), 2);
    }
}
