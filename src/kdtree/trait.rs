use geo_traits::CoordTrait;
use tinyvec::TinyVec;
use tracing::trace;

use crate::error::{PlanarIndexError, Result};
use crate::kdtree::{Axis, Children, KDTree, Neighbor, Node};
use crate::r#type::{Coord, IndexableNum};

/// A trait for searching and accessing data out of a KDTree.
pub trait KDTreeIndex<N: IndexableNum>: Sized {
    /// The interleaved `[x, y]` coordinates of every node, by node position
    fn coords(&self) -> &[N];

    /// The insertion index of every node, by node position
    fn ids(&self) -> &[u32];

    /// The children of every node, by node position
    fn children(&self) -> &[Children];

    /// Position of the root node, or `None` for an empty tree
    fn root_position(&self) -> Option<u32>;

    /// The number of items in this KDTree
    fn num_items(&self) -> u32 {
        // Builders refuse more than u32::MAX items
        self.ids().len() as u32
    }

    /// Returns `true` if this KDTree holds no items
    fn is_empty(&self) -> bool {
        self.root_position().is_none()
    }

    /// The number of nodes on the longest root-to-leaf path. `0` for an empty tree.
    fn height(&self) -> usize {
        let children = self.children();
        let Some(root) = self.root_position() else {
            return 0;
        };

        let mut height = 0;
        let mut stack = vec![(root, 1)];
        while let Some((pos, level)) = stack.pop() {
            height = height.max(level);
            let Children { low, high } = children[pos as usize];
            stack.extend(low.into_iter().chain(high).map(|child| (child, level + 1)));
        }
        height
    }

    /// Find the indexed point closest to `(qx, qy)`.
    ///
    /// When several points are exactly as close, the one reached first by the search wins. The
    /// search visits the side of each split that the query itself falls on before the other
    /// side, depth first, so the choice is deterministic for a given tree and query but is not
    /// otherwise meaningful.
    ///
    /// ```
    /// use planar_index::kdtree::{KDTreeBuilder, KDTreeIndex};
    ///
    /// let mut builder = KDTreeBuilder::<f64>::new(3);
    /// builder.add(0., 0.);
    /// builder.add(10., 10.);
    /// builder.add(5., 5.);
    /// let tree = builder.finish().unwrap();
    ///
    /// let result = tree.nearest(4., 4.).unwrap();
    /// assert_eq!(result.id, 2);
    /// assert_eq!(result.distance_squared, 2.);
    /// ```
    ///
    /// Returns [`PlanarIndexError::EmptyIndex`] if the tree holds no points.
    fn nearest(&self, qx: N, qy: N) -> Result<Neighbor<N>> {
        nearest_with_stats(self, qx, qy).map(|(neighbor, _)| neighbor)
    }

    /// Find the indexed point closest to `coord`.
    ///
    /// See [`KDTreeIndex::nearest`].
    fn nearest_coord(&self, coord: &impl CoordTrait<T = N>) -> Result<Neighbor<N>> {
        self.nearest(coord.x(), coord.y())
    }

    /// Access the root node of the KDTree for manual traversal.
    fn root(&self) -> Option<Node<'_, N, Self>> {
        Node::from_root(self)
    }
}

impl<N: IndexableNum> KDTreeIndex<N> for KDTree<N> {
    fn coords(&self) -> &[N] {
        &self.coords
    }

    fn ids(&self) -> &[u32] {
        &self.ids
    }

    fn children(&self) -> &[Children] {
        &self.children
    }

    fn root_position(&self) -> Option<u32> {
        self.root
    }
}

/// Nearest-neighbor search, also returning how many nodes were visited.
pub(crate) fn nearest_with_stats<N: IndexableNum, T: KDTreeIndex<N>>(
    tree: &T,
    qx: N,
    qy: N,
) -> Result<(Neighbor<N>, usize)> {
    let root = tree.root_position().ok_or(PlanarIndexError::EmptyIndex)?;
    let coords = tree.coords();
    let children = tree.children();

    let mut best = root as usize;
    let mut best_dist = sq_dist(coords[2 * best], coords[2 * best + 1], qx, qy);
    let mut visited = 0usize;

    // Use TinyVec to avoid heap allocations
    let mut stack: TinyVec<[Visit<N::Distance>; 64]> = TinyVec::new();
    stack.push(Visit::Node {
        pos: root,
        depth: 0,
    });

    while let Some(visit) = stack.pop() {
        let (pos, depth) = match visit {
            Visit::Node { pos, depth } => (pos as usize, depth),
            Visit::Far {
                pos,
                depth,
                plane_dist,
            } => {
                // the near side has been searched; it may have shrunk the best distance
                if plane_dist < best_dist {
                    (pos as usize, depth)
                } else {
                    continue;
                }
            }
        };
        visited += 1;

        let x = coords[2 * pos];
        let y = coords[2 * pos + 1];
        let dist = sq_dist(x, y, qx, qy);
        if dist < best_dist {
            best = pos;
            best_dist = dist;
        }

        let axis = Axis::from_depth(depth);
        let q = axis.select(qx, qy);
        let split = axis.select(x, y);
        let Children { low, high } = children[pos];
        let (near, far) = if q <= split { (low, high) } else { (high, low) };

        // Note: these are pushed in backwards order to what gets popped
        if let Some(far) = far {
            stack.push(Visit::Far {
                pos: far,
                depth: depth + 1,
                plane_dist: N::square_difference(q, split),
            });
        }
        if let Some(near) = near {
            stack.push(Visit::Node {
                pos: near,
                depth: depth + 1,
            });
        }
    }

    trace!(visited, distance_squared = ?best_dist, "nearest neighbor search");

    let neighbor = Neighbor {
        id: tree.ids()[best],
        coord: Coord::new(coords[2 * best], coords[2 * best + 1]),
        distance_squared: best_dist,
    };
    Ok((neighbor, visited))
}

/// A pending step of the nearest-neighbor search.
#[derive(Debug, Clone, Copy)]
enum Visit<D> {
    /// Search the subtree rooted at `pos`.
    Node { pos: u32, depth: usize },
    /// Search the subtree rooted at `pos` only if the splitting line, `plane_dist` squared away,
    /// is closer than the best point found so far.
    Far {
        pos: u32,
        depth: usize,
        plane_dist: D,
    },
}

impl<D> Default for Visit<D> {
    fn default() -> Self {
        Visit::Node { pos: 0, depth: 0 }
    }
}

#[inline]
fn sq_dist<N: IndexableNum>(ax: N, ay: N, bx: N, by: N) -> N::Distance {
    N::square_difference(ax, bx) + N::square_difference(ay, by)
}
