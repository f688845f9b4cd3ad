use std::cmp::{self, Ordering};

use geo_traits::CoordTrait;
use tracing::{debug, warn};

use crate::error::{PlanarIndexError, Result};
use crate::kdtree::{Axis, Children, KDTree, KDTreeIndex};
use crate::r#type::{cmp_num, IndexableNum};

const DEFAULT_PARALLEL_THRESHOLD: usize = 16384;

/// A builder to create a [`KDTree`].
///
/// ```
/// use planar_index::kdtree::{KDTreeBuilder, KDTreeIndex};
///
/// let mut builder = KDTreeBuilder::<i32>::new(2);
/// builder.add(3, 3);
/// builder.add(3, 3);
/// let tree = builder.finish().unwrap();
///
/// assert_eq!(tree.num_items(), 2);
/// assert_eq!(tree.nearest(3, 3).unwrap().distance_squared, 0);
/// ```
#[derive(Debug, Clone)]
pub struct KDTreeBuilder<N: IndexableNum> {
    /// interleaved `[x, y]` coordinates in insertion order
    coords: Vec<N>,

    num_items: usize,
    parallel_threshold: usize,
}

impl<N: IndexableNum> KDTreeBuilder<N> {
    /// Create a new builder for the provided number of items.
    ///
    /// More than `u32::MAX` items cannot be indexed; [`KDTreeBuilder::finish`] reports
    /// [`PlanarIndexError::TooManyItems`] for such a builder.
    pub fn new(num_items: usize) -> Self {
        // don't reserve space for points that can never be indexed
        let capacity = if num_items <= u32::MAX as usize {
            2 * num_items
        } else {
            0
        };
        Self {
            coords: Vec::with_capacity(capacity),
            num_items,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Set the minimum number of items a subtree needs before its halves are built on separate
    /// threads.
    ///
    /// This only has an effect with the `rayon` feature enabled. The resulting tree does not
    /// depend on this setting.
    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold.max(2);
        self
    }

    /// Add a point to the index, returning its insertion index.
    pub fn add(&mut self, x: N, y: N) -> usize {
        let index = self.coords.len() >> 1;
        self.coords.push(x);
        self.coords.push(y);
        index
    }

    /// Add a point to the index, returning its insertion index.
    pub fn add_coord(&mut self, coord: &impl CoordTrait<T = N>) -> usize {
        self.add(coord.x(), coord.y())
    }

    /// Consume this builder, partitioning the points and generating a KDTree ready for queries.
    ///
    /// Fails if more than `u32::MAX` points were declared, if the number of added points differs
    /// from the one passed to [`KDTreeBuilder::new`], or if any point has a NaN coordinate.
    pub fn finish(self) -> Result<KDTree<N>> {
        if u32::try_from(self.num_items).is_err() {
            warn!(expected = self.num_items, "too many items for a kd-tree");
            return Err(PlanarIndexError::TooManyItems(self.num_items));
        }

        let added = self.coords.len() >> 1;
        if added != self.num_items {
            warn!(expected = self.num_items, added, "kd-tree item count mismatch");
            return Err(PlanarIndexError::ItemCountMismatch {
                expected: self.num_items,
                added,
            });
        }
        build(self.coords, self.parallel_threshold)
    }
}

impl<N: IndexableNum> KDTree<N> {
    /// Build a KDTree from any sequence of coordinates.
    ///
    /// Insertion indices follow iteration order.
    pub fn from_coords<C: CoordTrait<T = N>>(coords: impl IntoIterator<Item = C>) -> Result<Self> {
        let mut builder = KDTreeBuilder::new(0);
        for coord in coords {
            builder.add_coord(&coord);
        }
        builder.num_items = builder.coords.len() >> 1;
        builder.finish()
    }
}

fn build<N: IndexableNum>(mut coords: Vec<N>, parallel_threshold: usize) -> Result<KDTree<N>> {
    let num_items = coords.len() >> 1;
    if u32::try_from(num_items).is_err() {
        return Err(PlanarIndexError::TooManyItems(num_items));
    }

    if let Some(index) = coords
        .chunks_exact(2)
        .position(|xy| !(xy[0].is_orderable() && xy[1].is_orderable()))
    {
        warn!(index, "rejecting point that cannot be ordered");
        return Err(PlanarIndexError::InvalidPoint {
            index: index as u32,
        });
    }

    if num_items == 0 {
        debug!(num_items, "finished empty kd-tree");
        return Ok(KDTree::empty());
    }

    let mut ids: Vec<u32> = (0..num_items as u32).collect();
    let mut children = vec![Children::default(); num_items];

    #[cfg(feature = "rayon")]
    let root = sort_parallel(&mut coords, &mut ids, &mut children, 0, 0, parallel_threshold);

    #[cfg(not(feature = "rayon"))]
    let root = sort(&mut coords, &mut ids, &mut children, 0, 0);

    let tree = KDTree {
        coords,
        ids,
        children,
        root,
    };
    debug!(
        num_items,
        height = tree.height(),
        parallel = cfg!(feature = "rayon") && num_items >= parallel_threshold,
        "finished kd-tree"
    );

    Ok(tree)
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Low,
    High,
}

/// A range of the node arrays still to be partitioned.
#[derive(Debug, Clone, Copy)]
struct Task {
    left: usize,
    right: usize,
    depth: usize,
    parent: Option<(usize, Side)>,
}

/// kd-sort the points of the slices in place, linking each node to its children.
///
/// Positions stored in `children` are offset by `offset`, the position of the first element of
/// these slices within the whole tree. Returns the position of the subtree root.
fn sort<N: IndexableNum>(
    coords: &mut [N],
    ids: &mut [u32],
    children: &mut [Children],
    offset: u32,
    depth: usize,
) -> Option<u32> {
    if ids.is_empty() {
        return None;
    }

    let mut root = None;
    // Duplicate-heavy input can make the tree as deep as it is large, so don't recurse
    let mut stack = vec![Task {
        left: 0,
        right: ids.len() - 1,
        depth,
        parent: None,
    }];

    while let Some(task) = stack.pop() {
        let p = split(coords, ids, task.left, task.right, Axis::from_depth(task.depth));
        let pos = Some(offset + p as u32);
        match task.parent {
            None => root = pos,
            Some((parent, Side::Low)) => children[parent].low = pos,
            Some((parent, Side::High)) => children[parent].high = pos,
        }

        if p > task.left {
            stack.push(Task {
                left: task.left,
                right: p - 1,
                depth: task.depth + 1,
                parent: Some((p, Side::Low)),
            });
        }
        if p < task.right {
            stack.push(Task {
                left: p + 1,
                right: task.right,
                depth: task.depth + 1,
                parent: Some((p, Side::High)),
            });
        }
    }

    root
}

/// Like [`sort`], but building the two halves of large, balanced ranges on separate threads.
#[cfg(feature = "rayon")]
fn sort_parallel<N: IndexableNum>(
    coords: &mut [N],
    ids: &mut [u32],
    children: &mut [Children],
    offset: u32,
    depth: usize,
    parallel_threshold: usize,
) -> Option<u32> {
    let len = ids.len();
    if len < parallel_threshold {
        return sort(coords, ids, children, offset, depth);
    }

    let p = split(coords, ids, 0, len - 1, Axis::from_depth(depth));

    let (low_coords, rest_coords) = coords.split_at_mut(2 * p);
    let high_coords = &mut rest_coords[2..];
    let (low_ids, rest_ids) = ids.split_at_mut(p);
    let high_ids = &mut rest_ids[1..];
    let (low_children, rest_children) = children.split_at_mut(p);
    let (node, high_children) = rest_children.split_at_mut(1);

    let high_offset = offset + p as u32 + 1;
    // Lopsided splits only come from duplicates; keep the recursion shallow for those
    let balanced = cmp::min(low_ids.len(), high_ids.len()) >= len / 4;
    let (low, high) = if balanced {
        rayon::join(
            || {
                sort_parallel(
                    low_coords,
                    low_ids,
                    low_children,
                    offset,
                    depth + 1,
                    parallel_threshold,
                )
            },
            || {
                sort_parallel(
                    high_coords,
                    high_ids,
                    high_children,
                    high_offset,
                    depth + 1,
                    parallel_threshold,
                )
            },
        )
    } else {
        (
            sort(low_coords, low_ids, low_children, offset, depth + 1),
            sort(high_coords, high_ids, high_children, high_offset, depth + 1),
        )
    };

    node[0].low = low;
    node[0].high = high;
    Some(offset + p as u32)
}

/// Partition `[left, right]` around a pivot on `axis` and return the pivot position.
///
/// Afterwards every item in `[left, pivot)` is `<=` the pivot on `axis` and every item in
/// `(pivot, right]` is strictly `>`. The pivot is the median whenever the median's axis value is
/// unique. Otherwise the median's run of equal values is gathered around it and the pivot moves
/// to whichever end of the run gives the more balanced split: the greatest item of the run, or
/// the greatest item below the run.
fn split<N: IndexableNum>(
    coords: &mut [N],
    ids: &mut [u32],
    left: usize,
    right: usize,
    axis: Axis,
) -> usize {
    // middle index
    let m = (left + right) >> 1;
    select(coords, ids, m, left, right, axis);
    if left == right {
        return m;
    }

    let o = axis.offset();
    let t = coords[2 * m + o];

    // gather the tie run into [a, b]
    let mut b = m;
    for i in m + 1..=right {
        if coords[2 * i + o] == t {
            b += 1;
            swap_item(coords, ids, i, b);
        }
    }
    let mut a = m;
    for i in (left..m).rev() {
        if coords[2 * i + o] == t {
            a -= 1;
            swap_item(coords, ids, i, a);
        }
    }

    let largest_side_at_b = cmp::max(b - left, right - b);
    let below_run = a > left && cmp::max(a - 1 - left, right - a + 1) < largest_side_at_b;

    if below_run {
        select(coords, ids, a - 1, left, a - 1, axis);
        a - 1
    } else {
        if b > m {
            select(coords, ids, b, m, b, axis);
        }
        b
    }
}

/// Custom Floyd-Rivest selection algorithm: sort ids and coords so that [left..k-1] items are
/// smaller than k-th item (on either x or y axis, ties broken by the other axis)
#[inline]
fn select<N: IndexableNum>(
    coords: &mut [N],
    ids: &mut [u32],
    k: usize,
    mut left: usize,
    mut right: usize,
    axis: Axis,
) {
    while right > left {
        if right - left > 600 {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = f64::ln(n);
            let s = 0.5 * f64::exp((2.0 * z) / 3.0);
            let sd = 0.5
                * f64::sqrt((z * s * (n - s)) / n)
                * (if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 });
            let new_left = cmp::max(left, f64::floor(k as f64 - (m * s) / n + sd) as usize);
            let new_right = cmp::min(
                right,
                f64::floor(k as f64 + ((n - m) * s) / n + sd) as usize,
            );
            select(coords, ids, k, new_left, new_right, axis);
        }

        let t = key(coords, k, axis);
        let mut i = left;
        let mut j = right;

        swap_item(coords, ids, left, k);
        if cmp_key(coords, right, t, axis) == Ordering::Greater {
            swap_item(coords, ids, left, right);
        }

        while i < j {
            swap_item(coords, ids, i, j);
            i += 1;
            j -= 1;
            while cmp_key(coords, i, t, axis) == Ordering::Less {
                i += 1;
            }
            while cmp_key(coords, j, t, axis) == Ordering::Greater {
                j -= 1;
            }
        }

        if cmp_key(coords, left, t, axis) == Ordering::Equal {
            swap_item(coords, ids, left, j);
        } else {
            j += 1;
            swap_item(coords, ids, j, right);
        }

        match j.cmp(&k) {
            Ordering::Less => left = j + 1,
            Ordering::Greater => right = j - 1,
            Ordering::Equal => return,
        }
    }
}

/// The sort key of item `i` on `axis`: the axis value, then the other coordinate.
#[inline]
fn key<N: IndexableNum>(coords: &[N], i: usize, axis: Axis) -> (N, N) {
    let o = axis.offset();
    (coords[2 * i + o], coords[2 * i + 1 - o])
}

#[inline]
fn cmp_key<N: IndexableNum>(coords: &[N], i: usize, t: (N, N), axis: Axis) -> Ordering {
    let (a, b) = key(coords, i, axis);
    cmp_num(a, t.0).then_with(|| cmp_num(b, t.1))
}

#[inline]
fn swap_item<N: IndexableNum>(coords: &mut [N], ids: &mut [u32], i: usize, j: usize) {
    ids.swap(i, j);
    coords.swap(2 * i, 2 * j);
    coords.swap(2 * i + 1, 2 * j + 1);
}
