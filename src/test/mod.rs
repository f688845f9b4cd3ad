//! Shared helpers for tests: a linear-scan oracle, point generators and a structural checker.

use geo_traits::CoordTrait;
use num_traits::ToPrimitive;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::kdtree::{KDTree, KDTreeBuilder, KDTreeIndex, Node};
use crate::IndexableNum;


/// The smallest squared distance from `(qx, qy)` to any of `points`.
pub(crate) fn brute_force_nearest(points: &[(f64, f64)], qx: f64, qy: f64) -> f64 {
    points
        .iter()
        .map(|(x, y)| (x - qx) * (x - qx) + (y - qy) * (y - qy))
        .fold(f64::INFINITY, f64::min)
}

pub(crate) fn build_tree(points: &[(f64, f64)]) -> KDTree<f64> {
    let mut builder = KDTreeBuilder::new(points.len());
    for (x, y) in points {
        builder.add(*x, *y);
    }
    builder.finish().unwrap()
}

pub(crate) fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub(crate) fn random_points(rng: &mut StdRng, n: usize, max: f64) -> Vec<(f64, f64)> {
    (0..n)
        .map(|_| (rng.gen_range(0.0..max), rng.gen_range(0.0..max)))
        .collect()
}

/// Build a tree from `points` and compare `queries` against the linear scan.
pub(crate) fn check_against_oracle(points: &[(f64, f64)], queries: &[(f64, f64)]) {
    let tree = build_tree(points);
    assert_eq!(assert_tree_invariants(&tree), points.len());

    for &(qx, qy) in queries {
        let result = tree.nearest(qx, qy).unwrap();
        assert_eq!(
            result.distance_squared,
            brute_force_nearest(points, qx, qy),
            "wrong distance for query ({qx}, {qy})"
        );
        let (x, y) = points[result.id as usize];
        assert_eq!((result.coord.x(), result.coord.y()), (x, y));
    }
}

/// Walk the whole tree checking that low subtrees are `<=` and high subtrees are `>` their
/// parent on the parent's axis. Returns the number of nodes.
pub(crate) fn assert_tree_invariants<N: IndexableNum, T: KDTreeIndex<N>>(tree: &T) -> usize {
    let count = match tree.root() {
        Some(root) => check_subtree(&root).count,
        None => 0,
    };
    assert_eq!(count, tree.num_items() as usize);
    count
}

struct Bounds {
    count: usize,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    fn extend(&mut self, other: &Bounds) {
        self.count += other.count;
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }
}

fn check_subtree<N: IndexableNum, T: KDTreeIndex<N>>(node: &Node<'_, N, T>) -> Bounds {
    let coord = node.coord();
    let (x, y) = (coord.x().to_f64().unwrap(), coord.y().to_f64().unwrap());
    let axis = node.axis();
    let split = axis.select(x, y);

    let mut bounds = Bounds {
        count: 1,
        min_x: x,
        min_y: y,
        max_x: x,
        max_y: y,
    };
    if let Some(low) = node.low_child() {
        assert_eq!(low.depth(), node.depth() + 1);
        let low_bounds = check_subtree(&low);
        assert!(axis.select(low_bounds.max_x, low_bounds.max_y) <= split);
        bounds.extend(&low_bounds);
    }
    if let Some(high) = node.high_child() {
        let high_bounds = check_subtree(&high);
        assert!(axis.select(high_bounds.min_x, high_bounds.min_y) > split);
        bounds.extend(&high_bounds);
    }
    bounds
}
