use criterion::{black_box, criterion_group, criterion_main, Criterion};
use planar_index::kdtree::{KDTree, KDTreeBuilder, KDTreeIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstar::RTree;

const NUM_POINTS: usize = 100_000;
const NUM_QUERIES: usize = 1000;

fn random_points(seed: u64, n: usize) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| [rng.gen_range(0.0..500.0), rng.gen_range(0.0..500.0)])
        .collect()
}

fn construct_kdtree(points: &[[f64; 2]]) -> KDTree<f64> {
    let mut builder = KDTreeBuilder::new(points.len());
    for [x, y] in points {
        builder.add(*x, *y);
    }
    builder.finish().unwrap()
}

fn construct_rstar(points: Vec<[f64; 2]>) -> RTree<[f64; 2]> {
    RTree::bulk_load(points)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let points = random_points(1, NUM_POINTS);
    // clustered along a line, where pruning helps much less
    let collinear: Vec<[f64; 2]> = (0..NUM_POINTS).map(|i| [1.0, i as f64 * 0.01]).collect();
    let queries = random_points(2, NUM_QUERIES);

    c.bench_function("construction (kdtree)", |b| {
        b.iter(|| construct_kdtree(&points))
    });

    c.bench_function("construction (rstar bulk)", |b| {
        b.iter(|| construct_rstar(points.to_vec()))
    });

    let kdtree = construct_kdtree(&points);
    let rstar_tree = construct_rstar(points.to_vec());
    let collinear_kdtree = construct_kdtree(&collinear);

    c.bench_function("nearest (kdtree)", |b| {
        b.iter(|| {
            for [x, y] in &queries {
                black_box(kdtree.nearest(*x, *y).unwrap());
            }
        })
    });

    c.bench_function("nearest (rstar)", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(rstar_tree.nearest_neighbor(query));
            }
        })
    });

    c.bench_function("nearest collinear (kdtree)", |b| {
        b.iter(|| {
            for [x, y] in &queries {
                black_box(collinear_kdtree.nearest(*x, *y).unwrap());
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
