use graphbin2::bins::BinStore;
use graphbin2::config::Config;
use graphbin2::engine::Refiner;
use graphbin2::graph::{AssemblyGraph, Contig};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

// `clusters` chains of `size` contigs at distinct coverages, with a
// few cross links and every third contig binned
fn synthetic(clusters: usize, size: usize) -> (AssemblyGraph, BinStore) {
    let mut builder = AssemblyGraph::builder();
    for c in 0..clusters {
        for i in 0..size {
            let coverage = 10.0 * (c + 1) as f64 + (i % 3) as f64;
            let name = format!("NODE_{}_{}", c, i);
            builder.add_contig(Contig::new(name, 1000, coverage)).unwrap();
        }
    }
    for c in 0..clusters {
        let base = c * size;
        for i in 1..size {
            builder.add_edge(base + i - 1, base + i).unwrap();
            if i >= 4 && i % 4 == 0 {
                builder.add_edge(base + i - 4, base + i).unwrap();
            }
        }
        if c > 0 {
            builder.add_edge(base, base - 1).unwrap();
        }
    }
    let graph = builder.build();

    let records: Vec<(String, String)> = (0..graph.len())
        .filter(|v| v % 3 == 0)
        .map(|v| (graph.name(v).to_string(), format!("bin{}", v / size)))
        .collect();
    let store = BinStore::initial(&records, &graph).unwrap();
    (graph, store)
}

macro_rules! bench_refine {
    ($name:ident, $clusters:literal, $size:literal, $depth:literal) => {
        fn $name(c: &mut Criterion) {
            let (graph, store) = synthetic($clusters, $size);
            let config = Config {
                depth: $depth,
                nthreads: 4,
                ..Config::default()
            };
            let refiner = Refiner::new(&graph, config).unwrap();
            let id = format!("{}x{}", $clusters, $size);
            c.bench_with_input(
                BenchmarkId::new(concat!("depth_", $depth), id),
                &store,
                |b, s| {
                    b.iter(|| refiner.run(s.snapshot()));
                },
            );
        }
    };
}

bench_refine!(small_shallow, 10, 100, 2);
bench_refine!(small_deep, 10, 100, 5);
bench_refine!(large_shallow, 40, 500, 2);
bench_refine!(large_deep, 40, 500, 5);

criterion_group!(
    name = refine_benches;
    config = Criterion::default().sample_size(20);
    targets = small_shallow, small_deep, large_shallow, large_deep
);

criterion_main!(refine_benches);
