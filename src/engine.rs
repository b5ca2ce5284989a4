use log::{info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::bins::{BinId, BinStore};
use crate::config::{Config, ConfigurationError};
use crate::graph::AssemblyGraph;
use crate::propagate::{propagate, resolve_overlaps};
use crate::refine::{refine, ConvergenceWarning};

/// Everything a run produced. The store is the final multi-label
/// assignment; the rest is what changed along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub store: BinStore,
    /// Labels removed by refinement, in removal order.
    pub unbound: Vec<(usize, BinId)>,
    /// Labels given to unbinned vertices by propagation.
    pub propagated: Vec<(usize, BinId)>,
    /// Labels added by overlap resolution, per vertex.
    pub overlaps: Vec<(usize, Vec<BinId>)>,
    /// Refinement + propagation rounds run.
    pub iterations: usize,
    /// Refinement passes run, over all rounds.
    pub passes: usize,
    pub warnings: Vec<ConvergenceWarning>,
}

impl RunReport {
    /// Vertices with more than one label.
    pub fn shared(&self) -> Vec<usize> {
        self.store.shared()
    }

    pub fn unbinned(&self) -> Vec<usize> {
        self.store.unbinned()
    }

    pub fn converged(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[derive(Debug, Default)]
struct Stabilized {
    unbound: Vec<(usize, BinId)>,
    propagated: Vec<(usize, BinId)>,
    iterations: usize,
    passes: usize,
    warnings: Vec<ConvergenceWarning>,
}

/// Runs refinement, propagation and overlap resolution over one graph
/// with its own worker pool.
pub struct Refiner<'g> {
    graph: &'g AssemblyGraph,
    config: Config,
    pool: ThreadPool,
}

impl<'g> Refiner<'g> {
    pub fn new(
        graph: &'g AssemblyGraph,
        config: Config,
    ) -> Result<Self, ConfigurationError> {
        let config = config.validated()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.nthreads)
            .thread_name(|ix| format!("graphbin2-{}", ix))
            .build()
            .map_err(|err| ConfigurationError::ThreadPool(err.to_string()))?;
        Ok(Refiner {
            graph,
            config,
            pool,
        })
    }

    pub fn graph(&self) -> &AssemblyGraph {
        self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn stabilize(&self, store: &mut BinStore) -> Stabilized {
        let mut result = Stabilized::default();
        let mut settled = false;

        for iteration in 1..=self.config.max_iterations {
            result.iterations = iteration;

            let refined = refine(self.graph, store, &self.config, &self.pool);
            result.passes += refined.passes;
            result.warnings.extend(refined.warning());
            result.unbound.extend(refined.unbound);

            let assigned = propagate(self.graph, store, &self.config, &self.pool);
            info!(
                "Iteration {}: {} labels propagated, {} contigs binned",
                iteration,
                assigned.len(),
                store.binned_count()
            );
            if assigned.is_empty() {
                settled = true;
                break;
            }
            result.propagated.extend(assigned);
        }

        if !settled {
            let warning = ConvergenceWarning::IterationLimit {
                iterations: result.iterations,
            };
            warn!("{}", warning);
            result.warnings.push(warning);
        }
        result
    }

    /// Run the whole pipeline on `store`, which must have been built
    /// over this refiner's graph.
    pub fn run(&self, mut store: BinStore) -> RunReport {
        debug_assert_eq!(store.len(), self.graph.len());
        info!(
            "Refining {} bins over {} contigs ({} initially binned)",
            store.label_universe().len(),
            self.graph.len(),
            store.binned_count()
        );

        let stable = self.stabilize(&mut store);
        info!(
            "Refinement removed {} labels, propagation added {}",
            stable.unbound.len(),
            stable.propagated.len()
        );

        let overlaps =
            resolve_overlaps(self.graph, &mut store, &self.config, &self.pool);
        info!(
            "{} contigs gained labels in overlap resolution",
            overlaps.len()
        );

        RunReport {
            store,
            unbound: stable.unbound,
            propagated: stable.propagated,
            overlaps,
            iterations: stable.iterations,
            passes: stable.passes,
            warnings: stable.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::Provenance;
    use crate::graph::tests::graph_from;

    fn config(depth: usize, nthreads: usize) -> Config {
        Config {
            depth,
            nthreads,
            ..Config::default()
        }
    }

    // two triangles at coverage 10 (`a`) and 50 (`b`) joined by 2-3,
    // with unbinned 6 hanging off 0
    fn two_clusters() -> (AssemblyGraph, BinStore) {
        let graph = graph_from(
            &[10.0, 10.0, 10.0, 50.0, 50.0, 50.0, 10.0],
            &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3), (0, 6)],
        );
        let store = BinStore::initial(
            &[
                ("0", "a"),
                ("1", "a"),
                ("2", "a"),
                ("3", "b"),
                ("4", "b"),
                ("5", "b"),
            ],
            &graph,
        )
        .unwrap();
        (graph, store)
    }

    // small LCG so the graph is the same on every run
    fn scrambled_graph(n: usize) -> (AssemblyGraph, BinStore) {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 33) as usize
        };

        let levels = [8.0, 20.0, 45.0];
        let coverages: Vec<f64> = (0..n)
            .map(|_| levels[next() % 3] + (next() % 5) as f64)
            .collect();
        let edges: Vec<(usize, usize)> =
            (0..n * 2).map(|_| (next() % n, next() % n)).collect();
        let graph = graph_from(&coverages, &edges);

        let mut records = Vec::new();
        for v in 0..n {
            if next() % 3 == 0 {
                records.push((v.to_string(), ["x", "y", "z"][next() % 3]));
            }
        }
        let store = BinStore::initial(&records, &graph).unwrap();
        (graph, store)
    }

    #[test]
    fn two_clusters_are_kept_apart() {
        let (graph, store) = two_clusters();
        let refiner = Refiner::new(&graph, config(1, 2)).unwrap();
        let report = refiner.run(store);

        assert!(report.converged());
        assert!(report.unbound.is_empty());
        assert_eq!(report.propagated, vec![(6, BinId(0))]);
        assert!(report.overlaps.is_empty());
        assert_eq!(report.iterations, 2);
        assert!(report.shared().is_empty());
        assert!(report.unbinned().is_empty());
        assert_eq!(
            report.store.provenance(6, BinId(0)),
            Some(Provenance::Inferred)
        );
    }

    #[test]
    fn stabilized_run_is_idempotent() {
        let (graph, store) = two_clusters();
        let refiner = Refiner::new(&graph, config(1, 2)).unwrap();
        let first = refiner.run(store);
        let second = refiner.run(first.store.clone());

        assert_eq!(second.store, first.store);
        assert!(second.unbound.is_empty());
        assert!(second.propagated.is_empty());
        assert!(second.overlaps.is_empty());
        assert_eq!(second.iterations, 1);
    }

    #[test]
    fn overlapping_bridge_joins_both_bins() {
        // a1 - x - b1, all at coverage 10; x ends up in both bins while
        // the members keep their single label
        let graph = graph_from(
            &[10.0, 10.0, 10.0, 10.0, 10.0],
            &[(0, 1), (1, 2), (2, 3), (3, 4)],
        );
        let store = BinStore::initial(
            &[("0", "a"), ("1", "a"), ("3", "b"), ("4", "b")],
            &graph,
        )
        .unwrap();
        let report = Refiner::new(&graph, config(1, 2)).unwrap().run(store);

        assert!(report.propagated.is_empty());
        assert_eq!(report.overlaps, vec![(2, vec![BinId(0), BinId(1)])]);
        assert_eq!(report.shared(), vec![2]);
        assert_eq!(report.store.labels_of(1).collect::<Vec<_>>(), vec![BinId(0)]);
        assert_eq!(report.store.labels_of(3).collect::<Vec<_>>(), vec![BinId(1)]);
    }

    #[test]
    fn discriminating_label_beyond_depth_is_ignored() {
        // u - p1 (a) - p2 (b), everything at coverage 10
        let graph = graph_from(&[10.0, 10.0, 10.0], &[(0, 1), (1, 2)]);
        let records = [("1", "a"), ("2", "b")];

        let store = BinStore::initial(&records, &graph).unwrap();
        let report = Refiner::new(&graph, config(1, 2)).unwrap().run(store);
        let labels = |v| report.store.labels_of(v).collect::<Vec<_>>();
        assert_eq!(labels(0), vec![BinId(0)]);
        // p1 sees u in `a` and p2 in `b`; p2 only sees `a`
        assert_eq!(labels(1), vec![BinId(0), BinId(1)]);
        assert_eq!(labels(2), vec![BinId(1)]);
        assert_eq!(report.overlaps, vec![(1, vec![BinId(1)])]);

        // one hop more and `b` is in reach too
        let store = BinStore::initial(&records, &graph).unwrap();
        let report = Refiner::new(&graph, config(2, 2)).unwrap().run(store);
        let labels = |v| report.store.labels_of(v).collect::<Vec<_>>();
        assert!(report.propagated.is_empty());
        assert_eq!(labels(0), vec![BinId(0), BinId(1)]);
        assert_eq!(labels(1), vec![BinId(0)]);
        assert_eq!(labels(2), vec![BinId(1)]);
        assert_eq!(report.overlaps, vec![(0, vec![BinId(0), BinId(1)])]);
    }

    #[test]
    fn unbound_outlier_stays_unbinned() {
        let graph = graph_from(
            &[10.0, 10.0, 10.0, 60.0],
            &[(0, 1), (1, 2), (2, 0), (0, 3)],
        );
        let store = BinStore::initial(
            &[("0", "a"), ("1", "a"), ("2", "a"), ("3", "a")],
            &graph,
        )
        .unwrap();
        let report = Refiner::new(&graph, config(2, 2)).unwrap().run(store);

        assert_eq!(report.unbound, vec![(3, BinId(0))]);
        assert_eq!(report.unbinned(), vec![3]);
        assert!(report.converged());
    }

    #[test]
    fn iteration_limit_is_reported() {
        // a chain of four at equal coverage, only the first one binned;
        // each round reaches one more vertex
        let graph =
            graph_from(&[10.0; 4], &[(0, 1), (1, 2), (2, 3)]);
        let records = [("0", "a")];

        let limited = Config {
            max_iterations: 1,
            ..config(1, 2)
        };
        let store = BinStore::initial(&records, &graph).unwrap();
        let report = Refiner::new(&graph, limited).unwrap().run(store);
        assert_eq!(
            report.warnings,
            vec![ConvergenceWarning::IterationLimit { iterations: 1 }]
        );
        assert_eq!(report.propagated, vec![(1, BinId(0))]);
        assert_eq!(report.unbinned(), vec![2, 3]);

        let store = BinStore::initial(&records, &graph).unwrap();
        let report = Refiner::new(&graph, config(1, 2)).unwrap().run(store);
        assert!(report.converged());
        assert_eq!(report.iterations, 4);
        assert!(report.unbinned().is_empty());
    }

    #[test]
    fn labels_are_only_lost_to_refinement() {
        let (graph, store) = scrambled_graph(80);
        let initial = store.snapshot();
        let report = Refiner::new(&graph, config(3, 4)).unwrap().run(store);

        for (v, labels) in initial.iter() {
            for &label in labels.keys() {
                assert!(
                    report.store.has_label(v, label)
                        || report.unbound.contains(&(v, label))
                );
            }
        }
        for (v, labels) in report.store.iter() {
            for (&label, &provenance) in labels.iter() {
                if provenance == Provenance::Inferred {
                    assert!(
                        report.propagated.contains(&(v, label))
                            || report
                                .overlaps
                                .iter()
                                .any(|(u, added)| *u == v && added.contains(&label))
                    );
                }
            }
        }
    }

    #[test]
    fn caps_bound_the_run() {
        let (graph, store) = scrambled_graph(120);
        let capped = Config {
            depth: 4,
            nthreads: 3,
            max_passes: 2,
            max_iterations: 2,
            ..Config::default()
        };
        let report = Refiner::new(&graph, capped).unwrap().run(store);

        assert_eq!(report.iterations, 2);
        assert_eq!(report.passes, 4);
        assert_eq!(
            report.warnings,
            vec![
                ConvergenceWarning::PassLimit { passes: 2 },
                ConvergenceWarning::PassLimit { passes: 2 },
                ConvergenceWarning::IterationLimit { iterations: 2 },
            ]
        );
        assert!(!report.converged());
    }

    #[test]
    fn thread_count_does_not_change_the_result() {
        let (graph, store) = scrambled_graph(150);
        let single = Refiner::new(&graph, config(3, 1))
            .unwrap()
            .run(store.snapshot());
        let several = Refiner::new(&graph, config(3, 4)).unwrap().run(store);
        assert_eq!(single, several);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (graph, _) = two_clusters();
        let res = Refiner::new(&graph, config(0, 2));
        assert!(matches!(res, Err(ConfigurationError::InvalidDepth(0))));
    }
}
