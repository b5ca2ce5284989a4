use std::fmt;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::bins::{BinId, BinStore};
use crate::config::Config;
use crate::consistency::{Evaluator, Verdict};
use crate::graph::AssemblyGraph;

/// A fixed-point loop hit its cap. The run still completes with the
/// state reached so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceWarning {
    /// Refinement was still unbinding labels after `passes` passes.
    PassLimit { passes: usize },
    /// Propagation was still assigning labels after `iterations`
    /// refinement + propagation rounds.
    IterationLimit { iterations: usize },
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvergenceWarning::PassLimit { passes } => write!(
                f,
                "Refinement did not converge within {} passes",
                passes
            ),
            ConvergenceWarning::IterationLimit { iterations } => write!(
                f,
                "Propagation did not converge within {} iterations",
                iterations
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefinementOutcome {
    pub passes: usize,
    /// Every label removed, in the order it was removed.
    pub unbound: Vec<(usize, BinId)>,
    pub converged: bool,
}

impl RefinementOutcome {
    pub fn warning(&self) -> Option<ConvergenceWarning> {
        if self.converged {
            None
        } else {
            Some(ConvergenceWarning::PassLimit {
                passes: self.passes,
            })
        }
    }
}

/// All `(vertex, label)` pairs where the vertex is inconsistent with a
/// label it holds, judged against `store` as it is now. Ascending by
/// vertex, then label.
pub fn inconsistent_labels(
    graph: &AssemblyGraph,
    store: &BinStore,
    config: &Config,
    pool: &ThreadPool,
) -> Vec<(usize, BinId)> {
    let eval = Evaluator::new(graph, store, config);
    let found: Vec<Vec<(usize, BinId)>> = pool.install(|| {
        (0..graph.len())
            .into_par_iter()
            .map(|v| {
                eval.evaluate_own(v)
                    .into_iter()
                    .filter(|a| a.verdict == Verdict::Inconsistent)
                    .map(|a| (v, a.label))
                    .collect()
            })
            .collect()
    });
    found.into_iter().flatten().collect()
}

/// Unbind inconsistent labels until a pass finds none or
/// `config.max_passes` is reached. Each pass judges every vertex
/// against the bins as they were when the pass began.
pub fn refine(
    graph: &AssemblyGraph,
    store: &mut BinStore,
    config: &Config,
    pool: &ThreadPool,
) -> RefinementOutcome {
    let mut outcome = RefinementOutcome::default();

    for pass in 1..=config.max_passes {
        outcome.passes = pass;
        let unbind = inconsistent_labels(graph, store, config, pool);
        if unbind.is_empty() {
            outcome.converged = true;
            break;
        }

        debug!("Refinement pass {}: unbinding {} labels", pass, unbind.len());
        for &(v, label) in unbind.iter() {
            store.remove(v, label);
            if !store.is_binned(v) {
                debug!("Contig {} is now unbinned", graph.name(v));
            }
        }
        outcome.unbound.extend(unbind);
    }

    if let Some(warning) = outcome.warning() {
        warn!("{}", warning);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::Provenance;
    use crate::graph::tests::graph_from;
    use rayon::ThreadPoolBuilder;

    fn pool() -> ThreadPool {
        ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn config(depth: usize, max_passes: usize) -> Config {
        Config {
            depth,
            max_passes,
            ..Config::default()
        }
    }

    // triangle 0-1-2 at coverage 10, outlier 3 at coverage 50 hanging
    // off 0; everything starts in bin `a`
    fn outlier_graph() -> (AssemblyGraph, BinStore) {
        let graph = graph_from(
            &[10.0, 10.0, 10.0, 50.0],
            &[(0, 1), (1, 2), (2, 0), (0, 3)],
        );
        let store = BinStore::initial(
            &[("0", "a"), ("1", "a"), ("2", "a"), ("3", "a")],
            &graph,
        )
        .unwrap();
        (graph, store)
    }

    #[test]
    fn outlier_is_unbound_and_cluster_kept() {
        let (graph, mut store) = outlier_graph();
        let outcome = refine(&graph, &mut store, &config(1, 10), &pool());

        assert!(outcome.converged);
        assert_eq!(outcome.passes, 2);
        assert_eq!(outcome.unbound, vec![(3, BinId(0))]);
        assert_eq!(outcome.warning(), None);

        assert!(!store.is_binned(3));
        for v in 0..3 {
            assert_eq!(store.labels_of(v).collect::<Vec<_>>(), vec![BinId(0)]);
            assert_eq!(store.provenance(v, BinId(0)), Some(Provenance::Original));
        }
    }

    #[test]
    fn pass_reads_the_state_from_its_start() {
        // 0 (cov 100) - 1 (cov 12) - 2 (cov 10) - 3 (cov 10), all in `a`.
        // 1 is consistent while 0 is still binned and inconsistent once
        // it isn't, so it may only go in the pass after 0.
        let graph =
            graph_from(&[100.0, 12.0, 10.0, 10.0], &[(0, 1), (1, 2), (2, 3)]);
        let initial = BinStore::initial(
            &[("0", "a"), ("1", "a"), ("2", "a"), ("3", "a")],
            &graph,
        )
        .unwrap();

        let mut store = initial.snapshot();
        let outcome = refine(&graph, &mut store, &config(1, 1), &pool());
        assert_eq!(outcome.unbound, vec![(0, BinId(0))]);
        assert!(store.is_binned(1));

        let mut store = initial;
        let outcome = refine(&graph, &mut store, &config(1, 10), &pool());
        assert!(outcome.converged);
        assert_eq!(outcome.passes, 3);
        assert_eq!(outcome.unbound, vec![(0, BinId(0)), (1, BinId(0))]);
        assert_eq!(store.unbinned(), vec![0, 1]);
    }

    #[test]
    fn pass_limit_is_reported() {
        let (graph, mut store) = outlier_graph();
        let outcome = refine(&graph, &mut store, &config(1, 1), &pool());

        assert!(!outcome.converged);
        assert_eq!(outcome.passes, 1);
        assert_eq!(
            outcome.warning(),
            Some(ConvergenceWarning::PassLimit { passes: 1 })
        );
        // the one pass still applied its unbinding
        assert!(!store.is_binned(3));
    }

    #[test]
    fn isolated_contig_keeps_its_label() {
        let graph = graph_from(&[10.0, 80.0], &[]);
        let mut store =
            BinStore::initial(&[("0", "a"), ("1", "a")], &graph).unwrap();
        let outcome = refine(&graph, &mut store, &config(5, 10), &pool());
        assert!(outcome.unbound.is_empty());
        assert_eq!(store.binned_count(), 2);
    }
}
