use std::collections::BTreeMap;

use crate::bins::{BinId, BinStore};
use crate::config::Config;
use crate::graph::AssemblyGraph;

/// Mean and population standard deviation of a set of coverages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl CoverageStats {
    /// `None` for an empty slice.
    pub fn from_coverages(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        // uniform coverage must give exactly sigma = 0, which summation
        // rounding doesn't guarantee
        if min == max {
            return Some(CoverageStats {
                count,
                mean: min,
                std_dev: 0.0,
            });
        }

        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance =
            values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;

        Some(CoverageStats {
            count,
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// `|coverage - mean| <= threshold * std_dev`. Inclusive, so with
    /// a zero deviation only the mean itself is consistent.
    #[inline]
    pub fn admits(&self, coverage: f64, threshold: f64) -> bool {
        (coverage - self.mean).abs() <= threshold * self.std_dev
    }

    /// Distance from the mean in standard deviations; 0 or infinity
    /// when the deviation is zero.
    pub fn z_score(&self, coverage: f64) -> f64 {
        let deviation = (coverage - self.mean).abs();
        if self.std_dev > 0.0 {
            deviation / self.std_dev
        } else if deviation == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Consistent,
    Inconsistent,
    /// No vertex within the search depth carries the label.
    NoEvidence,
}

/// The outcome of checking one vertex against one label.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub label: BinId,
    pub verdict: Verdict,
    pub stats: Option<CoverageStats>,
    /// z-score of the vertex against the label's neighbourhood;
    /// infinite without evidence.
    pub score: f64,
}

impl Assessment {
    #[inline]
    pub fn passes(&self) -> bool {
        self.verdict == Verdict::Consistent
    }
}

/// Coverages of the labelled vertices within the search depth of one
/// vertex, grouped by label. The centre vertex is never included.
#[derive(Debug, Clone, Default)]
pub struct Neighborhood {
    by_label: BTreeMap<BinId, Vec<f64>>,
}

impl Neighborhood {
    pub fn collect(
        graph: &AssemblyGraph,
        store: &BinStore,
        v: usize,
        depth: usize,
    ) -> Self {
        let mut by_label: BTreeMap<BinId, Vec<f64>> = BTreeMap::new();
        for (u, _hops) in graph.neighborhood(v, depth) {
            for label in store.labels_of(u) {
                by_label.entry(label).or_default().push(graph.coverage(u));
            }
        }
        Neighborhood { by_label }
    }

    /// Labels present in the neighbourhood, ascending.
    pub fn labels(&self) -> impl Iterator<Item = BinId> + '_ {
        self.by_label.keys().copied()
    }

    pub fn coverages(&self, label: BinId) -> &[f64] {
        self.by_label.get(&label).map(|c| c.as_slice()).unwrap_or(&[])
    }

    pub fn assess(&self, label: BinId, coverage: f64, threshold: f64) -> Assessment {
        match CoverageStats::from_coverages(self.coverages(label)) {
            Some(stats) => {
                let verdict = if stats.admits(coverage, threshold) {
                    Verdict::Consistent
                } else {
                    Verdict::Inconsistent
                };
                Assessment {
                    label,
                    verdict,
                    stats: Some(stats),
                    score: stats.z_score(coverage),
                }
            }
            None => Assessment {
                label,
                verdict: Verdict::NoEvidence,
                stats: None,
                score: f64::INFINITY,
            },
        }
    }
}

/// Scores vertices against labels using a fixed view of the bins.
/// Cheap to copy and safe to share between worker threads.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    graph: &'a AssemblyGraph,
    store: &'a BinStore,
    config: &'a Config,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        store: &'a BinStore,
        config: &'a Config,
    ) -> Self {
        Evaluator {
            graph,
            store,
            config,
        }
    }

    pub fn neighborhood(&self, v: usize) -> Neighborhood {
        Neighborhood::collect(self.graph, self.store, v, self.config.depth)
    }

    /// Check `v` against a single label.
    pub fn evaluate(&self, v: usize, label: BinId) -> Assessment {
        self.neighborhood(v).assess(
            label,
            self.graph.coverage(v),
            self.config.threshold,
        )
    }

    /// Check `v` against every label it currently holds.
    pub fn evaluate_own(&self, v: usize) -> Vec<Assessment> {
        if !self.store.is_binned(v) {
            return Vec::new();
        }
        let hood = self.neighborhood(v);
        let coverage = self.graph.coverage(v);
        self.store
            .labels_of(v)
            .map(|label| hood.assess(label, coverage, self.config.threshold))
            .collect()
    }

    /// Score `v` as if it carried each label found within the search
    /// depth, in ascending label order.
    pub fn candidates(&self, v: usize) -> Vec<Assessment> {
        let hood = self.neighborhood(v);
        let coverage = self.graph.coverage(v);
        hood.labels()
            .map(|label| hood.assess(label, coverage, self.config.threshold))
            .collect()
    }

    /// Every candidate label `v` is consistent with. Exact ties are
    /// all kept.
    pub fn passing_labels(&self, v: usize) -> Vec<BinId> {
        self.candidates(v)
            .into_iter()
            .filter(Assessment::passes)
            .map(|a| a.label)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::graph_from;

    fn config(depth: usize, threshold: f64) -> Config {
        Config {
            depth,
            threshold,
            ..Config::default()
        }
    }

    #[test]
    fn stats_use_population_deviation() {
        let stats = CoverageStats::from_coverages(&[8.0, 12.0]).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.std_dev, 2.0);

        let flat = CoverageStats::from_coverages(&[0.1, 0.1, 0.1]).unwrap();
        assert_eq!(flat.mean, 0.1);
        assert_eq!(flat.std_dev, 0.0);

        assert_eq!(CoverageStats::from_coverages(&[]), None);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let stats = CoverageStats::from_coverages(&[8.0, 12.0]).unwrap();

        assert!(stats.admits(13.0, 1.5));
        assert!(stats.admits(7.0, 1.5));
        assert!(!stats.admits(13.0 + 1e-9, 1.5));
        assert!(!stats.admits(7.0 - 1e-9, 1.5));

        assert_eq!(stats.z_score(13.0), 1.5);
    }

    #[test]
    fn zero_deviation_admits_only_the_mean() {
        let stats = CoverageStats::from_coverages(&[5.0, 5.0]).unwrap();
        assert!(stats.admits(5.0, 100.0));
        assert!(!stats.admits(5.000001, 100.0));
        assert_eq!(stats.z_score(5.0), 0.0);
        assert_eq!(stats.z_score(6.0), f64::INFINITY);
    }

    #[test]
    fn boundary_through_the_graph() {
        // 1 and 2 are the labelled neighbours of 0
        for &(cov, expected) in
            [(13.0, Verdict::Consistent), (13.5, Verdict::Inconsistent)].iter()
        {
            let graph = graph_from(&[cov, 8.0, 12.0], &[(0, 1), (0, 2)]);
            let store =
                BinStore::initial(&[("0", "a"), ("1", "a"), ("2", "a")], &graph)
                    .unwrap();
            let config = config(1, 1.5);
            let eval = Evaluator::new(&graph, &store, &config);

            let assessment = eval.evaluate(0, BinId(0));
            assert_eq!(assessment.verdict, expected);
            let stats = assessment.stats.unwrap();
            assert_eq!(stats.count, 2);
            assert_eq!(stats.mean, 10.0);
        }
    }

    #[test]
    fn label_absent_from_neighbourhood_is_no_evidence() {
        let graph = graph_from(&[10.0, 10.0, 10.0], &[(0, 1)]);
        let store =
            BinStore::initial(&[("0", "a"), ("1", "b"), ("2", "a")], &graph)
                .unwrap();
        let config = config(3, 1.5);
        let eval = Evaluator::new(&graph, &store, &config);

        let own = eval.evaluate_own(0);
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].verdict, Verdict::NoEvidence);
        assert!(own[0].score.is_infinite());
    }

    #[test]
    fn candidates_are_limited_to_depth() {
        // path 0 - 1 - 2 - 3, labels a on 1, b on 3
        let graph =
            graph_from(&[10.0, 10.0, 99.0, 10.0], &[(0, 1), (1, 2), (2, 3)]);
        let store = BinStore::initial(&[("1", "a"), ("3", "b")], &graph).unwrap();

        let shallow = config(2, 1.5);
        let eval = Evaluator::new(&graph, &store, &shallow);
        let labels: Vec<_> = eval.candidates(0).iter().map(|a| a.label).collect();
        assert_eq!(labels, vec![BinId(0)]);

        let deep = config(3, 1.5);
        let eval = Evaluator::new(&graph, &store, &deep);
        assert_eq!(eval.passing_labels(0), vec![BinId(0), BinId(1)]);
    }
}
