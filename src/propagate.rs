use log::debug;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::bins::{BinId, BinStore};
use crate::config::Config;
use crate::consistency::Evaluator;
use crate::graph::AssemblyGraph;

/// Give each unbinned vertex the one label it is consistent with, if
/// there is exactly one. Vertices with several passing labels are left
/// for `resolve_overlaps`. Returns the assignments in the order they
/// were applied (ascending vertex).
pub fn propagate(
    graph: &AssemblyGraph,
    store: &mut BinStore,
    config: &Config,
    pool: &ThreadPool,
) -> Vec<(usize, BinId)> {
    let assignments: Vec<(usize, BinId)> = {
        let eval = Evaluator::new(graph, store, config);
        let snapshot = &*store;
        pool.install(|| {
            (0..graph.len())
                .into_par_iter()
                .filter(|&v| !snapshot.is_binned(v))
                .filter_map(|v| match eval.passing_labels(v).as_slice() {
                    [label] => Some((v, *label)),
                    _ => None,
                })
                .collect()
        })
    };

    for &(v, label) in assignments.iter() {
        store.add(v, label);
        if let Some(name) = store.label_name(label) {
            debug!("Propagated bin {} to contig {}", name, graph.name(v));
        }
    }
    assignments
}

/// Give every vertex consistent with more than one label all of those
/// labels. A binned vertex only counts a label it holds when that label
/// passes, so a lone passing label from another bin never makes it
/// shared. Labels are only added. Returns the labels added per vertex,
/// ascending.
pub fn resolve_overlaps(
    graph: &AssemblyGraph,
    store: &mut BinStore,
    config: &Config,
    pool: &ThreadPool,
) -> Vec<(usize, Vec<BinId>)> {
    let additions: Vec<(usize, Vec<BinId>)> = {
        let eval = Evaluator::new(graph, store, config);
        let snapshot = &*store;
        pool.install(|| {
            (0..graph.len())
                .into_par_iter()
                .filter_map(|v| {
                    let passing = eval.passing_labels(v);
                    if passing.len() < 2 {
                        return None;
                    }
                    let new: Vec<BinId> = passing
                        .into_iter()
                        .filter(|&label| !snapshot.has_label(v, label))
                        .collect();
                    if new.is_empty() {
                        None
                    } else {
                        Some((v, new))
                    }
                })
                .collect()
        })
    };

    for (v, labels) in additions.iter() {
        for &label in labels.iter() {
            store.add(*v, label);
        }
        debug!(
            "Contig {} now belongs to {} bins",
            graph.name(*v),
            store.label_set(*v).len()
        );
    }
    additions
}
