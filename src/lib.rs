//! Refined and overlapped binning of metagenomic contigs on the
//! assembly graph that produced them.
//!
//! An existing contig-to-bin assignment is checked against the
//! coverage of each contig's graph neighbourhood: contigs that don't
//! fit their bin are unbinned, unbinned contigs pick up the one bin
//! they fit, and contigs that fit several bins end up in all of them.

pub mod assembly;
pub mod bins;
pub mod config;
pub mod consistency;
pub mod engine;
pub mod fasta;
pub mod graph;
pub mod propagate;
pub mod refine;
pub mod report;

pub use assembly::{AssemblerKind, GraphSource};
pub use bins::{BinId, BinStore, BinningError, Provenance};
pub use config::{Config, ConfigurationError};
pub use engine::{Refiner, RunReport};
pub use graph::{AssemblyGraph, AssemblyGraphError, Contig};
pub use refine::ConvergenceWarning;
