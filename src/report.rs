use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::assembly::AssemblerKind;
use crate::bins::BinStore;
use crate::config::Config;
use crate::engine::RunReport;
use crate::fasta::{write_record, ContigCatalog};
use crate::graph::AssemblyGraph;

/// A non-empty prefix always ends with `_`.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('_') {
        prefix.to_string()
    } else {
        format!("{}_", prefix)
    }
}

/// `contig,label` for every label every contig holds, in vertex order.
/// Shared contigs get one line per bin.
pub fn write_assignments<W: Write>(
    graph: &AssemblyGraph,
    store: &BinStore,
    out: &mut W,
) -> io::Result<()> {
    for (v, labels) in store.iter() {
        for &label in labels.keys() {
            if let Some(name) = store.label_name(label) {
                out.write_all(graph.name(v))?;
                out.write_all(b",")?;
                out.write_all(name)?;
                out.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// One unbinned contig per line.
pub fn write_unbinned<W: Write>(
    graph: &AssemblyGraph,
    store: &BinStore,
    out: &mut W,
) -> io::Result<()> {
    for v in store.unbinned() {
        out.write_all(graph.name(v))?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// `contig,label1,label2,...` for every contig in more than one bin.
pub fn write_shared<W: Write>(
    graph: &AssemblyGraph,
    store: &BinStore,
    out: &mut W,
) -> io::Result<()> {
    for v in store.shared() {
        out.write_all(graph.name(v))?;
        for label in store.labels_of(v) {
            if let Some(name) = store.label_name(label) {
                out.write_all(b",")?;
                out.write_all(name)?;
            }
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Writes the result files of a run into one output directory.
#[derive(Debug, Clone)]
pub struct Reporter {
    output: PathBuf,
    prefix: String,
}

impl Reporter {
    pub fn new<P: Into<PathBuf>>(output: P, prefix: &str) -> Self {
        Reporter {
            output: output.into(),
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<output>/<prefix><name>`
    pub fn path(&self, name: &str) -> PathBuf {
        self.output.join(format!("{}{}", self.prefix, name))
    }

    pub fn bins_dir(&self) -> PathBuf {
        self.output.join("bins")
    }

    fn create(&self, path: &Path) -> io::Result<BufWriter<File>> {
        Ok(BufWriter::new(File::create(path)?))
    }

    /// Write the assignment, unbinned and shared CSVs and one FASTA per
    /// non-empty bin. Returns the paths of the bin files.
    pub fn write_all(
        &self,
        graph: &AssemblyGraph,
        report: &RunReport,
        contigs: &ContigCatalog,
    ) -> io::Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output)?;

        let path = self.path("graphbin2_output.csv");
        let mut out = self.create(&path)?;
        write_assignments(graph, &report.store, &mut out)?;
        out.flush()?;
        info!("Wrote final binning to {}", path.display());

        let path = self.path("graphbin2_unbinned.csv");
        let mut out = self.create(&path)?;
        write_unbinned(graph, &report.store, &mut out)?;
        out.flush()?;

        let path = self.path("graphbin2_shared.csv");
        let mut out = self.create(&path)?;
        write_shared(graph, &report.store, &mut out)?;
        out.flush()?;

        self.write_bins(graph, &report.store, contigs)
    }

    /// `bins/<prefix>bin_<label>.fasta` for every label with members.
    pub fn write_bins(
        &self,
        graph: &AssemblyGraph,
        store: &BinStore,
        contigs: &ContigCatalog,
    ) -> io::Result<Vec<PathBuf>> {
        let dir = self.bins_dir();
        fs::create_dir_all(&dir)?;

        let mut written = Vec::new();
        for label in store.label_universe().ids() {
            let members = store.members(label);
            if members.is_empty() {
                continue;
            }
            let name = match store.label_name(label) {
                Some(name) => name,
                None => continue,
            };

            let path = dir.join(format!("{}bin_{}.fasta", self.prefix, name));
            let mut out = self.create(&path)?;
            for v in members {
                match contigs.get(graph.name(v)) {
                    Some(record) => write_record(record, &mut out)?,
                    None => warn!("No sequence for contig {}", graph.name(v)),
                }
            }
            out.flush()?;
            written.push(path);
        }
        info!("Wrote {} bins to {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Counters of a finished run, for the JSON summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct RunSummary {
    pub assembler: AssemblerKind,
    pub config: Config,
    pub contigs: usize,
    pub edges: usize,
    pub bins: usize,
    pub binned: usize,
    pub unbinned: usize,
    pub shared: usize,
    pub unbound: usize,
    pub propagated: usize,
    pub overlapped: usize,
    pub iterations: usize,
    pub passes: usize,
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn new(
        assembler: AssemblerKind,
        config: &Config,
        graph: &AssemblyGraph,
        report: &RunReport,
    ) -> Self {
        RunSummary {
            assembler,
            config: config.clone(),
            contigs: graph.len(),
            edges: graph.edge_count(),
            bins: report.store.label_universe().len(),
            binned: report.store.binned_count(),
            unbinned: report.unbinned().len(),
            shared: report.shared().len(),
            unbound: report.unbound.len(),
            propagated: report.propagated.len(),
            overlapped: report.overlaps.len(),
            iterations: report.iterations,
            passes: report.passes,
            warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }

    #[cfg(feature = "serde1")]
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(out, self)?;
        Ok(())
    }
}
