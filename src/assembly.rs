pub mod gfa;
pub mod orientation;
pub mod sga;
pub mod spades;

pub use self::orientation::Orientation;
pub use self::sga::SgaSource;
pub use self::spades::SpadesSource;

use std::fs::File;
use std::path::Path;

use log::info;
use memmap::Mmap;

use crate::config::ConfigurationError;
use crate::fasta::ContigCatalog;
use crate::graph::{AssemblyGraph, GraphResult};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// The assembler that produced the graph, which decides how its files
/// are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum AssemblerKind {
    Spades,
    Sga,
}

/// Case-insensitive, so `SPAdes`, `spades` and `SPADES` all parse.
impl std::str::FromStr for AssemblerKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spades" => Ok(AssemblerKind::Spades),
            "sga" => Ok(AssemblerKind::Sga),
            _ => Err(ConfigurationError::UnknownAssembler(s.to_string())),
        }
    }
}

impl std::fmt::Display for AssemblerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssemblerKind::Spades => write!(f, "SPAdes"),
            AssemblerKind::Sga => write!(f, "SGA"),
        }
    }
}

/// Anything that can produce a contig graph from assembler-specific
/// files, given the contigs those files describe.
pub trait GraphSource {
    fn load(&self, contigs: &ContigCatalog) -> GraphResult<AssemblyGraph>;
}

/// Read-only view of an input file. Non-empty files are memory
/// mapped; assembly graphs can be several gigabytes.
pub enum InputBytes {
    Mapped(Mmap),
    Empty,
}

impl InputBytes {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            InputBytes::Mapped(mmap) => mmap.as_ref(),
            InputBytes::Empty => &[],
        }
    }
}

pub fn read_input<P: AsRef<Path>>(path: P) -> GraphResult<InputBytes> {
    let file = File::open(path.as_ref())?;
    if file.metadata()?.len() == 0 {
        return Ok(InputBytes::Empty);
    }
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(InputBytes::Mapped(mmap))
}

/// Build the assembly graph for `kind`. `aux` is the `contigs.paths`
/// file for SPAdes and the abundance file for SGA.
pub fn load<P: AsRef<Path>>(
    graph_file: P,
    contigs: &ContigCatalog,
    kind: AssemblerKind,
    aux: P,
) -> GraphResult<AssemblyGraph> {
    let graph_file = graph_file.as_ref();
    let aux = aux.as_ref();
    let source: Box<dyn GraphSource> = match kind {
        AssemblerKind::Spades => Box::new(SpadesSource::new(graph_file, aux)),
        AssemblerKind::Sga => Box::new(SgaSource::new(graph_file, aux)),
    };

    let graph = source.load(contigs)?;
    info!(
        "Loaded {} assembly graph: {} contigs, {} edges",
        kind,
        graph.len(),
        graph.edge_count()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn assembler_kind_is_case_insensitive() {
        assert_eq!("SPAdes".parse::<AssemblerKind>().unwrap(), AssemblerKind::Spades);
        assert_eq!("sga".parse::<AssemblerKind>().unwrap(), AssemblerKind::Sga);
        assert!(matches!(
            "megahit".parse::<AssemblerKind>(),
            Err(ConfigurationError::UnknownAssembler(_))
        ));
    }

    #[test]
    fn load_dispatches_on_assembler() {
        let dir = tempfile::tempdir().unwrap();
        let asqg = dir.path().join("graph.asqg");
        let abundance = dir.path().join("abundance.txt");

        let mut f = File::create(&asqg).unwrap();
        writeln!(f, "HT\tVN:i:1").unwrap();
        writeln!(f, "VT\tcontig-0\tACGT").unwrap();
        writeln!(f, "VT\tcontig-1\tACGT").unwrap();
        writeln!(f, "ED\tcontig-0 contig-1 0 3 4 0 3 4 0 0").unwrap();
        let mut f = File::create(&abundance).unwrap();
        writeln!(f, "contig-0\t12.0").unwrap();
        writeln!(f, "contig-1\t14.0").unwrap();

        let catalog =
            ContigCatalog::from_reader(&b">contig-0\nACGT\n>contig-1\nACGT\n"[..])
                .unwrap();

        let graph = load(&asqg, &catalog, AssemblerKind::Sga, &abundance).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.coverage(1), 14.0);
    }

    #[test]
    fn empty_files_read_as_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let bytes = read_input(file.path()).unwrap();
        assert!(bytes.as_bytes().is_empty());
    }
}
