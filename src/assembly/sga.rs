use std::path::PathBuf;

use bstr::{BString, ByteSlice};
use fnv::FnvHashMap;
use log::debug;

use super::{read_input, GraphSource};
use crate::fasta::ContigCatalog;
use crate::graph::{AssemblyGraph, AssemblyGraphError, Contig, GraphResult};

/// Vertices and overlap edges of an SGA ASQG file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsqgGraph {
    pub vertices: Vec<BString>,
    pub edges: Vec<(BString, BString)>,
}

/// Parse the `VT` and `ED` records of an ASQG file. The first two
/// space-separated fields of an `ED` record name the overlapping
/// vertices; alignment coordinates are ignored.
pub fn parse_asqg(input: &[u8]) -> GraphResult<AsqgGraph> {
    let mut graph = AsqgGraph::default();

    for (ix, line) in input.lines().enumerate() {
        let line_no = ix + 1;
        let mut fields = line.split_str(b"\t");
        match fields.next() {
            Some(b"VT") => {
                let name = fields
                    .next()
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        AssemblyGraphError::malformed(line_no, "vertex has no ID")
                    })?;
                graph.vertices.push(BString::from(name));
            }
            Some(b"ED") => {
                let desc = fields.next().unwrap_or(b"");
                let mut ids = desc.fields();
                match (ids.next(), ids.next()) {
                    (Some(a), Some(b)) => {
                        graph.edges.push((BString::from(a), BString::from(b)))
                    }
                    _ => {
                        return Err(AssemblyGraphError::malformed(
                            line_no,
                            "edge does not name two vertices",
                        ))
                    }
                }
            }
            _ => (),
        }
    }

    Ok(graph)
}

/// Parse an abundance file: one `<contig><TAB or comma><depth>` per
/// line.
pub fn parse_abundance(input: &[u8]) -> GraphResult<Vec<(BString, f64)>> {
    let mut result = Vec::new();
    for (ix, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(|&b| b == b'\t' || b == b',');
        let name = fields.next().map(|n| n.trim()).unwrap_or(b"");
        let depth = fields
            .next()
            .and_then(|d| d.trim().to_str().ok())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0);
        match depth {
            Some(depth) if !name.is_empty() => {
                result.push((BString::from(name), depth))
            }
            _ => {
                return Err(AssemblyGraphError::malformed(
                    ix + 1,
                    format!("invalid abundance record `{}`", line.as_bstr()),
                ))
            }
        }
    }
    Ok(result)
}

/// SGA input: an ASQG graph plus a per-contig abundance file.
#[derive(Debug, Clone)]
pub struct SgaSource {
    pub graph: PathBuf,
    pub abundance: PathBuf,
}

impl SgaSource {
    pub fn new<P: Into<PathBuf>>(graph: P, abundance: P) -> Self {
        SgaSource {
            graph: graph.into(),
            abundance: abundance.into(),
        }
    }

    pub fn build(
        asqg: &[u8],
        abundance: &[u8],
        contigs: &ContigCatalog,
    ) -> GraphResult<AssemblyGraph> {
        let asqg = parse_asqg(asqg)?;
        let abundance = parse_abundance(abundance)?;

        for vertex in asqg.vertices.iter() {
            if contigs.get(vertex).is_none() {
                return Err(AssemblyGraphError::missing_vertex(vertex));
            }
        }

        let mut coverage: FnvHashMap<&[u8], f64> = FnvHashMap::default();
        for (name, depth) in abundance.iter() {
            if contigs.get(name).is_none() {
                return Err(AssemblyGraphError::missing_vertex(name));
            }
            coverage.insert(name.as_bytes(), *depth);
        }

        let mut builder = AssemblyGraph::builder();
        for record in contigs.iter() {
            let depth =
                coverage.get(record.name.as_bytes()).copied().ok_or_else(|| {
                    AssemblyGraphError::MissingCoverage(record.name.to_string())
                })?;
            builder.add_contig(Contig::new(&record.name, record.len(), depth))?;
        }

        for (a, b) in asqg.edges.iter() {
            builder.add_edge_by_name(a, b)?;
        }

        debug!(
            "SGA graph: {} vertex records, {} edge records",
            asqg.vertices.len(),
            asqg.edges.len()
        );
        Ok(builder.build())
    }
}

impl GraphSource for SgaSource {
    fn load(&self, contigs: &ContigCatalog) -> GraphResult<AssemblyGraph> {
        let asqg = read_input(&self.graph)?;
        let abundance = read_input(&self.abundance)?;
        Self::build(asqg.as_bytes(), abundance.as_bytes(), contigs)
    }
}
