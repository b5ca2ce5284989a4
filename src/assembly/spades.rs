use std::path::PathBuf;

use bstr::{BString, ByteSlice};
use fnv::FnvHashMap;
use log::debug;
use nom::{
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{map_res, opt},
    number::complete::recognize_float,
    IResult,
};

use super::{gfa::parse_segment_graph, orientation::split_oriented};
use super::{read_input, GraphSource};
use crate::fasta::ContigCatalog;
use crate::graph::{AssemblyGraph, AssemblyGraphError, Contig, GraphResult};

/// The fields SPAdes encodes in a contig name,
/// `NODE_<id>_length_<len>_cov_<k-mer coverage>`, with a trailing `'`
/// marking the reverse complement entry in `contigs.paths`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpadesName {
    pub id: usize,
    pub length: usize,
    pub coverage: f64,
    pub reverse: bool,
}

fn parse_usize(bs: &[u8]) -> Result<usize, ()> {
    bs.to_str().ok().and_then(|s| s.parse().ok()).ok_or(())
}

fn parse_f64(bs: &[u8]) -> Result<f64, ()> {
    bs.to_str().ok().and_then(|s| s.parse().ok()).ok_or(())
}

impl SpadesName {
    fn parse_name(i: &[u8]) -> IResult<&[u8], SpadesName> {
        let (i, _) = tag("NODE_")(i)?;
        let (i, id) = map_res(digit1, parse_usize)(i)?;
        let (i, _) = tag("_length_")(i)?;
        let (i, length) = map_res(digit1, parse_usize)(i)?;
        let (i, _) = tag("_cov_")(i)?;
        let (i, coverage) = map_res(recognize_float, parse_f64)(i)?;
        let (i, reverse) = opt(tag("'"))(i)?;
        Ok((
            i,
            SpadesName {
                id,
                length,
                coverage,
                reverse: reverse.is_some(),
            },
        ))
    }

    /// Parse a full contig name. Trailing text after the coverage
    /// (other than the reverse marker) is rejected.
    pub fn parse(name: &[u8]) -> Option<Self> {
        match Self::parse_name(name.trim()) {
            Ok((rest, parsed)) if rest.is_empty() => Some(parsed),
            _ => None,
        }
    }
}

/// One forward entry of `contigs.paths`: the contig name and the
/// segments of its path, with `;` gaps flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct ContigPath {
    pub name: BString,
    pub coverage: f64,
    pub segments: Vec<BString>,
}

impl ContigPath {
    /// The first and last segments of the path. For a single-segment
    /// path both are the same segment.
    pub fn ends(&self) -> Option<(&[u8], &[u8])> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Some((first.as_bytes(), last.as_bytes()))
    }
}

/// Parse a `contigs.paths` file. Reverse complement entries repeat the
/// forward path and are skipped.
pub fn parse_contig_paths(input: &[u8]) -> GraphResult<Vec<ContigPath>> {
    let mut paths: Vec<ContigPath> = Vec::new();
    // whether path lines currently belong to a forward entry
    let mut in_forward = false;

    for (ix, line) in input.lines().enumerate() {
        let line_no = ix + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(b"NODE_") {
            let name = SpadesName::parse(line).ok_or_else(|| {
                AssemblyGraphError::malformed(
                    line_no,
                    format!("invalid contig name `{}`", line.as_bstr()),
                )
            })?;
            in_forward = !name.reverse;
            if in_forward {
                paths.push(ContigPath {
                    name: BString::from(line),
                    coverage: name.coverage,
                    segments: Vec::new(),
                });
            }
            continue;
        }

        let current = match paths.last_mut() {
            Some(current) if in_forward => current,
            Some(_) => continue,
            None => {
                return Err(AssemblyGraphError::malformed(
                    line_no,
                    "path listed before any contig name",
                ))
            }
        };

        for step in line.split(|&b| b == b',' || b == b';') {
            if step.is_empty() {
                continue;
            }
            let (segment, _orient) = split_oriented(step).ok_or_else(|| {
                AssemblyGraphError::malformed(
                    line_no,
                    format!("invalid path step `{}`", step.as_bstr()),
                )
            })?;
            current.segments.push(BString::from(segment));
        }
    }

    Ok(paths)
}

/// SPAdes input: `assembly_graph_with_scaffolds.gfa` plus
/// `contigs.paths`.
#[derive(Debug, Clone)]
pub struct SpadesSource {
    pub graph: PathBuf,
    pub paths: PathBuf,
}

impl SpadesSource {
    pub fn new<P: Into<PathBuf>>(graph: P, paths: P) -> Self {
        SpadesSource {
            graph: graph.into(),
            paths: paths.into(),
        }
    }

    /// Build the contig graph from in-memory file contents.
    pub fn build(
        gfa: &[u8],
        contig_paths: &[u8],
        contigs: &ContigCatalog,
    ) -> GraphResult<AssemblyGraph> {
        let segment_graph = parse_segment_graph(gfa)?;
        let paths = parse_contig_paths(contig_paths)?;

        let mut path_of: FnvHashMap<&[u8], usize> = FnvHashMap::default();
        for (ix, path) in paths.iter().enumerate() {
            if contigs.get(&path.name).is_none() {
                return Err(AssemblyGraphError::missing_vertex(&path.name));
            }
            path_of.insert(path.name.as_bytes(), ix);
        }

        let declared: fnv::FnvHashSet<&[u8]> = segment_graph
            .segments
            .iter()
            .map(|s| s.as_bytes())
            .collect();

        let mut builder = AssemblyGraph::builder();
        for record in contigs.iter() {
            let (coverage, segments) = match path_of.get(record.name.as_bytes())
            {
                Some(&ix) => (paths[ix].coverage, paths[ix].segments.clone()),
                None => {
                    let name = SpadesName::parse(&record.name).ok_or_else(|| {
                        AssemblyGraphError::MissingCoverage(record.name.to_string())
                    })?;
                    (name.coverage, Vec::new())
                }
            };
            if let Some(seg) =
                segments.iter().find(|s| !declared.contains(s.as_bytes()))
            {
                return Err(AssemblyGraphError::MalformedGraph {
                    line: 0,
                    reason: format!(
                        "path of `{}` uses unknown segment `{}`",
                        record.name, seg
                    ),
                });
            }
            let contig = Contig::new(&record.name, record.len(), coverage)
                .with_segments(segments);
            builder.add_contig(contig)?;
        }

        // segment -> every contig whose path visits it
        let mut segment_contigs: FnvHashMap<&[u8], Vec<usize>> =
            FnvHashMap::default();
        let mut path_ends = Vec::with_capacity(paths.len());
        for path in paths.iter() {
            let v = match builder.vertex_id(&path.name) {
                Some(v) => v,
                None => continue,
            };
            for seg in path.segments.iter() {
                let owners = segment_contigs.entry(seg.as_bytes()).or_default();
                if owners.last() != Some(&v) {
                    owners.push(v);
                }
            }
            if let Some(ends) = path.ends() {
                path_ends.push((v, ends));
            }
        }

        let adjacency = segment_graph.adjacency();
        let mut edges = Vec::new();
        for (v, (first, last)) in path_ends {
            for end in [first, last].iter() {
                let linked = match adjacency.get(end) {
                    Some(linked) => linked,
                    None => continue,
                };
                for seg in linked.iter() {
                    if let Some(owners) = segment_contigs.get(seg) {
                        edges.extend(owners.iter().map(|&u| (v, u)));
                    }
                }
            }
        }

        for (a, b) in edges {
            builder.add_edge(a, b)?;
        }

        let graph = builder.build();
        debug!(
            "SPAdes graph: {} segments, {} links, {} contig paths",
            segment_graph.segments.len(),
            segment_graph.links.len(),
            paths.len()
        );
        Ok(graph)
    }
}

impl GraphSource for SpadesSource {
    fn load(&self, contigs: &ContigCatalog) -> GraphResult<AssemblyGraph> {
        let gfa = read_input(&self.graph)?;
        let paths = read_input(&self.paths)?;
        Self::build(gfa.as_bytes(), paths.as_bytes(), contigs)
    }
}
