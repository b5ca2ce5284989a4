use bstr::{BString, ByteSlice};
use fnv::{FnvHashMap, FnvHashSet};
use lazy_static::lazy_static;
use regex::bytes::Regex;

use super::orientation::Orientation;
use crate::graph::{AssemblyGraphError, GraphResult};

/// A link between two segments, taken from a GFA `L` line. Contig
/// adjacency ignores strand, so orientations are checked but not kept,
/// and neither are overlaps or optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLink {
    pub from_segment: BString,
    pub to_segment: BString,
}

/// The parts of a GFA 1 graph that define connectivity: segment names
/// and the links between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentGraph {
    pub segments: Vec<BString>,
    pub links: Vec<SegmentLink>,
}

impl SegmentGraph {
    /// Undirected segment adjacency; a segment linked in either
    /// orientation counts as a neighbour.
    pub fn adjacency(&self) -> FnvHashMap<&'_ [u8], Vec<&'_ [u8]>> {
        let mut adj: FnvHashMap<&[u8], Vec<&[u8]>> = FnvHashMap::default();
        for link in self.links.iter() {
            let from = link.from_segment.as_bytes();
            let to = link.to_segment.as_bytes();
            adj.entry(from).or_default().push(to);
            adj.entry(to).or_default().push(from);
        }
        for targets in adj.values_mut() {
            targets.sort_unstable();
            targets.dedup();
        }
        adj
    }
}

fn parse_name(input: &[u8]) -> Option<BString> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"(?-u)^[!-)+-<>-~][!-~]*$").unwrap();
    }
    if RE.is_match(input) {
        Some(BString::from(input))
    } else {
        None
    }
}

fn is_orientation(input: &[u8]) -> bool {
    matches!(Orientation::parse_plus_minus(input), Ok((rest, _)) if rest.is_empty())
}

fn parse_link(fields: &[&[u8]], line: usize) -> GraphResult<SegmentLink> {
    if fields.len() < 4 {
        return Err(AssemblyGraphError::malformed(
            line,
            "link is missing required fields",
        ));
    }
    let invalid = |field: &str| {
        AssemblyGraphError::malformed(line, format!("invalid link field `{}`", field))
    };
    let from_segment = parse_name(fields[0]).ok_or_else(|| invalid("From"))?;
    if !is_orientation(fields[1]) {
        return Err(invalid("FromOrient"));
    }
    let to_segment = parse_name(fields[2]).ok_or_else(|| invalid("To"))?;
    if !is_orientation(fields[3]) {
        return Err(invalid("ToOrient"));
    }
    Ok(SegmentLink {
        from_segment,
        to_segment,
    })
}

/// Parse the `S` and `L` lines of a GFA 1 file. Headers, paths,
/// containments, comments, and unknown line types are skipped. Every
/// link must join two declared segments.
pub fn parse_segment_graph(input: &[u8]) -> GraphResult<SegmentGraph> {
    let mut graph = SegmentGraph::default();
    let mut declared: FnvHashSet<BString> = FnvHashSet::default();

    for (ix, line) in input.lines().enumerate() {
        let line_no = ix + 1;
        let fields: Vec<&[u8]> = line.split_str(b"\t").collect();
        match fields[0] {
            b"S" => {
                let name = fields
                    .get(1)
                    .and_then(|n| parse_name(n))
                    .ok_or_else(|| {
                        AssemblyGraphError::malformed(
                            line_no,
                            "segment has no valid name",
                        )
                    })?;
                if !declared.insert(name.clone()) {
                    return Err(AssemblyGraphError::malformed(
                        line_no,
                        format!("segment `{}` declared twice", name),
                    ));
                }
                graph.segments.push(name);
            }
            b"L" => {
                let link = parse_link(&fields[1..], line_no)?;
                graph.links.push(link);
            }
            _ => (),
        }
    }

    for link in graph.links.iter() {
        for seg in [&link.from_segment, &link.to_segment].iter() {
            if !declared.contains(*seg) {
                return Err(AssemblyGraphError::MalformedGraph {
                    line: 0,
                    reason: format!("link references undeclared segment `{}`", seg),
                });
            }
        }
    }

    Ok(graph)
}
