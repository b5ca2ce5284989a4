//! The assembly graph model: contigs as vertices carrying length and
//! coverage, joined by undirected links.

pub mod error;
pub mod names;

pub use self::error::*;
pub use self::names::NameMap;

use std::collections::VecDeque;

use bstr::{BStr, BString, ByteSlice};
use fnv::FnvHashSet;

/// A contig vertex. Created once when the graph is loaded and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub struct Contig {
    pub name: BString,
    pub length: usize,
    pub coverage: f64,
    /// Assembly graph segments the contig was built from, in path
    /// order. Empty for assemblers that don't report paths.
    pub segments: Vec<BString>,
}

impl Contig {
    pub fn new<N: AsRef<[u8]>>(name: N, length: usize, coverage: f64) -> Self {
        Contig {
            name: BString::from(name.as_ref()),
            length,
            coverage,
            segments: Vec::new(),
        }
    }

    pub fn with_segments(mut self, segments: Vec<BString>) -> Self {
        self.segments = segments;
        self
    }
}

/// Undirected, unweighted contig graph. Vertex IDs are dense indices
/// in load order, which is also the order every pass of the engine
/// visits vertices in.
#[derive(Debug, Clone, Default)]
pub struct AssemblyGraph {
    contigs: Vec<Contig>,
    names: NameMap,
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl AssemblyGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[inline]
    pub fn contig(&self, v: usize) -> &Contig {
        &self.contigs[v]
    }

    #[inline]
    pub fn coverage(&self, v: usize) -> f64 {
        self.contigs[v].coverage
    }

    pub fn contigs(&self) -> impl Iterator<Item = &'_ Contig> {
        self.contigs.iter()
    }

    /// Sorted, deduplicated neighbours of `v`.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adjacency[v]
    }

    pub fn vertex_id<N: AsRef<[u8]>>(&self, name: N) -> Option<usize> {
        self.names.map_name(name)
    }

    pub fn name(&self, v: usize) -> &BStr {
        self.contigs[v].name.as_bstr()
    }

    pub fn names(&self) -> &NameMap {
        &self.names
    }

    /// Breadth-first search from `v` bounded by `depth` hops. Returns
    /// every other reachable vertex together with its hop distance,
    /// in BFS order (nearest first, ties by vertex ID).
    pub fn neighborhood(&self, v: usize, depth: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::new();
        if depth == 0 {
            return result;
        }

        let mut visited: FnvHashSet<usize> = FnvHashSet::default();
        visited.insert(v);

        let mut queue = VecDeque::new();
        queue.push_back((v, 0));

        while let Some((current, hops)) = queue.pop_front() {
            if hops == depth {
                continue;
            }
            for &next in self.adjacency[current].iter() {
                if visited.insert(next) {
                    result.push((next, hops + 1));
                    queue.push_back((next, hops + 1));
                }
            }
        }

        result
    }
}

/// Incrementally collects contigs and links, then freezes them into an
/// immutable `AssemblyGraph`.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    contigs: Vec<Contig>,
    names: NameMap,
    edges: Vec<(usize, usize)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_contig(&mut self, contig: Contig) -> GraphResult<usize> {
        let ix = self.names.insert(&contig.name).ok_or_else(|| {
            AssemblyGraphError::DuplicateContig(contig.name.to_string())
        })?;
        self.contigs.push(contig);
        Ok(ix)
    }

    pub fn vertex_id<N: AsRef<[u8]>>(&self, name: N) -> Option<usize> {
        self.names.map_name(name)
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// Link two vertices by index. Self loops carry no information
    /// for binning and are dropped.
    pub fn add_edge(&mut self, a: usize, b: usize) -> GraphResult<()> {
        let len = self.contigs.len();
        for &v in [a, b].iter() {
            if v >= len {
                return Err(AssemblyGraphError::MissingVertex(format!(
                    "vertex #{}",
                    v
                )));
            }
        }
        if a != b {
            self.edges.push((a, b));
        }
        Ok(())
    }

    pub fn add_edge_by_name<N: AsRef<[u8]>>(
        &mut self,
        from: N,
        to: N,
    ) -> GraphResult<()> {
        let a = self
            .vertex_id(from.as_ref())
            .ok_or_else(|| AssemblyGraphError::missing_vertex(from.as_ref()))?;
        let b = self
            .vertex_id(to.as_ref())
            .ok_or_else(|| AssemblyGraphError::missing_vertex(to.as_ref()))?;
        self.add_edge(a, b)
    }

    pub fn build(self) -> AssemblyGraph {
        let mut adjacency = vec![Vec::new(); self.contigs.len()];
        for (a, b) in self.edges {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }

        let mut edge_count = 0;
        for (v, neighbors) in adjacency.iter_mut().enumerate() {
            neighbors.sort_unstable();
            neighbors.dedup();
            edge_count += neighbors.iter().filter(|&&n| n > v).count();
        }

        AssemblyGraph {
            contigs: self.contigs,
            names: self.names,
            adjacency,
            edge_count,
        }
    }
}
