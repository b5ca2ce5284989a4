use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::{error, fmt};

use bstr::{BStr, BString, ByteSlice};

use crate::assembly::read_input;
use crate::graph::{AssemblyGraph, AssemblyGraphError, NameMap};

/// Dense index of a bin label in the run's label universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinId(pub u32);

impl BinId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The fixed universe of bin labels, taken from the initial binning
/// in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinLabels {
    names: NameMap,
}

impl BinLabels {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return the ID of `name`, adding it to the universe if needed.
    pub fn intern<N: AsRef<[u8]>>(&mut self, name: N) -> BinId {
        let name = name.as_ref();
        let ix = match self.names.map_name(name) {
            Some(ix) => ix,
            None => self.names.len(),
        };
        self.names.insert(name);
        BinId(ix as u32)
    }

    pub fn get<N: AsRef<[u8]>>(&self, name: N) -> Option<BinId> {
        self.names.map_name(name).map(|ix| BinId(ix as u32))
    }

    pub fn name(&self, id: BinId) -> Option<&'_ BStr> {
        self.names.inverse_map_name(id.index())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BinId> {
        (0..self.names.len()).map(|ix| BinId(ix as u32))
    }
}

/// Where a contig's label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Present in the initial binning.
    Original,
    /// Added by propagation or overlap resolution.
    Inferred,
}

pub type LabelSet = BTreeMap<BinId, Provenance>;

/// Contig → set of bin labels. The only place bin membership is
/// changed; an empty set means the contig is unbinned.
#[derive(Debug, Clone, PartialEq)]
pub struct BinStore {
    labels: Arc<BinLabels>,
    assignments: Vec<LabelSet>,
}

impl BinStore {
    /// An empty store over `vertex_count` contigs.
    pub fn new(labels: BinLabels, vertex_count: usize) -> Self {
        BinStore {
            labels: Arc::new(labels),
            assignments: vec![LabelSet::new(); vertex_count],
        }
    }

    /// Build the store from `(contig, label)` records. Every contig
    /// must be a vertex of `graph` and appear at most once.
    pub fn initial<C, L>(
        records: &[(C, L)],
        graph: &AssemblyGraph,
    ) -> Result<Self, BinningError>
    where
        C: AsRef<[u8]>,
        L: AsRef<[u8]>,
    {
        let mut labels = BinLabels::new();
        let mut pairs = Vec::with_capacity(records.len());
        for (contig, label) in records.iter() {
            let contig = contig.as_ref();
            let v = graph
                .vertex_id(contig)
                .ok_or_else(|| AssemblyGraphError::missing_vertex(contig))?;
            pairs.push((v, labels.intern(label)));
        }

        let mut store = BinStore::new(labels, graph.len());
        for (v, bin) in pairs {
            if store.is_binned(v) {
                return Err(BinningError::DuplicateContig(
                    graph.name(v).to_string(),
                ));
            }
            store.insert(v, bin, Provenance::Original);
        }
        Ok(store)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn label_universe(&self) -> &BinLabels {
        &self.labels
    }

    pub fn label_name(&self, id: BinId) -> Option<&'_ BStr> {
        self.labels.name(id)
    }

    pub fn labels_of(&self, v: usize) -> impl Iterator<Item = BinId> + '_ {
        self.assignments[v].keys().copied()
    }

    pub fn label_set(&self, v: usize) -> &LabelSet {
        &self.assignments[v]
    }

    #[inline]
    pub fn has_label(&self, v: usize, label: BinId) -> bool {
        self.assignments[v].contains_key(&label)
    }

    #[inline]
    pub fn is_binned(&self, v: usize) -> bool {
        !self.assignments[v].is_empty()
    }

    pub fn provenance(&self, v: usize, label: BinId) -> Option<Provenance> {
        self.assignments[v].get(&label).copied()
    }

    fn insert(&mut self, v: usize, label: BinId, provenance: Provenance) -> bool {
        debug_assert!(label.index() < self.labels.len());
        if self.assignments[v].contains_key(&label) {
            return false;
        }
        self.assignments[v].insert(label, provenance);
        true
    }

    /// Replace the labels of `v`. Labels it already held keep their
    /// provenance; new ones are marked inferred.
    pub fn set<I: IntoIterator<Item = BinId>>(&mut self, v: usize, labels: I) {
        let old = std::mem::take(&mut self.assignments[v]);
        for label in labels {
            let provenance =
                old.get(&label).copied().unwrap_or(Provenance::Inferred);
            self.insert(v, label, provenance);
        }
    }

    /// Add an inferred label. Returns false if `v` already had it.
    pub fn add(&mut self, v: usize, label: BinId) -> bool {
        self.insert(v, label, Provenance::Inferred)
    }

    /// Returns false if `v` didn't have the label.
    pub fn remove(&mut self, v: usize, label: BinId) -> bool {
        self.assignments[v].remove(&label).is_some()
    }

    /// A frozen copy to read from while a pass computes its changes.
    pub fn snapshot(&self) -> BinStore {
        self.clone()
    }

    pub fn binned_count(&self) -> usize {
        self.assignments.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &'_ LabelSet)> {
        self.assignments.iter().enumerate()
    }

    /// Vertices with no label, in ascending order.
    pub fn unbinned(&self) -> Vec<usize> {
        self.iter()
            .filter(|(_, s)| s.is_empty())
            .map(|(v, _)| v)
            .collect()
    }

    /// Vertices carrying more than one label, in ascending order.
    pub fn shared(&self) -> Vec<usize> {
        self.iter()
            .filter(|(_, s)| s.len() > 1)
            .map(|(v, _)| v)
            .collect()
    }

    /// All vertices carrying `label`, in ascending order.
    pub fn members(&self, label: BinId) -> Vec<usize> {
        self.iter()
            .filter(|(_, s)| s.contains_key(&label))
            .map(|(v, _)| v)
            .collect()
    }
}

/// Errors in the initial binning input.
#[derive(Debug)]
pub enum BinningError {
    /// A line wasn't `contig,label`. Includes the line number (1-based)
    /// and the line.
    InvalidLine(usize, String),
    /// The same contig was binned more than once.
    DuplicateContig(String),
    /// The binning referenced a contig missing from the graph.
    Graph(AssemblyGraphError),
}

impl fmt::Display for BinningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinningError as BE;
        match self {
            BE::InvalidLine(line, content) => write!(
                f,
                "Failed to parse binning line {} `{}`, expected `contig,bin`",
                line, content
            ),
            BE::DuplicateContig(name) => {
                write!(f, "Contig `{}` appears more than once in the binning", name)
            }
            BE::Graph(err) => write!(f, "{}", err),
        }
    }
}

impl From<AssemblyGraphError> for BinningError {
    #[inline]
    fn from(err: AssemblyGraphError) -> Self {
        Self::Graph(err)
    }
}

impl From<std::io::Error> for BinningError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::Graph(AssemblyGraphError::Io(err))
    }
}

impl error::Error for BinningError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

/// Parse an initial binning CSV: `contig,label` per line, no header.
pub fn parse_binning(input: &[u8]) -> Result<Vec<(BString, BString)>, BinningError> {
    let mut records = Vec::new();
    for (ix, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&[u8]> = line.split_str(b",").map(|f| f.trim()).collect();
        match fields.as_slice() {
            [contig, label] if !contig.is_empty() && !label.is_empty() => {
                records.push((BString::from(*contig), BString::from(*label)))
            }
            _ => {
                return Err(BinningError::InvalidLine(
                    ix + 1,
                    line.to_str_lossy().into_owned(),
                ))
            }
        }
    }
    Ok(records)
}

pub fn read_binning<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<(BString, BString)>, BinningError> {
    let input = read_input(path)?;
    parse_binning(input.as_bytes())
}
