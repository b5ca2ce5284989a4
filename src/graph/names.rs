use bstr::{BStr, ByteSlice, ByteVec};

use fnv::FnvHashMap;

/// Bidirectional mapping between contig names and the dense vertex
/// indices used everywhere inside the engine.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct NameMap {
    pub(crate) name_map: FnvHashMap<Vec<u8>, usize>,
    pub(crate) inverse_map: Vec<Vec<u8>>,
}

impl NameMap {
    pub fn new() -> Self {
        Default::default()
    }

    /// Insert a new name, returning its index, or `None` if the name
    /// was already present.
    pub fn insert<N: AsRef<[u8]>>(&mut self, name: N) -> Option<usize> {
        let name = name.as_ref();
        if self.name_map.contains_key(name) {
            return None;
        }
        let ix = self.inverse_map.len();
        self.name_map.insert(Vec::from_slice(name), ix);
        self.inverse_map.push(Vec::from_slice(name));
        Some(ix)
    }

    pub fn map_name<N: AsRef<[u8]>>(&self, name: N) -> Option<usize> {
        self.name_map.get(name.as_ref()).copied()
    }

    pub fn inverse_map_name(&self, id: usize) -> Option<&'_ BStr> {
        self.inverse_map.get(id).map(|bs| bs.as_bstr())
    }

    pub fn len(&self) -> usize {
        self.inverse_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverse_map.is_empty()
    }
}
