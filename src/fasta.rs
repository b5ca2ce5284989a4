use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use bstr::{io::BufReadExt, BString, ByteSlice};

use crate::graph::{AssemblyGraphError, GraphResult, NameMap};

/// One contig record from the assembler's contigs FASTA.
#[derive(Debug, Clone, PartialEq)]
pub struct ContigRecord {
    /// Identifier: the header text after `>` up to the first
    /// whitespace.
    pub name: BString,
    pub sequence: BString,
}

impl ContigRecord {
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// All contigs of an assembly in file order, addressable by name.
#[derive(Debug, Clone, Default)]
pub struct ContigCatalog {
    records: Vec<ContigRecord>,
    names: NameMap,
}

impl ContigCatalog {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, record: ContigRecord) -> GraphResult<()> {
        if self.names.insert(&record.name).is_none() {
            return Err(AssemblyGraphError::DuplicateContig(
                record.name.to_string(),
            ));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> GraphResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse FASTA from any buffered reader. Sequence lines are
    /// concatenated; blank lines are skipped.
    pub fn from_reader<R: std::io::BufRead>(reader: R) -> GraphResult<Self> {
        let mut catalog = ContigCatalog::new();
        let mut current: Option<ContigRecord> = None;

        for (ix, line) in reader.byte_lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix(b">") {
                if let Some(record) = current.take() {
                    catalog.push(record)?;
                }
                let name = header
                    .fields()
                    .next()
                    .ok_or_else(|| {
                        AssemblyGraphError::malformed(ix + 1, "empty FASTA header")
                    })?;
                current = Some(ContigRecord {
                    name: BString::from(name),
                    sequence: BString::from(""),
                });
            } else {
                match current.as_mut() {
                    Some(record) => record.sequence.extend_from_slice(line),
                    None => {
                        return Err(AssemblyGraphError::malformed(
                            ix + 1,
                            "sequence data before the first FASTA header",
                        ))
                    }
                }
            }
        }

        if let Some(record) = current.take() {
            catalog.push(record)?;
        }

        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get<N: AsRef<[u8]>>(&self, name: N) -> Option<&ContigRecord> {
        self.names.map_name(name).map(|ix| &self.records[ix])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'_ ContigRecord> {
        self.records.iter()
    }
}

/// Write a record as FASTA, wrapping the sequence at 60 columns.
pub fn write_record<W: Write>(
    record: &ContigRecord,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, ">{}", record.name)?;
    for chunk in record.sequence.chunks(60) {
        out.write_all(chunk)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
