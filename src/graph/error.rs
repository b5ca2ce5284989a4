use std::{error, fmt};

use bstr::ByteSlice;

pub type GraphResult<T> = Result<T, AssemblyGraphError>;

/// Errors raised while building an assembly graph. All of them are
/// fatal; they abort a run before any bin is touched.
#[derive(Debug)]
pub enum AssemblyGraphError {
    /// An edge, coverage, or binning record referenced a contig that
    /// is not a vertex of the graph.
    MissingVertex(String),
    /// A contig was declared more than once.
    DuplicateContig(String),
    /// A contig exists but no coverage value could be found for it.
    MissingCoverage(String),
    /// A topology record couldn't be parsed. Includes the line
    /// number (1-based) and a description of the problem.
    MalformedGraph { line: usize, reason: String },
    /// Wrapper for an IO error.
    Io(std::io::Error),
}

impl fmt::Display for AssemblyGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AssemblyGraphError as AGE;
        match self {
            AGE::MissingVertex(name) => {
                write!(f, "Contig `{}` is not a vertex of the assembly graph", name)
            }
            AGE::DuplicateContig(name) => {
                write!(f, "Contig `{}` was declared more than once", name)
            }
            AGE::MissingCoverage(name) => {
                write!(f, "No coverage value found for contig `{}`", name)
            }
            AGE::MalformedGraph { line, reason } => {
                write!(f, "Malformed graph record at line {}: {}", line, reason)
            }
            AGE::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl From<std::io::Error> for AssemblyGraphError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl error::Error for AssemblyGraphError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl AssemblyGraphError {
    #[inline]
    pub(crate) fn missing_vertex(name: &[u8]) -> Self {
        Self::MissingVertex(name.to_str_lossy().into_owned())
    }

    #[inline]
    pub(crate) fn malformed<S: Into<String>>(line: usize, reason: S) -> Self {
        Self::MalformedGraph {
            line,
            reason: reason.into(),
        }
    }
}
