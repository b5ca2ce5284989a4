use std::{error, fmt};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Run-wide parameters. Validated once at the boundary and then
/// passed by reference to every component; nothing reads them from
/// ambient state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct Config {
    /// Maximum number of hops explored from a vertex.
    pub depth: usize,
    /// Multiple of the neighbourhood standard deviation a vertex's
    /// coverage may deviate from the neighbourhood mean.
    pub threshold: f64,
    /// Size of the worker pool.
    pub nthreads: usize,
    /// Cap on refinement passes per refinement phase.
    pub max_passes: usize,
    /// Cap on refinement + propagation rounds.
    pub max_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            depth: 5,
            threshold: 1.5,
            nthreads: 8,
            max_passes: 100,
            max_iterations: 10,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        use ConfigurationError as CE;
        if self.depth < 1 {
            return Err(CE::InvalidDepth(self.depth));
        }
        if !self.threshold.is_finite() || self.threshold < 1.0 {
            return Err(CE::InvalidThreshold(self.threshold));
        }
        if self.nthreads < 1 {
            return Err(CE::InvalidThreads(self.nthreads));
        }
        if self.max_passes < 1 {
            return Err(CE::InvalidLimit("max_passes"));
        }
        if self.max_iterations < 1 {
            return Err(CE::InvalidLimit("max_iterations"));
        }
        Ok(())
    }

    /// Validate and return the config, for builder-style construction.
    pub fn validated(self) -> Result<Self, ConfigurationError> {
        self.validate()?;
        Ok(self)
    }
}

/// Invalid run parameters or inputs, caught before any graph or bin
/// is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Search depth must be at least 1.
    InvalidDepth(usize),
    /// Threshold must be a finite number >= 1.0.
    InvalidThreshold(f64),
    /// Thread count must be at least 1.
    InvalidThreads(usize),
    /// An iteration cap was zero. Includes the parameter name.
    InvalidLimit(&'static str),
    UnknownAssembler(String),
    /// An input required by the chosen assembler wasn't given.
    /// Includes the option name.
    MissingInput(&'static str),
    /// An input file doesn't exist or isn't a regular file.
    UnreadableInput(String),
    /// The worker pool couldn't be started.
    ThreadPool(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConfigurationError as CE;
        match self {
            CE::InvalidDepth(d) => {
                write!(f, "Depth must be a positive integer, got {}", d)
            }
            CE::InvalidThreshold(t) => {
                write!(f, "Threshold must be a number >= 1.0, got {}", t)
            }
            CE::InvalidThreads(n) => {
                write!(f, "Number of threads must be positive, got {}", n)
            }
            CE::InvalidLimit(name) => write!(f, "`{}` must be positive", name),
            CE::UnknownAssembler(name) => write!(
                f,
                "Unknown assembler `{}` (expected SPAdes or SGA)",
                name
            ),
            CE::MissingInput(opt) => {
                write!(f, "The chosen assembler requires `--{}`", opt)
            }
            CE::UnreadableInput(path) => {
                write!(f, "Failed to open input file {}", path)
            }
            CE::ThreadPool(reason) => {
                write!(f, "Failed to start worker threads: {}", reason)
            }
        }
    }
}

impl error::Error for ConfigurationError {}
