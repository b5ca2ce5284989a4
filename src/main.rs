use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use graphbin2::assembly::{self, AssemblerKind};
use graphbin2::bins::{read_binning, BinStore};
use graphbin2::config::{Config, ConfigurationError};
use graphbin2::engine::Refiner;
use graphbin2::fasta::ContigCatalog;
use graphbin2::report::{Reporter, RunSummary};

#[derive(Parser)]
#[command(name = "graphbin2")]
#[command(
    about = "Refine and extend a contig binning using the assembly graph.",
    long_about = None
)]
struct Args {
    /// Assembler that produced the graph: SPAdes or SGA.
    #[arg(long, value_name = "NAME")]
    assembler: String,

    /// Assembly graph (GFA for SPAdes, ASQG for SGA).
    #[arg(long, value_name = "FILE")]
    graph: PathBuf,

    /// Contigs FASTA.
    #[arg(long, value_name = "FILE")]
    contigs: PathBuf,

    /// contigs.paths file (SPAdes).
    #[arg(long, value_name = "FILE")]
    paths: Option<PathBuf>,

    /// Contig abundance file (SGA).
    #[arg(long, value_name = "FILE")]
    abundance: Option<PathBuf>,

    /// Initial binning as `contig,bin` lines.
    #[arg(long, value_name = "FILE")]
    binned: PathBuf,

    /// Output directory, created if missing.
    #[arg(long, value_name = "DIR")]
    output: PathBuf,

    /// Prefix for the output file names.
    #[arg(long, value_name = "PREFIX", default_value = "")]
    prefix: String,

    /// Maximum number of hops to search from each contig.
    #[arg(long, value_name = "N", default_value_t = 5)]
    depth: usize,

    /// Allowed deviation from the neighbourhood mean coverage, in
    /// standard deviations.
    #[arg(long, value_name = "F", default_value_t = 1.5)]
    threshold: f64,

    #[arg(long, value_name = "N", default_value_t = 8)]
    nthreads: usize,

    /// Cap on refinement passes per round.
    #[arg(long, value_name = "N", default_value_t = 100)]
    max_passes: usize,

    /// Cap on refinement + propagation rounds.
    #[arg(long, value_name = "N", default_value_t = 10)]
    max_iterations: usize,

    /// Print more progress information; repeat for debug output.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn ensure_file(path: &Path) -> Result<(), ConfigurationError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigurationError::UnreadableInput(path.display().to_string()))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let kind: AssemblerKind = args.assembler.parse()?;
    let config = Config {
        depth: args.depth,
        threshold: args.threshold,
        nthreads: args.nthreads,
        max_passes: args.max_passes,
        max_iterations: args.max_iterations,
    }
    .validated()?;

    let aux = match kind {
        AssemblerKind::Spades => args
            .paths
            .clone()
            .ok_or(ConfigurationError::MissingInput("paths"))?,
        AssemblerKind::Sga => args
            .abundance
            .clone()
            .ok_or(ConfigurationError::MissingInput("abundance"))?,
    };
    for path in [&args.graph, &args.contigs, &aux, &args.binned].iter() {
        ensure_file(path)?;
    }

    fs::create_dir_all(&args.output).with_context(|| {
        format!("Failed to create output directory {}", args.output.display())
    })?;
    let reporter = Reporter::new(&args.output, &args.prefix);

    let start = Instant::now();

    let contigs = ContigCatalog::from_path(&args.contigs).with_context(|| {
        format!("Failed to read contigs from {}", args.contigs.display())
    })?;
    info!("Read {} contigs", contigs.len());

    let graph = assembly::load(&args.graph, &contigs, kind, &aux)
        .with_context(|| {
            format!("Failed to load {} graph {}", kind, args.graph.display())
        })?;

    let records = read_binning(&args.binned).with_context(|| {
        format!("Failed to read binning from {}", args.binned.display())
    })?;
    let store = BinStore::initial(&records, &graph)
        .with_context(|| format!("Invalid binning in {}", args.binned.display()))?;

    let refiner = Refiner::new(&graph, config.clone())?;
    let report = refiner.run(store);

    let bins = reporter
        .write_all(&graph, &report, &contigs)
        .with_context(|| {
            format!("Failed to write results to {}", args.output.display())
        })?;

    let summary = RunSummary::new(kind, &config, &graph, &report);
    debug!("{:?}", summary);

    #[cfg(feature = "serde1")]
    {
        let path = reporter.path("graphbin2_summary.json");
        summary
            .save_json(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    info!(
        "{} contigs binned into {} bins, {} shared, {} unbinned",
        summary.binned,
        bins.len(),
        summary.shared,
        summary.unbinned
    );
    info!("Finished in {:.2?}", start.elapsed());
    Ok(())
}
