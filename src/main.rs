use log::{debug, info};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use bog_rs::overlap_source::open_reader;
use bog_rs::{BestOverlapGraph, GraphConfig, GraphSummary, InMemoryOverlapSource, OverlapSource};

/// Build a best overlap graph from precomputed read overlaps
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read length table: one "read_id length" pair per line (.gz accepted)
    lengths: String,

    /// Overlap table: "a b a_hang b_hang flip erate" per line (.gz accepted)
    overlaps: String,

    /// Write <prefix>.initial/.final edge reports
    #[arg(long)]
    prefix: Option<String>,

    /// Maximum error rate of an overlap used as a best edge
    #[arg(long, default_value_t = 0.05)]
    erate_graph: f64,

    /// Standard deviations above the mean best-edge error rate kept by the high error filter
    #[arg(long, default_value_t = 3.0)]
    deviation_graph: f64,

    /// Disable the suspicious (chimeric) read filter
    #[arg(long)]
    no_suspicious: bool,

    /// Disable the high error edge filter
    #[arg(long)]
    no_high_error: bool,

    /// Disable the lopsided edge filter
    #[arg(long)]
    no_lopsided: bool,

    /// Disable the spur filter
    #[arg(long)]
    no_spur: bool,

    /// Edges shorter than this fraction of the partner's preferred edge are lopsided
    #[arg(long, default_value_t = 0.75)]
    lopsided_ratio: f64,

    /// Bases two overlap spans must share to count as continuous coverage
    #[arg(long, default_value_t = 40)]
    suspicious_min_overlap: u32,

    /// The overlap table already lists every overlap from both reads
    #[arg(long)]
    symmetric: bool,

    /// File of read ids (one per line); only overlaps touching them are scored
    #[arg(long)]
    restrict: Option<String>,

    /// Enable threaded scoring (default: off)
    #[arg(long, default_value_t = false)]
    threads: bool,

    /// Number of worker threads for scoring (default: max available - 1)
    #[arg(long, default_value_t = num_cpus::get().saturating_sub(1).max(1))]
    max_workers: usize,

    /// Optional JSON file for the configuration, statistics and filter counts
    #[arg(long)]
    summary_json: Option<String>,

    /// Verbose/info output (default: quiet)
    #[arg(long, short = 'v', alias = "info")]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,

    /// Trace output
    #[arg(long)]
    trace: bool,
}

fn main() {
    let args = Args::parse();
    let log_level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "error"
    };
    env_logger::Builder::new().parse_filters(log_level).init();

    info!("lengths: {}", args.lengths);
    info!("overlaps: {}", args.overlaps);

    let config = match graph_config(&args) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Invalid arguments: {error:?}");
            std::process::exit(1);
        }
    };

    if let Err(error) = run_pipeline(
        &args.lengths,
        &args.overlaps,
        args.symmetric,
        config,
        args.summary_json.as_deref(),
    ) {
        eprintln!("Graph construction failed: {error:?}");
        std::process::exit(1);
    }
}

fn graph_config(args: &Args) -> Result<GraphConfig> {
    let restrict = match &args.restrict {
        Some(path) => Some(read_restriction(Path::new(path))?),
        None => None,
    };

    Ok(GraphConfig {
        erate_graph: args.erate_graph,
        deviation_graph: args.deviation_graph,
        filter_suspicious: !args.no_suspicious,
        filter_high_error: !args.no_high_error,
        filter_lopsided: !args.no_lopsided,
        filter_spur: !args.no_spur,
        lopsided_ratio: args.lopsided_ratio,
        suspicious_min_overlap: args.suspicious_min_overlap,
        restrict,
        use_threads: args.threads,
        max_workers: args.max_workers,
        prefix: args.prefix.as_ref().map(PathBuf::from),
    })
}

fn read_restriction(path: &Path) -> Result<BTreeSet<u32>> {
    let reader =
        open_reader(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reads = BTreeSet::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match trimmed.parse::<u32>() {
            Ok(read_id) => {
                reads.insert(read_id);
            }
            Err(_) => bail!(
                "{}:{}: invalid read id '{}'",
                path.display(),
                idx + 1,
                trimmed
            ),
        }
    }
    Ok(reads)
}

fn run_pipeline(
    lengths_path: &str,
    overlaps_path: &str,
    symmetric: bool,
    config: GraphConfig,
    summary_json: Option<&str>,
) -> Result<GraphSummary> {
    info!("Loading overlaps...");
    let source = InMemoryOverlapSource::open(lengths_path, overlaps_path, !symmetric)
        .with_context(|| format!("Failed to load {} and {}", lengths_path, overlaps_path))?;
    info!(
        "Loaded {} overlaps for {} reads.",
        source.num_overlaps(),
        source.num_reads()
    );

    info!("Creating best overlap graph...");
    let graph = BestOverlapGraph::build(&source, config)?;
    info!("Best overlap graph created.");

    let summary = graph.summary();
    debug!("{:?}", summary.census);

    if let Some(json_path) = summary_json {
        if let Some(parent) = Path::new(json_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(json_path)?;
        writeln!(file, "{}", serde_json::to_string_pretty(&summary)?)?;
        info!("Summary written to {}", json_path);
    }

    Ok(summary)
}
