//! # CLI Module
//!
//! Command-line interface for ERBench.
//!
//! Every command is a `cmd_*` function that returns its result, so the binary
//! and the integration tests drive the same code.

use crate::api::{self, AppState};
use crate::config::{
    DEFAULT_CONCURRENCY, DEFAULT_PORT, DEFAULT_RATE_LIMIT_PER_MINUTE, RunnerConfig, ServerConfig,
};
use crate::error::{AppError, Result};
use crate::loader::{load_pairs, load_partition, load_universe, read_text, save_partition};
use crate::runner::{Comparison, ModelResult};
use crate::source::{AnySource, DirectorySource, HttpSource};
use clap::{Parser, Subcommand, ValueEnum};
use erbench_core::{
    Evaluator, EvaluatorConfig, MetricsReport, Partition, UnassignedPolicy, Universe,
};
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

// =============================================================================
// ARGUMENTS
// =============================================================================

/// ERBench - score entity-resolution clusterings against a ground truth.
#[derive(Parser, Debug)]
#[command(name = "erbench", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score one candidate partition against the ground truth.
    Evaluate {
        /// Ground-truth partition (JSON array of clusters).
        #[arg(long, env = "ERBENCH_GROUND_TRUTH")]
        ground_truth: PathBuf,

        /// Candidate partition.
        #[arg(long)]
        candidate: PathBuf,

        /// Record universe (JSON array of IDs or CSV with an `id` column).
        #[arg(long, env = "ERBENCH_UNIVERSE")]
        universe: Option<PathBuf>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Reject malformed partitions instead of resolving them.
        #[arg(long)]
        strict: bool,

        /// How unclustered records enter the information scores.
        #[arg(long, value_enum, default_value_t = UnassignedArg::Singletons)]
        unassigned: UnassignedArg,
    },

    /// Score several models' pre-computed clusters; one JSON line per model.
    Compare {
        #[arg(long, env = "ERBENCH_GROUND_TRUTH")]
        ground_truth: PathBuf,

        /// Directory holding `<model>.json` candidate files.
        #[arg(long, env = "ERBENCH_CANDIDATES_DIR")]
        candidates_dir: PathBuf,

        /// Comma-separated model names.
        #[arg(long, value_delimiter = ',', required = true)]
        models: Vec<String>,

        #[arg(long, env = "ERBENCH_UNIVERSE")]
        universe: Option<PathBuf>,

        /// Models processed at the same time.
        #[arg(long, env = "ERBENCH_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// How unclustered records enter the information scores.
        #[arg(long, env = "ERBENCH_UNASSIGNED", value_enum, default_value_t = UnassignedArg::Singletons)]
        unassigned: UnassignedArg,
    },

    /// Serve the comparison API over HTTP.
    Serve {
        #[arg(long, env = "ERBENCH_GROUND_TRUTH")]
        ground_truth: PathBuf,

        /// Read candidates from `<dir>/<model>.json`.
        #[arg(
            long,
            env = "ERBENCH_CANDIDATES_DIR",
            conflicts_with = "endpoint",
            required_unless_present = "endpoint"
        )]
        candidates_dir: Option<PathBuf>,

        /// Ask an external clustering service instead.
        #[arg(long, env = "ERBENCH_ENDPOINT")]
        endpoint: Option<String>,

        #[arg(long, env = "ERBENCH_UNIVERSE")]
        universe: Option<PathBuf>,

        /// Dataset text sent to the clustering service with each request.
        #[arg(long, env = "ERBENCH_RECORDS", requires = "endpoint")]
        records: Option<PathBuf>,

        #[arg(long, env = "ERBENCH_HOST", default_value = "127.0.0.1")]
        host: IpAddr,

        #[arg(long, env = "ERBENCH_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        #[arg(long, env = "ERBENCH_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Bearer key required on `/api/*`.
        #[arg(long, env = "ERBENCH_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Comparison requests per minute (0 disables limiting).
        #[arg(long, env = "ERBENCH_RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT_PER_MINUTE)]
        rate_limit: u32,

        /// Timeout for one clustering-service request, in seconds.
        #[arg(long, env = "ERBENCH_SOURCE_TIMEOUT", default_value_t = 600)]
        timeout_secs: u64,

        /// How unclustered records enter the information scores.
        #[arg(long, env = "ERBENCH_UNASSIGNED", value_enum, default_value_t = UnassignedArg::Singletons)]
        unassigned: UnassignedArg,
    },

    /// Build a ground-truth partition from matched record pairs.
    GroundTruth {
        /// JSON array of `[a, b]` pairs.
        #[arg(long)]
        pairs: PathBuf,

        /// Where to write the partition.
        #[arg(long)]
        output: PathBuf,
    },
}

/// `--unassigned` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnassignedArg {
    /// Each unclustered record is its own cluster.
    Singletons,
    /// All unclustered records share one label.
    Shared,
}

impl From<UnassignedArg> for UnassignedPolicy {
    fn from(arg: UnassignedArg) -> Self {
        match arg {
            UnassignedArg::Singletons => Self::Singletons,
            UnassignedArg::Shared => Self::SharedLabel,
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Evaluate {
            ground_truth,
            candidate,
            universe,
            json,
            strict,
            unassigned,
        } => {
            let report = cmd_evaluate(
                &ground_truth,
                &candidate,
                universe.as_deref(),
                strict,
                unassigned.into(),
            )?;
            if json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|e| AppError::json(&candidate, e))?;
                println!("{}", text);
            } else {
                print!("{}", report.to_text());
            }
            Ok(())
        }
        Commands::Compare {
            ground_truth,
            candidates_dir,
            models,
            universe,
            concurrency,
            unassigned,
        } => {
            let source = AnySource::Directory(DirectorySource::new(candidates_dir));
            let mut stdout = std::io::stdout();
            cmd_compare(
                &ground_truth,
                source,
                models,
                universe.as_deref(),
                concurrency,
                EvaluatorConfig {
                    unassigned: unassigned.into(),
                },
                &mut stdout,
            )
            .await
            .map(|_| ())
        }
        Commands::Serve {
            ground_truth,
            candidates_dir,
            endpoint,
            universe,
            records,
            host,
            port,
            concurrency,
            api_key,
            rate_limit,
            timeout_secs,
            unassigned,
        } => {
            let source = build_source(
                candidates_dir,
                endpoint,
                records.as_deref(),
                Duration::from_secs(timeout_secs),
            )?;
            let config = ServerConfig {
                addr: SocketAddr::new(host, port),
                api_key,
                rate_limit_per_minute: NonZeroU32::new(rate_limit),
                runner: RunnerConfig::with_concurrency(concurrency),
            };
            let evaluator = EvaluatorConfig {
                unassigned: unassigned.into(),
            };
            cmd_serve(&ground_truth, source, universe.as_deref(), evaluator, &config).await
        }
        Commands::GroundTruth { pairs, output } => {
            let partition = cmd_ground_truth(&pairs, &output)?;
            println!(
                "Wrote {} clusters to {}",
                partition.len(),
                output.display()
            );
            Ok(())
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Load both partitions and score them.
///
/// With `strict`, duplicated IDs, empty clusters and IDs outside the universe
/// are errors instead of being resolved.
pub fn cmd_evaluate(
    ground_truth: &Path,
    candidate: &Path,
    universe: Option<&Path>,
    strict: bool,
    unassigned: UnassignedPolicy,
) -> Result<MetricsReport> {
    let truth = load_partition(ground_truth)?;
    let cand = load_partition(candidate)?;
    let universe = universe.map(load_universe).transpose()?;

    if strict {
        truth
            .validate(universe.as_ref())
            .map_err(|source| AppError::InvalidPartition {
                which: "ground-truth",
                source,
            })?;
        cand.validate(universe.as_ref())
            .map_err(|source| AppError::InvalidPartition {
                which: "candidate",
                source,
            })?;
    }

    let evaluator = Evaluator::with_config(EvaluatorConfig { unassigned });
    let report = evaluator.evaluate(&truth, &cand, universe.as_ref());

    let diagnostics = &report.diagnostics;
    if !diagnostics.ground_truth.is_clean() || !diagnostics.candidate.is_clean() {
        warn!(
            ground_truth = ?diagnostics.ground_truth,
            candidate = ?diagnostics.candidate,
            "malformed partitions were resolved"
        );
    }
    Ok(report)
}

/// Score every model from `source`, writing one JSON line per result to
/// `out` as it completes.
pub async fn cmd_compare<W: Write>(
    ground_truth: &Path,
    source: AnySource,
    models: Vec<String>,
    universe: Option<&Path>,
    concurrency: usize,
    evaluator: EvaluatorConfig,
    out: &mut W,
) -> Result<Vec<ModelResult>> {
    if models.is_empty() {
        return Err(AppError::Config("no models selected".to_string()));
    }

    let comparison = build_comparison(ground_truth, source, universe)?
        .with_evaluator(Evaluator::with_config(evaluator))
        .with_config(RunnerConfig::with_concurrency(concurrency));

    let mut rx = comparison.run(models);
    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        let line = result
            .to_json_line()
            .map_err(|e| AppError::json(ground_truth, e))?;
        out.write_all(line.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| AppError::io("<output>", e))?;
        results.push(result);
    }
    Ok(results)
}

/// Start the HTTP server.
pub async fn cmd_serve(
    ground_truth: &Path,
    source: AnySource,
    universe: Option<&Path>,
    evaluator: EvaluatorConfig,
    config: &ServerConfig,
) -> Result<()> {
    let comparison = build_comparison(ground_truth, source, universe)?
        .with_evaluator(Evaluator::with_config(evaluator))
        .with_config(config.runner);
    let state = AppState::from_config(comparison, config);
    api::serve(config, state).await
}

/// Turn matched pairs into a ground-truth partition and save it.
pub fn cmd_ground_truth(pairs: &Path, output: &Path) -> Result<Partition> {
    let pairs = load_pairs(pairs)?;
    let partition = Partition::from_matched_pairs(pairs);
    save_partition(&partition, output)?;
    info!(clusters = partition.len(), output = %output.display(), "ground truth written");
    Ok(partition)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Pick the cluster source from the serve options.
pub fn build_source(
    candidates_dir: Option<PathBuf>,
    endpoint: Option<String>,
    records: Option<&Path>,
    timeout: Duration,
) -> Result<AnySource> {
    match (candidates_dir, endpoint) {
        (Some(dir), None) => {
            if records.is_some() {
                return Err(AppError::Config(
                    "--records only applies to --endpoint".to_string(),
                ));
            }
            Ok(AnySource::Directory(DirectorySource::new(dir)))
        }
        (None, Some(endpoint)) => {
            let mut source = HttpSource::new(endpoint, timeout).map_err(|e| {
                AppError::Config(format!("cannot build HTTP client: {}", e))
            })?;
            if let Some(path) = records {
                source = source.with_records(read_text(path)?);
            }
            Ok(AnySource::Http(source))
        }
        (Some(_), Some(_)) => Err(AppError::Config(
            "use either --candidates-dir or --endpoint, not both".to_string(),
        )),
        (None, None) => Err(AppError::Config(
            "one of --candidates-dir or --endpoint is required".to_string(),
        )),
    }
}

fn build_comparison(
    ground_truth: &Path,
    source: AnySource,
    universe: Option<&Path>,
) -> Result<Comparison<AnySource>> {
    let truth = load_partition(ground_truth)?;
    let universe: Option<Universe> = universe.map(load_universe).transpose()?;
    info!(
        clusters = truth.len(),
        universe = universe.as_ref().map(Universe::len),
        "ground truth loaded"
    );
    Ok(Comparison::new(source, truth, universe))
}

// =============================================================================
// TESTS
// =============================================================================
