//! Main benchmark CLI executable.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use vecop_bench::benchmarks::report;
use vecop_bench::{BenchmarkResult, BenchmarkRunner, ConfigLoader, ConfigOverrides};

/// Compare a straight-loop baseline against hand-optimized vector kernels.
///
/// Numeric options that cannot be parsed fall back to their defaults with a
/// warning.
#[derive(Parser, Debug)]
#[command(name = "vecop-bench", version, about, long_about = None)]
struct Cli {
    /// Benchmark to run: init, copy, reduc, dotprod, gaxpy, vec_sum, vec_scale
    #[arg(short = 'k', long)]
    kind: Option<String>,

    /// Vector size in bytes (default: 16384)
    #[arg(short = 's', long = "size")]
    size: Option<String>,

    /// Number of repetitions (default: 1000)
    #[arg(short = 'r', long)]
    repetitions: Option<String>,

    /// Mean relative error tolerance (default: 1e-9)
    #[arg(short = 'e', long = "error-tolerance")]
    error_tolerance: Option<String>,

    /// Seed for operand generation (default: 0)
    #[arg(long)]
    seed: Option<String>,

    /// JSON file with default settings; command-line options take precedence
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print the result record as JSON instead of the text summary
    #[arg(long)]
    json: bool,

    /// List available benchmarks and exit
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.list {
        BenchmarkRunner::list_benchmarks();
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Benchmark execution failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> BenchmarkResult<bool> {
    let overrides = ConfigOverrides {
        kind: cli.kind,
        size_bytes: cli.size,
        repetitions: cli.repetitions,
        tolerance: cli.error_tolerance,
        seed: cli.seed,
    };
    let (config, _warnings) = ConfigLoader::load(cli.config.as_deref(), overrides)?;

    info!("{}", report::describe_config(&config));
    let record = BenchmarkRunner::run_benchmark(&config)?;

    if cli.json {
        println!("{}", report::render_json(&record)?);
    } else {
        report::print_record(&record);
    }

    Ok(record.passed())
}
