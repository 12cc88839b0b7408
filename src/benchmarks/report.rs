//! Human-readable rendering of configurations and results.

use colored::Colorize;

use super::benchmark_types::{BenchmarkConfig, BenchmarkRecord, LATENCY_UNIT};
use crate::errors::BenchmarkResult;

const ONE_KIB: usize = 1024;
const ONE_MIB: usize = ONE_KIB * 1024;
const ONE_GIB: usize = ONE_MIB * 1024;

/// Formats a byte count with the largest binary unit it exceeds.
pub fn format_bytes(bytes: usize) -> String {
    let (value, unit) = if bytes > ONE_GIB {
        (bytes as f64 / ONE_GIB as f64, "GiB")
    } else if bytes > ONE_MIB {
        (bytes as f64 / ONE_MIB as f64, "MiB")
    } else if bytes > ONE_KIB {
        (bytes as f64 / ONE_KIB as f64, "KiB")
    } else {
        (bytes as f64, "B")
    };
    format!("{:.2} {}", value, unit)
}

/// One-line summary of what is about to run.
pub fn describe_config(config: &BenchmarkConfig) -> String {
    format!(
        "running `{}` benchmark with vectors of size {}, {} repetitions and error tolerance of {:.0e}",
        config.kind(),
        format_bytes(config.size_bytes()),
        config.repetitions(),
        config.tolerance()
    )
}

/// Renders the pass or fail block for a finished run.
pub fn render_record(record: &BenchmarkRecord) -> String {
    let kind = record.kind();
    if record.passed() {
        let speedup = match record.speedup {
            Some(speedup) => format!("{:.3}x", speedup),
            None => "n/a".to_string(),
        };
        format!(
            "{}\n  Baseline latency:  {:.3}{unit}\n  Candidate latency: {:.3}{unit}\nCandidate speedup: {}",
            format!("`{}` benchmark passed!", kind).green().bold(),
            record.timing.baseline_latency,
            record.timing.candidate_latency,
            speedup,
            unit = LATENCY_UNIT,
        )
    } else {
        format!(
            "{}\n  Error tolerance: {:.0e}\n  Error computed:  {:.0e}",
            format!("`{}` benchmark failed.", kind).red().bold(),
            record.error.tolerance,
            record.error.computed_error,
        )
    }
}

pub fn print_record(record: &BenchmarkRecord) {
    println!("{}", render_record(record));
}

/// Pretty-printed JSON form of a finished run.
pub fn render_json(record: &BenchmarkRecord) -> BenchmarkResult<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::{ErrorOutcome, TimingResult};
    use crate::kernels::OperationKind;

    fn record(passed_error: f64) -> BenchmarkRecord {
        let config = BenchmarkConfig::new(OperationKind::DotProd);
        BenchmarkRecord::new(
            config,
            "baseline",
            "candidate",
            2048,
            TimingResult::new(2.0, 1.0),
            ErrorOutcome::classify(passed_error, 1e-9),
        )
    }

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(64), "64.00 B");
        assert_eq!(format_bytes(1024), "1024.00 B");
        assert_eq!(format_bytes(16 * 1024 + 512), "16.50 KiB");
        assert_eq!(format_bytes(3 * ONE_MIB), "3.00 MiB");
        assert_eq!(format_bytes(2 * ONE_GIB), "2.00 GiB");
    }

    #[test]
    fn test_describe_config() {
        let line = describe_config(&BenchmarkConfig::new(OperationKind::Copy));
        assert!(line.contains("`copy`"));
        assert!(line.contains("16.00 KiB"));
        assert!(line.contains("1000 repetitions"));
        assert!(line.contains("1e-9"));
    }

    #[test]
    fn test_render_pass_and_fail() {
        let passed = render_record(&record(0.0));
        assert!(passed.contains("benchmark passed!"));
        assert!(passed.contains("2.000x"));

        let failed = render_record(&record(1e-3));
        assert!(failed.contains("benchmark failed."));
        assert!(failed.contains("1e-3"));
    }

    #[test]
    fn test_render_json_fields() {
        let json = render_json(&record(0.0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["config"]["kind"], "dot_prod");
        assert_eq!(value["elements"], 2048);
        assert_eq!(value["effective_size_bytes"], 16384);
        assert_eq!(value["speedup"], 2.0);
        assert_eq!(value["error"]["passed"], true);
    }
}
