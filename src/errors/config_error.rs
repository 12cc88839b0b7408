//! Error types for configuration loading.

use thiserror::Error;

/// Errors that stop a configuration from being resolved at all.
///
/// Malformed numeric settings are not errors: they fall back to defaults and
/// surface as [`ConfigWarning`](crate::benchmarks::ConfigWarning)s instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Benchmark kind needs to be set. Run with --list for available benchmarks")]
    MissingKind,

    #[error("Unknown benchmark kind '{kind}'. Run with --list for available benchmarks")]
    UnknownKind { kind: String },
}
