//! Configuration loading with default substitution.
//!
//! Settings arrive as raw text from the command line or a JSON file. The
//! benchmark kind is mandatory; every numeric setting that is missing,
//! unparseable or out of range falls back to its documented default and
//! produces a [`ConfigWarning`].

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Deserializer};

use super::benchmark_types::{
    BenchmarkConfig, DEFAULT_REPETITIONS, DEFAULT_SEED, DEFAULT_SIZE_BYTES, DEFAULT_TOLERANCE,
};
use crate::aligned_vector::ELEMENT_SIZE;
use crate::errors::{ConfigError, ConfigResult};
use crate::kernels::OperationKind;

/// Raw, unvalidated settings.
///
/// JSON files may give any field as a string or a number.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(deserialize_with = "string_or_number")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub size_bytes: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub repetitions: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub tolerance: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub seed: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }))
}

/// A setting that was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub field: &'static str,
    pub provided: String,
    pub default: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unable to parse `{}` for {}, using default ({})",
            self.provided, self.field, self.default
        )
    }
}

impl ConfigOverrides {
    /// Layers `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ConfigOverrides) -> Self {
        Self {
            kind: other.kind.or(self.kind),
            size_bytes: other.size_bytes.or(self.size_bytes),
            repetitions: other.repetitions.or(self.repetitions),
            tolerance: other.tolerance.or(self.tolerance),
            seed: other.seed.or(self.seed),
        }
    }

    /// Validates the settings into a [`BenchmarkConfig`].
    ///
    /// Only a missing or unknown kind is an error. Every substituted default is
    /// logged and returned so the caller can surface it.
    pub fn resolve(&self) -> ConfigResult<(BenchmarkConfig, Vec<ConfigWarning>)> {
        let kind = self
            .kind
            .as_deref()
            .ok_or(ConfigError::MissingKind)?
            .parse::<OperationKind>()?;

        let mut warnings = Vec::new();

        let size_bytes = resolve_setting(
            "vector size",
            self.size_bytes.as_deref(),
            DEFAULT_SIZE_BYTES,
            |v: &usize| *v >= ELEMENT_SIZE,
            &mut warnings,
        );
        let repetitions = resolve_setting(
            "number of repetitions",
            self.repetitions.as_deref(),
            DEFAULT_REPETITIONS,
            |v: &usize| *v > 0,
            &mut warnings,
        );
        let tolerance = resolve_setting(
            "error tolerance",
            self.tolerance.as_deref(),
            DEFAULT_TOLERANCE,
            |v: &f64| v.is_finite() && *v > 0.0,
            &mut warnings,
        );
        let seed = resolve_setting(
            "seed",
            self.seed.as_deref(),
            DEFAULT_SEED,
            |_: &u64| true,
            &mut warnings,
        );

        let config = BenchmarkConfig {
            kind,
            size_bytes,
            repetitions,
            tolerance,
            seed,
        };
        Ok((config, warnings))
    }
}

fn resolve_setting<T>(
    field: &'static str,
    raw: Option<&str>,
    default: T,
    accept: impl Fn(&T) -> bool,
    warnings: &mut Vec<ConfigWarning>,
) -> T
where
    T: FromStr + fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(value) if accept(&value) => value,
        _ => {
            let warning = ConfigWarning {
                field,
                provided: raw.to_string(),
                default: default.to_string(),
            };
            warn!("{}", warning);
            warnings.push(warning);
            default
        }
    }
}

/// Configuration loader that handles JSON files with fallbacks.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads overrides from a JSON file.
    ///
    /// A missing file yields empty overrides so defaults apply; a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<ConfigOverrides> {
        let path = path.as_ref();
        let display = path.display().to_string();

        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: display,
                source: e,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Config file '{}' not found, using default configuration",
                    display
                );
                Ok(ConfigOverrides::default())
            }
            Err(e) => Err(ConfigError::Io {
                path: display,
                source: e,
            }),
        }
    }

    /// Loads `path` (if given), applies `cli` on top and resolves the result.
    pub fn load(
        path: Option<&Path>,
        cli: ConfigOverrides,
    ) -> ConfigResult<(BenchmarkConfig, Vec<ConfigWarning>)> {
        let file = match path {
            Some(path) => Self::load_file(path)?,
            None => ConfigOverrides::default(),
        };
        file.merge(cli).resolve()
    }
}
