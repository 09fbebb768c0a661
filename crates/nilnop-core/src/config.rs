//! Configuration loading from nilnop.toml.

use nilnop_diagnostics::diagnostic::Severity;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::targets::TargetSpec;

pub const CONFIG_FILE_NAME: &str = "nilnop.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nilnop: NilnopConfig,
    pub targets: Vec<TargetSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NilnopConfig {
    pub severity_threshold: Severity,
    /// 0 = unlimited.
    pub max_diagnostics: usize,
    /// Emit NNP002 for degenerate nil comparisons.
    pub report_conditions: bool,
    /// Worker threads for the per-function pass. 0 = rayon's default.
    pub jobs: usize,
}

impl Default for NilnopConfig {
    fn default() -> Self {
        Self {
            severity_threshold: Severity::Warning,
            max_diagnostics: 0,
            report_conditions: true,
            jobs: 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

const KNOWN_TABLES: &[&str] = &["nilnop", "targets"];
const KNOWN_NILNOP_KEYS: &[&str] = &[
    "severity_threshold",
    "max_diagnostics",
    "report_conditions",
    "jobs",
];

impl Config {
    /// Parse TOML text. Unknown keys are ignored with a warning.
    pub fn from_toml_str(content: &str) -> Result<Config, toml::de::Error> {
        let table: toml::Table = toml::from_str(content)?;
        warn_unknown_keys(&table);
        toml::Value::Table(table).try_into()
    }
}

fn warn_unknown_keys(table: &toml::Table) {
    for key in table.keys() {
        if !KNOWN_TABLES.contains(&key.as_str()) {
            tracing::warn!(key = %key, "unknown config section, ignoring");
        }
    }
    if let Some(toml::Value::Table(nilnop)) = table.get("nilnop") {
        for key in nilnop.keys() {
            if !KNOWN_NILNOP_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %format!("nilnop.{key}"), "unknown config key, ignoring");
            }
        }
    }
}

/// Find and load nilnop.toml, walking up from `start_dir`.
/// Returns the default config if no file is found.
pub fn load_config(start_dir: &Path) -> Result<Config, ConfigError> {
    match find_config_file(start_dir) {
        Some(path) => load_config_file(&path),
        None => Ok(Config::default()),
    }
}

/// Load a specific config file.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = Config::from_toml_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        targets = config.targets.len(),
        "loaded config"
    );
    Ok(config)
}

/// Walk up directories looking for nilnop.toml.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Default TOML content for `nilnop init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"[nilnop]
severity_threshold = "warning"
max_diagnostics = 0      # 0 = unlimited
report_conditions = true # report tautological / impossible nil comparisons
jobs = 0                 # worker threads, 0 = one per core

# Each target names a function (`Func`) or method (`Recv.Method`) whose
# argument at `arg_pos` (0-based, receiver excluded) must never be nil.
#
# [[targets]]
# pkg_path = "example.com/app/errors"
# func_name = "Wrap"
# arg_pos = 0
"#;
