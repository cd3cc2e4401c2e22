//! CLI command implementations for Botwar.

pub(crate) mod check;
pub(crate) mod run;
pub(crate) mod series;

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use botwar::runner::{RobotSpec, RunnerError};
use botwar::BattleConfig;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// A battle scenario loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Scenario {
    /// Battle configuration; omitted fields fall back to defaults.
    #[serde(default)]
    pub(crate) config: BattleConfig,
    /// Roster of robots (2-8).
    pub(crate) robots: Vec<RobotSpec>,
}

/// Load a scenario file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub(crate) fn load_scenario(path: &Path) -> Result<Scenario, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::new(format!("failed to parse {}: {e}", path.display())))
}

/// Pick a seed from the clock when none was given.
pub(crate) fn seed_or_random(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(42, |d| d.as_secs() ^ u64::from(d.subsec_nanos()))
    })
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<RunnerError> for CliError {
    fn from(e: RunnerError) -> Self {
        Self::new(e.to_string())
    }
}
