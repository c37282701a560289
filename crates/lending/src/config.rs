//! Lending configuration loaded from environment variables.

use serde::{Deserialize, Serialize};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,

    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Lending policy and telemetry settings.
///
/// Reads from environment variables:
/// - `GEAR_MAX_ACTIVE_CHECKOUTS`: open checkouts a member may hold (default: `5`)
/// - `GEAR_BLOCK_ON_OVERDUE`: refuse new checkouts to overdue members (default: `true`)
/// - `GEAR_CONFLICT_RETRIES`: reload attempts after a version conflict (default: `3`)
/// - `GEAR_LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_active_checkouts: usize,
    pub block_on_overdue: bool,
    pub conflict_retries: u32,
    pub log_format: LogFormat,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_active_checkouts: lookup("GEAR_MAX_ACTIVE_CHECKOUTS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_active_checkouts),
            block_on_overdue: lookup("GEAR_BLOCK_ON_OVERDUE")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.block_on_overdue),
            conflict_retries: lookup("GEAR_CONFLICT_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.conflict_retries),
            log_format: lookup("GEAR_LOG_FORMAT")
                .and_then(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_active_checkouts: 5,
            block_on_overdue: true,
            conflict_retries: 3,
            log_format: LogFormat::Pretty,
            log_level: "info".to_string(),
        }
    }
}
