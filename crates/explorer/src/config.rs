//! Build configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use opening_core::builder::BuildOptions;

use crate::error::ExplorerError;

pub const DEFAULT_EXPLORER_URL: &str = "https://explorer.lichess.ovh/masters";

#[derive(Clone, Debug)]
pub struct BuildConfig {
    /// Opening explorer endpoint queried with `?fen=`
    pub explorer_url: String,

    /// Bearer token sent to the explorer, if any
    pub lichess_token: Option<String>,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Search time per position in milliseconds
    pub engine_time_ms: u64,

    /// Candidate moves played fewer times are not expanded
    pub min_occurrences: u64,

    /// Wait before retrying a rate-limited request
    pub rate_limit_backoff_secs: u64,

    /// Timeout for a single explorer request
    pub http_timeout_secs: u64,
}

impl BuildConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset. Values that are set but malformed are
    /// rejected.
    pub fn from_env() -> Result<Self, ExplorerError> {
        Ok(Self {
            explorer_url: env::var("EXPLORER_URL")
                .unwrap_or_else(|_| DEFAULT_EXPLORER_URL.to_string()),
            lichess_token: env::var("LICHESS_TOKEN").ok().filter(|t| !t.is_empty()),
            stockfish_path: env::var("STOCKFISH_PATH")
                .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string()),
            engine_time_ms: parse_var("ENGINE_TIME_MS", 100)?,
            min_occurrences: parse_var("MIN_OCCURRENCES", 10_000)?,
            rate_limit_backoff_secs: parse_var("RATE_LIMIT_BACKOFF_SECS", 60)?,
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            min_occurrences: self.min_occurrences,
            engine_time: Duration::from_millis(self.engine_time_ms),
            rate_limit_backoff: Duration::from_secs(self.rate_limit_backoff_secs),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ExplorerError> {
    match env::var(name) {
        Ok(value) => parse_value(name, &value),
        Err(_) => Ok(default),
    }
}

/// Value following the command-line flag at `args[i]`.
pub fn flag_value<'a>(args: &'a [String], i: usize) -> Result<&'a str, ExplorerError> {
    args.get(i + 1)
        .map(String::as_str)
        .filter(|value| !value.starts_with("--"))
        .ok_or_else(|| ExplorerError::Config(format!("{} requires a value", args[i])))
}

pub fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, ExplorerError> {
    value
        .trim()
        .parse()
        .map_err(|_| ExplorerError::Config(format!("{name} must be a number, got {value:?}")))
}
