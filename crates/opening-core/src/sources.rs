//! External collaborators consulted while growing the tree.

use std::time::Duration;

use serde::Deserialize;
use shakmaty::Chess;
use thiserror::Error;

use crate::codec::Evaluation;

/// Opening classification as reported by the explorer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExplorerOpening {
    pub eco: String,
    pub name: String,
}

/// Outcome counts for one candidate move.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CandidateMove {
    pub uci: String,
    #[serde(default)]
    pub san: Option<String>,
    pub white: u64,
    pub draws: u64,
    pub black: u64,
}

impl CandidateMove {
    pub fn occurrences(&self) -> u64 {
        self.white + self.draws + self.black
    }
}

/// Aggregate statistics for a position, moves ranked by the source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PositionStats {
    #[serde(default)]
    pub opening: Option<ExplorerOpening>,
    #[serde(default)]
    pub white: u64,
    #[serde(default)]
    pub draws: u64,
    #[serde(default)]
    pub black: u64,
    #[serde(default)]
    pub moves: Vec<CandidateMove>,
}

impl PositionStats {
    pub fn total(&self) -> u64 {
        self.white + self.draws + self.black
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    /// Transient: the caller should back off and retry the same request.
    #[error("Rate limited by statistics source")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request error: {0}")]
    Transport(String),

    #[error("Response decode error: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
#[error("Evaluation error: {0}")]
pub struct EvalError(pub String);

/// Supplies move frequencies for a position.
pub trait StatsSource {
    /// `fen` is the full FEN of the position.
    fn position_stats(&mut self, fen: &str) -> Result<PositionStats, FetchError>;
}

/// Supplies an engine evaluation for a position.
pub trait EvalSource {
    /// Search `pos` for roughly `budget`; the score is from White's side.
    fn evaluate(&mut self, pos: &Chess, budget: Duration) -> Result<Evaluation, EvalError>;
}
