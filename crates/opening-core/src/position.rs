//! Position keys used to detect transpositions.

use std::fmt;

use shakmaty::{fen::Fen, Chess, EnPassantMode};

/// Canonical identity of a board position.
///
/// Built from the FEN with the move counters stripped, so two move orders that
/// reach the same placement, side to move, castling rights and en-passant
/// square map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn from_position(pos: &Chess) -> Self {
        Self(normalize_fen(&fen(pos)))
    }

    pub fn from_fen(fen: &str) -> Self {
        Self(normalize_fen(fen))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full FEN of a position (en-passant square only when a capture is legal).
pub fn fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
