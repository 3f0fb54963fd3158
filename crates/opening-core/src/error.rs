//! Opening tree error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No game found in PGN input")]
    NoGame,

    #[error("Tree must start from the standard position, got FEN {0}")]
    NonStandardStart(String),

    #[error("Illegal move {san} at ply {ply}")]
    IllegalMove { san: String, ply: usize },

    #[error("Node {0} does not exist")]
    InvalidNode(usize),
}

pub type Result<T> = std::result::Result<T, TreeError>;
