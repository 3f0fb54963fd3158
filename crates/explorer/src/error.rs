//! Explorer error types

use thiserror::Error;

use opening_core::TreeError;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
