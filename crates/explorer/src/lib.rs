//! Opening explorer front end: explorer and engine clients, build
//! configuration, and the text-mode session.

pub mod clients;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod stockfish;
