pub mod lichess;

pub use lichess::LichessExplorer;
