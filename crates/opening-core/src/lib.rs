//! Core of the opening explorer: the move tree, its PGN annotation codec and
//! persistence, the tree builder, and navigation over a built tree.

pub mod builder;
pub mod codec;
pub mod error;
pub mod navigation;
pub mod opening_tree;
pub mod pgn;
pub mod position;
pub mod sources;

pub use error::{Result, TreeError};
pub use opening_tree::{NodeId, OpeningTree};
