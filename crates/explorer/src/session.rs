//! Interactive session state: which node is shown and how.

use std::str::FromStr;

use opening_core::navigation::{rank_children, Cursor, RankingMode};
use opening_core::{NodeId, OpeningTree};

use crate::error::ExplorerError;

/// How many continuations are highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrowMode {
    #[default]
    All,
    None,
    One,
    Three,
}

impl ArrowMode {
    /// All → None → One → Three → All.
    pub fn next(self) -> Self {
        match self {
            ArrowMode::All => ArrowMode::None,
            ArrowMode::None => ArrowMode::One,
            ArrowMode::One => ArrowMode::Three,
            ArrowMode::Three => ArrowMode::All,
        }
    }

    /// Maximum number of continuations shown; `None` means no limit.
    pub fn limit(self) -> Option<usize> {
        match self {
            ArrowMode::All => None,
            ArrowMode::None => Some(0),
            ArrowMode::One => Some(1),
            ArrowMode::Three => Some(3),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArrowMode::All => "all",
            ArrowMode::None => "none",
            ArrowMode::One => "1",
            ArrowMode::Three => "3",
        }
    }
}

/// Side shown at the bottom of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    White,
    Black,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::White => Orientation::Black,
            Orientation::Black => Orientation::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Prev,
    Next,
    Mode,
    Arrows,
    Flip,
    /// 1-based index into the ranked continuations.
    Pick(usize),
    Quit,
}

impl FromStr for Command {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        let command = match input.as_str() {
            "start" | "s" => Command::Start,
            "prev" | "p" => Command::Prev,
            "next" | "n" => Command::Next,
            "mode" | "m" => Command::Mode,
            "arrows" | "a" => Command::Arrows,
            "flip" | "f" => Command::Flip,
            "quit" | "q" | "exit" => Command::Quit,
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => Command::Pick(n),
                _ => return Err(ExplorerError::InvalidCommand(s.trim().to_string())),
            },
        };
        Ok(command)
    }
}

/// Result of applying a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    tree: OpeningTree,
    cursor: Cursor,
    ranking: RankingMode,
    arrows: ArrowMode,
    orientation: Orientation,
}

impl Session {
    pub fn new(tree: OpeningTree) -> Self {
        let cursor = Cursor::new(&tree);
        Self {
            tree,
            cursor,
            ranking: RankingMode::default(),
            arrows: ArrowMode::default(),
            orientation: Orientation::default(),
        }
    }

    pub fn tree(&self) -> &OpeningTree {
        &self.tree
    }

    pub fn current(&self) -> NodeId {
        self.cursor.current()
    }

    pub fn ranking(&self) -> RankingMode {
        self.ranking
    }

    pub fn arrows(&self) -> ArrowMode {
        self.arrows
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Continuations of the current node, best first.
    pub fn ranked(&self) -> Vec<NodeId> {
        rank_children(&self.tree, self.cursor.current(), self.ranking)
    }

    /// Ranked continuations cut to the arrow mode.
    pub fn highlighted(&self) -> Vec<NodeId> {
        let mut ranked = self.ranked();
        if let Some(limit) = self.arrows.limit() {
            ranked.truncate(limit);
        }
        ranked
    }

    /// Navigation at the edges of the tree leaves the cursor in place.
    pub fn apply(&mut self, command: Command) -> Result<Flow, ExplorerError> {
        match command {
            Command::Start => self.cursor.to_root(&self.tree),
            Command::Prev => {
                self.cursor.to_parent(&self.tree);
            }
            Command::Next => {
                self.cursor.to_best_child(&self.tree, self.ranking);
            }
            Command::Mode => self.ranking = self.ranking.toggle(),
            Command::Arrows => self.arrows = self.arrows.next(),
            Command::Flip => self.orientation = self.orientation.flip(),
            Command::Pick(n) => {
                let ranked = self.ranked();
                let Some(&node) = n.checked_sub(1).and_then(|i| ranked.get(i)) else {
                    return Err(ExplorerError::InvalidCommand(format!(
                        "no continuation {n}, {} available",
                        ranked.len()
                    )));
                };
                self.cursor.jump(node);
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}
