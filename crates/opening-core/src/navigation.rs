//! Cursor over an opening tree and ranking of continuations.

use std::cmp::Ordering;

use shakmaty::{Color, Position};

use crate::opening_tree::{NodeId, OpeningTree};

/// How continuations are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingMode {
    /// Most played first.
    #[default]
    Frequency,
    /// Best for the side to move first; unevaluated moves last.
    Engine,
}

impl RankingMode {
    pub fn toggle(self) -> Self {
        match self {
            RankingMode::Frequency => RankingMode::Engine,
            RankingMode::Engine => RankingMode::Frequency,
        }
    }
}

/// Children of `node`, best first. Ties keep their stored order.
pub fn rank_children(tree: &OpeningTree, node: NodeId, mode: RankingMode) -> Vec<NodeId> {
    let mut children = tree.variations(node).to_vec();
    match mode {
        RankingMode::Frequency => {
            children.sort_by(|&a, &b| {
                tree.metadata(b)
                    .frequency
                    .total_cmp(&tree.metadata(a).frequency)
            });
        }
        RankingMode::Engine => {
            let sign = match tree.position(node).turn() {
                Color::White => 1.0,
                Color::Black => -1.0,
            };
            let score = |id: NodeId| tree.metadata(id).eval.map(|e| e * sign);
            children.sort_by(|&a, &b| match (score(a), score(b)) {
                (Some(a), Some(b)) => b.total_cmp(&a),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }
    }
    children
}

/// The focused node of an interactive session. Moving it never touches the
/// tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    current: NodeId,
}

impl Cursor {
    pub fn new(tree: &OpeningTree) -> Self {
        Self {
            current: tree.root(),
        }
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn to_root(&mut self, tree: &OpeningTree) {
        self.current = tree.root();
    }

    /// Returns false at the root.
    pub fn to_parent(&mut self, tree: &OpeningTree) -> bool {
        match tree.parent(self.current) {
            Some(parent) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }

    /// Returns false at a leaf.
    pub fn to_best_child(&mut self, tree: &OpeningTree, mode: RankingMode) -> bool {
        match rank_children(tree, self.current, mode).first() {
            Some(&best) => {
                self.current = best;
                true
            }
            None => false,
        }
    }

    pub fn jump(&mut self, node: NodeId) {
        self.current = node;
    }
}
