//! Arena-backed opening tree.
//!
//! Nodes live in a `Vec` and refer to each other by index: children are owned
//! through the parent's `variations` list, the `parent` link is a plain index
//! back-reference. Nodes are only ever added, so an index stays valid for the
//! lifetime of the tree.

use shakmaty::{san::San, Chess, Move, Position};

use crate::codec::{Annotation, Metadata, Opening};
use crate::error::{Result, TreeError};

/// Index of a node in its [`OpeningTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    /// Move that produced this node from its parent (None for root).
    pub mv: Option<Move>,
    pub parent: Option<NodeId>,
    /// Children in discovery order.
    pub variations: Vec<NodeId>,
    /// Free text plus annotation tags.
    pub comment: String,
}

impl TreeNode {
    fn root() -> Self {
        Self {
            mv: None,
            parent: None,
            variations: Vec::new(),
            comment: String::new(),
        }
    }
}

/// Shape summary of a subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSize {
    pub nodes: usize,
    pub min_breadth: usize,
    pub max_breadth: usize,
    pub avg_breadth: f64,
    pub min_depth: usize,
    pub max_depth: usize,
    pub avg_depth: f64,
}

#[derive(Debug, Clone)]
pub struct OpeningTree {
    nodes: Vec<TreeNode>,
}

impl Default for OpeningTree {
    fn default() -> Self {
        Self::new()
    }
}

impl OpeningTree {
    /// A tree holding only the root (standard starting position).
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::root()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: the root always exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve a raw index, e.g. one typed by a user.
    pub fn node_id(&self, index: usize) -> Result<NodeId> {
        if index < self.nodes.len() {
            Ok(NodeId(index))
        } else {
            Err(TreeError::InvalidNode(index))
        }
    }

    /// # Panics
    /// Panics if the id belongs to a different tree.
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn variations(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).variations
    }

    pub fn comment(&self, id: NodeId) -> &str {
        &self.get(id).comment
    }

    pub fn set_comment(&mut self, id: NodeId, comment: impl Into<String>) {
        self.nodes[id.0].comment = comment.into();
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.get(id).variations.is_empty()
    }

    /// Append a new child reached by `mv`.
    pub fn add_variation(&mut self, parent: NodeId, mv: Move) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            mv: Some(mv),
            parent: Some(parent),
            variations: Vec::new(),
            comment: String::new(),
        });
        self.nodes[parent.0].variations.push(id);
        id
    }

    pub fn child_with_move(&self, parent: NodeId, mv: &Move) -> Option<NodeId> {
        self.get(parent)
            .variations
            .iter()
            .copied()
            .find(|&child| self.get(child).mv.as_ref() == Some(mv))
    }

    /// Existing child for `mv`, or a new one.
    pub fn ensure_variation(&mut self, parent: NodeId, mv: Move) -> NodeId {
        match self.child_with_move(parent, &mv) {
            Some(child) => child,
            None => self.add_variation(parent, mv),
        }
    }

    /// Nodes from the root down to `id`, inclusive.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            path.push(node);
            current = self.get(node).parent;
        }
        path.reverse();
        path
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.path(id).len() - 1
    }

    /// True if `ancestor` is `node` or lies on its path to the root.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.get(n).parent;
        }
        false
    }

    /// Board position reached by replaying the moves from the root.
    pub fn position(&self, id: NodeId) -> Chess {
        let mut pos = Chess::default();
        for step in self.path(id) {
            if let Some(mv) = &self.get(step).mv {
                pos.play_unchecked(mv.clone());
            }
        }
        pos
    }

    /// SAN of the move leading to `id`.
    pub fn san(&self, id: NodeId) -> Option<String> {
        let node = self.get(id);
        let mv = node.mv.clone()?;
        let parent = self.position(node.parent?);
        Some(San::from_move(&parent, mv).to_string())
    }

    pub fn annotation(&self, id: NodeId) -> Annotation {
        Annotation::parse(self.comment(id))
    }

    /// Decoded annotation with the opening inherited from the nearest
    /// classified ancestor when the node has none.
    pub fn metadata(&self, id: NodeId) -> Metadata {
        let mut meta = Metadata::from(&self.annotation(id));
        if meta.eco.is_empty() {
            if let Some(opening) = self.inherited_opening(id) {
                meta.eco = opening.eco;
                meta.opening_name = opening.name;
            }
        }
        meta
    }

    fn inherited_opening(&self, id: NodeId) -> Option<Opening> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if let Some(opening) = self.annotation(node).opening {
                if !opening.eco.is_empty() {
                    return Some(opening);
                }
            }
            current = self.parent(node);
        }
        None
    }

    /// Copy the comment and descendants of `src` onto `dst`, edge by edge.
    /// Returns the number of nodes copied, `dst` included.
    ///
    /// Copying onto a node inside the source subtree would never terminate, so
    /// that case copies nothing and returns 0.
    pub fn copy_subtree(&mut self, src: NodeId, dst: NodeId) -> usize {
        if self.is_ancestor(src, dst) {
            return 0;
        }
        let comment = self.get(src).comment.clone();
        self.nodes[dst.0].comment = comment;

        let edges: Vec<(Move, NodeId)> = self
            .get(src)
            .variations
            .iter()
            .filter_map(|&child| self.get(child).mv.clone().map(|mv| (mv, child)))
            .collect();

        let mut copied = 1;
        for (mv, child) in edges {
            let target = self.ensure_variation(dst, mv);
            copied += self.copy_subtree(child, target);
        }
        copied
    }

    /// Number of nodes in the subtree rooted at `id`, `id` included.
    pub fn subtree_len(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(self.variations(node).iter().copied());
        }
        count
    }

    pub fn size(&self, id: NodeId) -> TreeSize {
        let mut size = TreeSize {
            nodes: 0,
            min_breadth: usize::MAX,
            max_breadth: 0,
            avg_breadth: 0.0,
            min_depth: usize::MAX,
            max_depth: 0,
            avg_depth: 0.0,
        };
        let mut total_breadth = 0;
        let mut total_depth = 0;

        let mut stack = vec![(id, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let breadth = self.variations(node).len();
            size.nodes += 1;
            total_breadth += breadth;
            size.min_breadth = size.min_breadth.min(breadth);
            size.max_breadth = size.max_breadth.max(breadth);
            total_depth += depth;
            size.min_depth = size.min_depth.min(depth);
            size.max_depth = size.max_depth.max(depth);
            stack.extend(self.variations(node).iter().map(|&child| (child, depth + 1)));
        }

        size.avg_breadth = total_breadth as f64 / size.nodes as f64;
        size.avg_depth = total_depth as f64 / size.nodes as f64;
        size
    }
}
