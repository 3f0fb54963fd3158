//! PGN persistence for opening trees.
//!
//! The whole tree is stored as a single game: the main line is each node's
//! first variation, alternatives are parenthesized, and node comments carry
//! the annotation tags.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::ControlFlow;
use std::path::Path;

use pgn_reader::{RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{san::San, Chess, Color, Move, Position};

use crate::error::{Result, TreeError};
use crate::opening_tree::{NodeId, OpeningTree};
use crate::position;

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const SEVEN_TAG_ROSTER: [(&str, &str); 7] = [
    ("Event", "?"),
    ("Site", "?"),
    ("Date", "????.??.??"),
    ("Round", "?"),
    ("White", "?"),
    ("Black", "?"),
    ("Result", "*"),
];

/// Header duplicating the root comment. Some readers drop comments that
/// precede the first move, so the root annotation is also kept here.
const ROOT_COMMENT_TAG: &str = "TreeRoot";

const MAX_LINE: usize = 80;

/// Load a tree from a PGN file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<OpeningTree> {
    let file = File::open(path)?;
    read_tree(BufReader::new(file))
}

/// Save a tree to a PGN file, replacing it.
pub fn save<P: AsRef<Path>>(tree: &OpeningTree, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    write_tree(tree, &mut out)?;
    out.flush()?;
    Ok(())
}

pub fn from_pgn_str(pgn: &str) -> Result<OpeningTree> {
    read_tree(pgn.as_bytes())
}

pub fn to_pgn_string(tree: &OpeningTree) -> String {
    let mut out = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_tree(tree, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}

/// Read the first game of `reader` as a tree.
pub fn read_tree<R: Read>(reader: R) -> Result<OpeningTree> {
    let mut reader = Reader::new(reader);
    match reader.read_game(&mut TreeReader)? {
        Some(result) => result,
        None => Err(TreeError::NoGame),
    }
}

pub fn write_tree<W: Write>(tree: &OpeningTree, mut out: W) -> Result<()> {
    let root = tree.root();
    for (name, value) in SEVEN_TAG_ROSTER {
        writeln!(out, "[{name} \"{value}\"]")?;
    }
    let root_comment = tree.comment(root).trim();
    if !root_comment.is_empty() {
        writeln!(out, "[{ROOT_COMMENT_TAG} \"{}\"]", escape_tag_value(root_comment))?;
    }
    writeln!(out)?;

    let mut movetext = MovetextWriter::default();
    movetext.comment(tree.comment(root));
    movetext.continuation(tree, root, &Chess::default());
    movetext.token("*");
    writeln!(out, "{}", movetext.text)?;
    Ok(())
}

fn escape_tag_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Visitor that rebuilds the tree from movetext.
struct TreeReader;

#[derive(Default)]
struct TreeTags {
    fen: Option<String>,
    root_comment: Option<String>,
}

struct TreeState {
    tree: OpeningTree,
    current: NodeId,
    position: Chess,
    /// Where to resume after each open variation.
    stack: Vec<(NodeId, Chess)>,
    /// Root comment from the header, used if the movetext has none.
    header_root_comment: Option<String>,
    /// A variation was opened and its first move is not read yet.
    at_variation_start: bool,
    /// Comment written before the first move of a variation.
    variation_comment: Option<String>,
}

impl TreeState {
    fn append_comment(&mut self, node: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        let existing = self.tree.comment(node);
        let merged = if existing.is_empty() {
            text.to_string()
        } else {
            format!("{existing} {text}")
        };
        self.tree.set_comment(node, merged);
    }
}

impl Visitor for TreeReader {
    type Tags = TreeTags;
    type Movetext = TreeState;
    type Output = Result<OpeningTree>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(TreeTags::default())
    }

    fn tag(&mut self, tags: &mut Self::Tags, name: &[u8], value: RawTag<'_>) -> ControlFlow<Self::Output> {
        match name {
            b"FEN" => tags.fen = Some(value.decode_utf8_lossy().to_string()),
            n if n == ROOT_COMMENT_TAG.as_bytes() => {
                tags.root_comment = Some(value.decode_utf8_lossy().to_string());
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        // Trees always grow from the standard starting position.
        if let Some(fen) = tags.fen {
            if position::normalize_fen(&fen) != position::normalize_fen(STANDARD_START_FEN) {
                return ControlFlow::Break(Err(TreeError::NonStandardStart(fen)));
            }
        }
        let tree = OpeningTree::new();
        let current = tree.root();
        ControlFlow::Continue(TreeState {
            tree,
            current,
            position: Chess::default(),
            stack: Vec::new(),
            header_root_comment: tags.root_comment,
            at_variation_start: false,
            variation_comment: None,
        })
    }

    fn san(&mut self, state: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        match san_plus.san.to_move(&state.position) {
            Ok(mv) => {
                state.current = state.tree.ensure_variation(state.current, mv.clone());
                state.position.play_unchecked(mv);
                state.at_variation_start = false;
                if let Some(text) = state.variation_comment.take() {
                    let node = state.current;
                    state.append_comment(node, &text);
                }
                ControlFlow::Continue(())
            }
            Err(_) => ControlFlow::Break(Err(TreeError::IllegalMove {
                san: san_plus.to_string(),
                ply: state.tree.depth(state.current) + 1,
            })),
        }
    }

    fn comment(&mut self, state: &mut Self::Movetext, comment: RawComment<'_>) -> ControlFlow<Self::Output> {
        let text = String::from_utf8_lossy(comment.as_bytes());
        let text = text.trim();
        if state.at_variation_start {
            // Belongs to the variation's first move, which is not read yet.
            if !text.is_empty() {
                let pending = match state.variation_comment.take() {
                    Some(pending) => format!("{pending} {text}"),
                    None => text.to_string(),
                };
                state.variation_comment = Some(pending);
            }
            return ControlFlow::Continue(());
        }
        if state.current == state.tree.root() {
            state.header_root_comment = None;
        }
        let node = state.current;
        state.append_comment(node, text);
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, state: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        // A variation replaces the last move, so continue from its parent.
        let Some(parent) = state.tree.parent(state.current) else {
            return ControlFlow::Continue(Skip(true));
        };
        state.stack.push((state.current, state.position.clone()));
        state.current = parent;
        state.position = state.tree.position(parent);
        state.at_variation_start = true;
        ControlFlow::Continue(Skip(false))
    }

    fn end_variation(&mut self, state: &mut Self::Movetext) -> ControlFlow<Self::Output> {
        // A variation holding only a comment keeps it on the branch point.
        state.at_variation_start = false;
        if let Some(text) = state.variation_comment.take() {
            let node = state.current;
            state.append_comment(node, &text);
        }
        if let Some((node, position)) = state.stack.pop() {
            state.current = node;
            state.position = position;
        }
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, mut state: Self::Movetext) -> Self::Output {
        if let Some(comment) = state.header_root_comment.take() {
            let root = state.tree.root();
            state.tree.set_comment(root, comment);
        }
        Ok(state.tree)
    }
}

#[derive(Default)]
struct MovetextWriter {
    text: String,
    line_len: usize,
    /// Next black move needs an explicit `N...` number.
    force_number: bool,
}

impl MovetextWriter {
    fn token(&mut self, token: &str) {
        if self.line_len > 0 {
            if self.line_len + 1 + token.len() > MAX_LINE {
                self.text.push('\n');
                self.line_len = 0;
            } else {
                self.text.push(' ');
                self.line_len += 1;
            }
        }
        self.text.push_str(token);
        self.line_len += token.len();
    }

    fn comment(&mut self, comment: &str) {
        let comment = comment.replace('}', "");
        let comment = comment.trim();
        if comment.is_empty() {
            return;
        }
        self.token(&format!("{{ {comment} }}"));
        self.force_number = true;
    }

    fn play(&mut self, pos: &Chess, mv: &Move) -> Chess {
        let fullmoves = pos.fullmoves().get();
        if pos.turn() == Color::White {
            self.token(&format!("{fullmoves}."));
        } else if self.force_number {
            self.token(&format!("{fullmoves}..."));
        }
        self.force_number = false;

        let san = San::from_move(pos, mv.clone());
        let mut after = pos.clone();
        after.play_unchecked(mv.clone());
        let suffix = if after.is_checkmate() {
            "#"
        } else if after.is_check() {
            "+"
        } else {
            ""
        };
        self.token(&format!("{san}{suffix}"));
        after
    }

    /// Write everything after `node`: its main line with alternatives.
    fn continuation(&mut self, tree: &OpeningTree, node: NodeId, pos: &Chess) {
        let Some((&main, alternatives)) = tree.variations(node).split_first() else {
            return;
        };
        let Some(main_mv) = tree.get(main).mv.as_ref() else {
            return;
        };
        let main_pos = self.play(pos, main_mv);
        self.comment(tree.comment(main));

        for &alt in alternatives {
            let Some(alt_mv) = tree.get(alt).mv.as_ref() else {
                continue;
            };
            self.token("(");
            self.force_number = true;
            let alt_pos = self.play(pos, alt_mv);
            self.comment(tree.comment(alt));
            self.continuation(tree, alt, &alt_pos);
            self.token(")");
            self.force_number = true;
        }

        self.continuation(tree, main, &main_pos);
    }
}
