//! Plain-text rendering of the session's current node.

use shakmaty::{Board, File, Position, Rank, Square};

use opening_core::codec::{format_number, Metadata, MATE_PAWNS};
use opening_core::navigation::RankingMode;
use opening_core::{NodeId, OpeningTree};

use crate::session::{Orientation, Session};

/// Render the current node into at most `width` columns, listing at most
/// `height` continuations.
pub fn render(session: &Session, width: usize, height: usize) -> String {
    let tree = session.tree();
    let node = session.current();
    let meta = tree.metadata(node);

    let mut lines = Vec::new();
    lines.push(format!("Line: {}", line_text(tree, node)));
    lines.extend(info_lines(&meta));
    lines.push(format!(
        "Ranking: {}  Arrows: {}",
        match session.ranking() {
            RankingMode::Frequency => "frequency",
            RankingMode::Engine => "engine",
        },
        session.arrows().label()
    ));
    lines.push(String::new());
    lines.extend(board_lines(tree.position(node).board(), session.orientation()));
    lines.push(String::new());

    let ranked = session.ranked();
    let shown = session.highlighted();
    lines.push(format!("Continuations ({} of {}):", shown.len().min(height), ranked.len()));
    for (i, &child) in shown.iter().take(height).enumerate() {
        lines.push(continuation_line(tree, i + 1, child));
    }

    let mut out = String::new();
    for line in lines {
        out.extend(line.chars().take(width));
        out.push('\n');
    }
    out
}

/// Moves from the root to `node` with move numbers.
pub fn line_text(tree: &OpeningTree, node: NodeId) -> String {
    let mut parts = Vec::new();
    for (ply, step) in tree.path(node).into_iter().skip(1).enumerate() {
        let Some(san) = tree.san(step) else { continue };
        if ply % 2 == 0 {
            parts.push(format!("{}. {san}", ply / 2 + 1));
        } else {
            parts.push(san);
        }
    }
    if parts.is_empty() {
        "(start)".to_string()
    } else {
        parts.join(" ")
    }
}

fn info_lines(meta: &Metadata) -> Vec<String> {
    let opening = if meta.eco.is_empty() {
        "unknown".to_string()
    } else {
        format!("{} {}", meta.eco, meta.opening_name)
    };
    vec![
        format!("Opening: {opening}"),
        format!(
            "Games: {}  Frequency: {}%",
            meta.total_occurrence,
            format_number(meta.frequency)
        ),
        format!(
            "White {} ({}%)  Draws {} ({}%)  Black {} ({}%)",
            meta.white_wins,
            format_number(meta.white_percentage),
            meta.draws,
            format_number(meta.draw_percentage),
            meta.black_wins,
            format_number(meta.black_percentage)
        ),
        format!("Eval: {}", eval_text(meta)),
    ]
}

fn eval_text(meta: &Metadata) -> String {
    match meta.eval {
        None => "unknown".to_string(),
        Some(e) if e >= MATE_PAWNS => format!("white mates (depth {})", meta.eval_depth),
        Some(e) if e <= -MATE_PAWNS => format!("black mates (depth {})", meta.eval_depth),
        Some(e) => format!("{e:+.2} (depth {})", meta.eval_depth),
    }
}

fn continuation_line(tree: &OpeningTree, index: usize, child: NodeId) -> String {
    let meta = tree.metadata(child);
    let san = tree.san(child).unwrap_or_default();
    let eval = match meta.eval {
        Some(e) if e.abs() >= MATE_PAWNS => "mate".to_string(),
        Some(e) => format!("{e:+.2}"),
        None => "?".to_string(),
    };
    format!(
        "{index:>2}. {san:<7} {:>6}%  games {:<9} eval {eval}",
        format_number(meta.frequency),
        meta.total_occurrence
    )
}

/// Eight ranks of the board, the oriented side at the bottom.
fn board_lines(board: &Board, orientation: Orientation) -> Vec<String> {
    let (ranks, files): (Vec<u32>, Vec<u32>) = match orientation {
        Orientation::White => ((0..8).rev().collect(), (0..8).collect()),
        Orientation::Black => ((0..8).collect(), (0..8).rev().collect()),
    };

    let mut lines = Vec::with_capacity(9);
    for &rank in &ranks {
        let mut row = format!("{} ", rank + 1);
        for &file in &files {
            let square = Square::from_coords(File::new(file), Rank::new(rank));
            row.push(' ');
            row.push(board.piece_at(square).map_or('.', |piece| piece.char()));
        }
        lines.push(row);
    }
    let footer: String = files
        .iter()
        .map(|&file| format!(" {}", File::new(file).char()))
        .collect();
    lines.push(format!("  {footer}"));
    lines
}
