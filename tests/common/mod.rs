#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use opening_core::codec::{Evaluation, Score};
use opening_core::position::PositionKey;
use opening_core::sources::{CandidateMove, EvalError, EvalSource, FetchError, PositionStats, StatsSource};
use opening_core::{NodeId, OpeningTree};
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Position};

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Scratch file path under the system temp dir.
pub fn temp_pgn(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{name}-{}-{}.pgn", std::process::id(), unique_suffix()))
}

pub fn position_after(moves: &[&str]) -> Chess {
    let mut pos = Chess::default();
    for uci in moves {
        let mv = uci.parse::<UciMove>().unwrap().to_move(&pos).unwrap();
        pos.play_unchecked(mv);
    }
    pos
}

/// Node reached by following UCI moves from the root.
pub fn find(tree: &OpeningTree, moves: &[&str]) -> Option<NodeId> {
    let mut node = tree.root();
    let mut pos = Chess::default();
    for uci in moves {
        let mv = uci.parse::<UciMove>().ok()?.to_move(&pos).ok()?;
        node = tree.child_with_move(node, &mv)?;
        pos.play_unchecked(mv);
    }
    Some(node)
}

/// Canned explorer answers keyed by position. Unknown positions answer 404.
#[derive(Default)]
pub struct MockExplorer {
    responses: HashMap<PositionKey, PositionStats>,
    pub requests: usize,
}

impl MockExplorer {
    pub fn with(
        mut self,
        moves: &[&str],
        (white, draws, black): (u64, u64, u64),
        candidates: &[(&str, u64, u64, u64)],
    ) -> Self {
        let stats = PositionStats {
            opening: None,
            white,
            draws,
            black,
            moves: candidates
                .iter()
                .map(|&(uci, white, draws, black)| CandidateMove {
                    uci: uci.to_string(),
                    san: None,
                    white,
                    draws,
                    black,
                })
                .collect(),
        };
        self.responses
            .insert(PositionKey::from_position(&position_after(moves)), stats);
        self
    }
}

impl StatsSource for MockExplorer {
    fn position_stats(&mut self, fen: &str) -> Result<PositionStats, FetchError> {
        self.requests += 1;
        self.responses
            .get(&PositionKey::from_fen(fen))
            .cloned()
            .ok_or(FetchError::Status {
                status: 404,
                body: "not found".to_string(),
            })
    }
}

/// Engine that reports the same White-relative score everywhere.
pub struct ConstantEngine(pub i32);

impl EvalSource for ConstantEngine {
    fn evaluate(&mut self, _pos: &Chess, _budget: Duration) -> Result<Evaluation, EvalError> {
        Ok(Evaluation {
            score: Score::Cp(self.0),
            depth: 18,
        })
    }
}
