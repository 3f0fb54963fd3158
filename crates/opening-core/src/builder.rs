//! Grows an opening tree from a move statistics source.
//!
//! Starting from some node, the builder fetches outcome counts for the node's
//! position, writes them into the node's comment, and recurses into every
//! candidate move played at least `min_occurrences` times. Each finished
//! position is remembered by its [`PositionKey`]; when another move order
//! reaches the same position later, the finished subtree is copied instead of
//! fetched again and only the copy's relative frequency is rewritten.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use shakmaty::{uci::UciMove, Chess, Move, Position};
use tracing::{debug, info, warn};

use crate::codec::{self, Annotation, Evaluation, Opening, Statistics};
use crate::opening_tree::{NodeId, OpeningTree};
use crate::position::{self, PositionKey};
use crate::sources::{EvalSource, FetchError, PositionStats, StatsSource};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Candidate moves played fewer times than this are not expanded.
    pub min_occurrences: u64,
    /// Engine search time per position.
    pub engine_time: Duration,
    /// Pause before retrying a rate-limited request.
    pub rate_limit_backoff: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            min_occurrences: 10_000,
            engine_time: Duration::from_millis(100),
            rate_limit_backoff: Duration::from_secs(60),
        }
    }
}

/// Counters collected over one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub fetched: usize,
    pub transpositions: usize,
    pub cloned_nodes: usize,
    pub failed_fetches: usize,
    pub rate_limited: usize,
}

pub struct TreeBuilder<S, E> {
    stats: S,
    engine: E,
    options: BuildOptions,
    /// Finished subtrees by position, valid for this builder only.
    memo: HashMap<PositionKey, NodeId>,
    report: BuildReport,
}

impl<S: StatsSource, E: EvalSource> TreeBuilder<S, E> {
    pub fn new(stats: S, engine: E, options: BuildOptions) -> Self {
        Self {
            stats,
            engine,
            options,
            memo: HashMap::new(),
            report: BuildReport::default(),
        }
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn stats_source(&self) -> &S {
        &self.stats
    }

    /// Hand the sources back once building is done.
    pub fn into_sources(self) -> (S, E) {
        (self.stats, self.engine)
    }

    /// Grow the tree below `node`. Call on the root with `relative_freq = 100`.
    pub fn build(&mut self, tree: &mut OpeningTree, node: NodeId, relative_freq: f64) -> NodeId {
        let pos = tree.position(node);
        self.grow(tree, node, &pos, relative_freq);
        node
    }

    fn grow(&mut self, tree: &mut OpeningTree, node: NodeId, pos: &Chess, relative_freq: f64) {
        let key = PositionKey::from_position(pos);

        if let Some(&finished) = self.memo.get(&key) {
            let copied = tree.copy_subtree(finished, node);
            let patched = codec::patch_frequency(tree.comment(node), relative_freq);
            tree.set_comment(node, patched);

            self.report.transpositions += 1;
            self.report.cloned_nodes += copied;
            info!(position = %key, size = copied, "Transposition encountered");
            return;
        }

        let fen = position::fen(pos);
        let fetched = self.fetch_stats(&fen);
        let evaluation = self.evaluate(pos);

        let Some(stats) = fetched else {
            // No statistics: keep whatever evaluation we got and stop here.
            // Not memoized, so another move order can still fetch it.
            let annotation = Annotation {
                evaluation,
                ..Annotation::default()
            };
            write_annotation(tree, node, &annotation);
            return;
        };

        let total = stats.total();
        let annotation = Annotation {
            opening: stats.opening.as_ref().map(|o| Opening {
                eco: o.eco.clone(),
                name: o.name.clone(),
            }),
            statistics: Some(Statistics::from_counts(
                stats.white,
                stats.draws,
                stats.black,
                relative_freq,
            )),
            evaluation,
        };
        write_annotation(tree, node, &annotation);
        info!(position = %key, total, moves = stats.moves.len(), "Fetched position");

        for candidate in &stats.moves {
            let occurrences = candidate.occurrences();
            if occurrences < self.options.min_occurrences {
                debug!(uci = %candidate.uci, occurrences, "Pruned candidate");
                continue;
            }
            let Some(mv) = parse_uci(pos, &candidate.uci) else {
                warn!(uci = %candidate.uci, position = %key, "Skipping unplayable candidate move");
                continue;
            };

            let child = tree.ensure_variation(node, mv.clone());
            let mut child_pos = pos.clone();
            child_pos.play_unchecked(mv);
            let child_freq = codec::percentage(occurrences, total);
            self.grow(tree, child, &child_pos, child_freq);
        }

        self.memo.insert(key, node);
    }

    /// Fetch statistics, sleeping through rate limits. Any other failure is
    /// logged and reported as `None`.
    fn fetch_stats(&mut self, fen: &str) -> Option<PositionStats> {
        loop {
            match self.stats.position_stats(fen) {
                Ok(stats) => {
                    self.report.fetched += 1;
                    return Some(stats);
                }
                Err(FetchError::RateLimited) => {
                    self.report.rate_limited += 1;
                    warn!(
                        backoff_secs = self.options.rate_limit_backoff.as_secs(),
                        "Opening explorer: too many requests, backing off"
                    );
                    thread::sleep(self.options.rate_limit_backoff);
                }
                Err(e) => {
                    self.report.failed_fetches += 1;
                    warn!(fen, error = %e, "Failed to fetch position statistics");
                    return None;
                }
            }
        }
    }

    fn evaluate(&mut self, pos: &Chess) -> Option<Evaluation> {
        match self.engine.evaluate(pos, self.options.engine_time) {
            Ok(eval) => Some(eval),
            Err(e) => {
                warn!(error = %e, "Engine evaluation failed");
                None
            }
        }
    }
}

fn parse_uci(pos: &Chess, uci: &str) -> Option<Move> {
    let uci: UciMove = uci.parse().ok()?;
    uci.to_move(pos).ok()
}

/// Replace the node's tags with `annotation`, keeping any free text.
fn write_annotation(tree: &mut OpeningTree, node: NodeId, annotation: &Annotation) {
    let free_text = codec::strip_tags(tree.comment(node));
    let tags = annotation.render();
    let comment = match (free_text.is_empty(), tags.is_empty()) {
        (true, _) => tags,
        (false, true) => free_text,
        (false, false) => format!("{free_text} {tags}"),
    };
    tree.set_comment(node, comment);
}
