//! End-to-end: grow a tree from canned sources, persist it, and reload it.

mod common;

use std::fs;

use common::{find, temp_pgn, ConstantEngine, MockExplorer};
use opening_core::builder::{BuildOptions, TreeBuilder};
use opening_core::{pgn, OpeningTree};
use std::time::Duration;

fn options(min_occurrences: u64) -> BuildOptions {
    BuildOptions {
        min_occurrences,
        engine_time: Duration::from_millis(1),
        rate_limit_backoff: Duration::ZERO,
    }
}

/// 1. Nf3 Nf6 2. Nc3 and 1. Nc3 Nf6 2. Nf3 reach the same position.
fn transposing_explorer() -> MockExplorer {
    MockExplorer::default()
        .with(&[], (50, 30, 20), &[("g1f3", 25, 15, 10), ("b1c3", 15, 10, 5), ("a2a3", 1, 0, 0)])
        .with(&["g1f3"], (25, 15, 10), &[("g8f6", 20, 10, 10)])
        .with(&["g1f3", "g8f6"], (20, 10, 10), &[("b1c3", 10, 5, 5)])
        .with(&["g1f3", "g8f6", "b1c3"], (10, 5, 5), &[("d7d5", 6, 3, 3)])
        .with(&["g1f3", "g8f6", "b1c3", "d7d5"], (6, 3, 3), &[])
        .with(&["b1c3"], (15, 10, 5), &[("g8f6", 10, 8, 4)])
        .with(&["b1c3", "g8f6"], (10, 8, 4), &[("g1f3", 7, 3, 2)])
}

fn build(explorer: MockExplorer, tree: &mut OpeningTree) -> TreeBuilder<MockExplorer, ConstantEngine> {
    let mut builder = TreeBuilder::new(explorer, ConstantEngine(20), options(5));
    let root = tree.root();
    builder.build(tree, root, 100.0);
    builder
}

#[test]
fn test_build_save_load() {
    let mut tree = OpeningTree::new();
    let builder = build(transposing_explorer(), &mut tree);

    // The transposed position is requested once; the rest are unique.
    assert_eq!(builder.stats_source().requests, 7);
    assert_eq!(builder.report().transpositions, 1);
    // a3 falls under the threshold.
    assert!(find(&tree, &["a2a3"]).is_none());

    let path = temp_pgn("build-save-load");
    pgn::save(&tree, &path).unwrap();
    let loaded = pgn::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(loaded.len(), tree.len());
    let first = find(&loaded, &["g1f3", "g8f6", "b1c3"]).unwrap();
    let second = find(&loaded, &["b1c3", "g8f6", "g1f3"]).unwrap();
    assert_eq!(loaded.metadata(first).frequency, 50.0);
    assert_eq!(loaded.metadata(second).frequency, 54.55);

    let d5 = find(&loaded, &["b1c3", "g8f6", "g1f3", "d7d5"]).unwrap();
    let meta = loaded.metadata(d5);
    assert_eq!(meta.frequency, 60.0);
    assert_eq!(meta.white_wins + meta.draws + meta.black_wins, meta.total_occurrence);
    assert_eq!(meta.eval, Some(0.2));
    assert_eq!(meta.eval_depth, 18);
}

#[test]
fn test_extend_keeps_free_text() {
    let mut tree = OpeningTree::new();
    build(transposing_explorer(), &mut tree);

    let nf3 = find(&tree, &["g1f3"]).unwrap();
    let annotated = format!("{} Reti territory", tree.comment(nf3));
    tree.set_comment(nf3, annotated);

    let path = temp_pgn("extend");
    pgn::save(&tree, &path).unwrap();
    let mut reloaded = pgn::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    // Rebuilding over an existing tree merges rather than duplicates.
    let before = reloaded.len();
    build(transposing_explorer(), &mut reloaded);
    assert_eq!(reloaded.len(), before);

    let nf3 = find(&reloaded, &["g1f3"]).unwrap();
    assert!(reloaded.comment(nf3).contains("Reti territory"));
    assert_eq!(reloaded.comment(nf3).matches("[freq:").count(), 1);
    assert_eq!(reloaded.metadata(nf3).frequency, 50.0);
}

#[test]
fn test_unreachable_positions_stay_leaves() {
    // Only the root is known; every child lookup fails.
    let explorer = MockExplorer::default().with(&[], (8, 1, 1), &[("e2e4", 6, 1, 1), ("d2d4", 2, 0, 0)]);
    let mut tree = OpeningTree::new();
    let mut builder = TreeBuilder::new(explorer, ConstantEngine(0), options(5));
    let root = tree.root();
    builder.build(&mut tree, root, 100.0);

    assert_eq!(builder.report().failed_fetches, 1);
    let e4 = find(&tree, &["e2e4"]).unwrap();
    assert!(tree.is_leaf(e4));
    assert_eq!(tree.metadata(e4).total_occurrence, 0);
    assert!(find(&tree, &["d2d4"]).is_none());
}
