//! Build an annotated opening tree from the Lichess explorer and Stockfish.
//!
//! Usage: cargo run --release --bin build-tree -- <output.pgn> [--extend <input.pgn>]
//!        [--min-occurrences N] [--engine-time-ms N]
//!
//! Example:
//!   STOCKFISH_PATH=/usr/bin/stockfish cargo run --release --bin build-tree -- masters.pgn --min-occurrences 50000

use std::env;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::info;

use explorer::clients::LichessExplorer;
use explorer::config::{flag_value, parse_value, BuildConfig};
use explorer::stockfish::StockfishEngine;
use opening_core::builder::TreeBuilder;
use opening_core::{pgn, OpeningTree};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <output.pgn> [--extend <input.pgn>] [--min-occurrences N] [--engine-time-ms N]",
            args[0]
        );
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --release --bin build-tree -- masters.pgn --min-occurrences 50000");
        std::process::exit(1);
    }

    let output = &args[1];
    let mut config = BuildConfig::from_env()?;
    let mut extend: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--extend" => {
                extend = Some(flag_value(&args, i)?.to_string());
                i += 2;
            }
            "--min-occurrences" => {
                config.min_occurrences = parse_value(&args[i], flag_value(&args, i)?)?;
                i += 2;
            }
            "--engine-time-ms" => {
                config.engine_time_ms = parse_value(&args[i], flag_value(&args, i)?)?;
                i += 2;
            }
            _ => i += 1,
        }
    }

    info!(
        explorer_url = %config.explorer_url,
        stockfish_path = %config.stockfish_path,
        min_occurrences = config.min_occurrences,
        engine_time_ms = config.engine_time_ms,
        "Building opening tree"
    );

    let mut tree = match &extend {
        Some(path) => {
            let tree = pgn::load(path)?;
            info!(path = %path, nodes = tree.len(), "Extending existing tree");
            tree
        }
        None => OpeningTree::new(),
    };

    let stats = LichessExplorer::new(
        &config.explorer_url,
        config.lichess_token.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?;
    let engine = StockfishEngine::new(&config.stockfish_path)?;

    let start = Instant::now();
    let mut builder = TreeBuilder::new(stats, engine, config.build_options());
    let root = tree.root();
    builder.build(&mut tree, root, 100.0);

    let report = builder.report().clone();
    let (stats, mut engine) = builder.into_sources();
    engine.quit();
    info!(
        explorer_url = %stats.url(),
        fetched = report.fetched,
        transpositions = report.transpositions,
        cloned_nodes = report.cloned_nodes,
        failed_fetches = report.failed_fetches,
        rate_limited = report.rate_limited,
        elapsed_secs = start.elapsed().as_secs(),
        "Build complete"
    );

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    pgn::save(&tree, output)?;

    let size = tree.size(root);
    info!(
        output = %output,
        nodes = size.nodes,
        max_depth = size.max_depth,
        avg_depth = size.avg_depth,
        max_breadth = size.max_breadth,
        avg_breadth = size.avg_breadth,
        "Tree saved"
    );

    Ok(())
}
