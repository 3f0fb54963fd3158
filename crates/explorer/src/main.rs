//! Interactive opening explorer
//!
//! Loads an annotated tree and walks it from the terminal. Commands are read
//! one per line from stdin.
//!
//! Usage: explorer <tree.pgn> [width] [height]

use std::env;
use std::io::{self, BufRead, Write};

use tracing::{info, warn};

use explorer::render::render;
use explorer::session::{Command, Flow, Session};
use opening_core::pgn;

const DEFAULT_WIDTH: usize = 80;
const DEFAULT_HEIGHT: usize = 10;

const HELP: &str = "Commands: start, prev, next, mode, arrows, flip, <n> to pick a continuation, quit";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let _ = dotenvy::dotenv();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <tree.pgn> [width] [height]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let width = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_WIDTH);
    let height = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HEIGHT);

    let tree = pgn::load(path)?;
    let size = tree.size(tree.root());
    info!(
        path = %path,
        nodes = size.nodes,
        max_depth = size.max_depth,
        avg_breadth = size.avg_breadth,
        "Tree loaded"
    );

    let mut session = Session::new(tree);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("{HELP}");
    print!("{}", render(&session, width, height));

    let mut input = String::new();
    loop {
        print!("> ");
        stdout.flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        if input.trim().is_empty() {
            continue;
        }

        let command = match input.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                println!("{HELP}");
                continue;
            }
        };

        match session.apply(command) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => print!("{}", render(&session, width, height)),
            Err(e) => {
                warn!(error = %e, "Command rejected");
                println!("{e}");
            }
        }
    }

    Ok(())
}
