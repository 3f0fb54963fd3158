//! Stockfish engine wrapper using UCI protocol

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use shakmaty::{fen::Fen, Chess, Color, EnPassantMode, Position};
use tracing::debug;

use opening_core::codec::{Evaluation, Score};
use opening_core::sources::{EvalError, EvalSource};

use crate::error::ExplorerError;

/// Stockfish engine instance, reused for every position of a build
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub fn new(path: &str) -> Result<Self, ExplorerError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ExplorerError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| ExplorerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| ExplorerError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci")?;
        engine.wait_for("uciok")?;

        engine.send("setoption name Threads value 1")?;
        engine.send("setoption name Hash value 256")?;
        engine.send("isready")?;
        engine.wait_for("readyok")?;

        Ok(engine)
    }

    fn send(&mut self, cmd: &str) -> Result<(), ExplorerError> {
        debug!(cmd, "SF <");
        writeln!(self.stdin, "{cmd}")
            .and_then(|_| self.stdin.flush())
            .map_err(|e| ExplorerError::Stockfish(format!("Failed to write to Stockfish: {e}")))
    }

    /// Next output line, trimmed. End of output means the engine died.
    fn read_line(&mut self) -> Result<String, ExplorerError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .map_err(|e| ExplorerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(ExplorerError::Stockfish("Stockfish exited unexpectedly".into()));
        }
        Ok(line.trim().to_string())
    }

    fn wait_for(&mut self, expected: &str) -> Result<(), ExplorerError> {
        loop {
            let line = self.read_line()?;
            debug!(line = %line, "SF >");
            if line == expected {
                return Ok(());
            }
        }
    }

    /// Search `pos` for `movetime` and return the last reported score, from
    /// White's point of view.
    pub fn analyse(&mut self, pos: &Chess, movetime: Duration) -> Result<Evaluation, ExplorerError> {
        let fen = Fen::from_position(pos, EnPassantMode::Legal);
        self.send(&format!("position fen {fen}"))?;
        self.send(&format!("go movetime {}", movetime.as_millis().max(1)))?;

        let mut score = None;
        let mut depth = 0;
        loop {
            let line = self.read_line()?;
            if line.starts_with("info") {
                if let Some(s) = parse_score(&line) {
                    score = Some(s);
                    depth = parse_depth(&line).unwrap_or(depth);
                }
            } else if line.starts_with("bestmove") {
                break;
            }
        }

        let score = score.ok_or_else(|| {
            ExplorerError::Stockfish(format!("No score reported for {fen}"))
        })?;
        Ok(Evaluation {
            score: white_pov(score, pos.turn()),
            depth,
        })
    }

    /// Send quit command and wait for process to exit
    pub fn quit(&mut self) {
        let _ = self.send("quit");
        let _ = self.process.wait();
    }
}

impl EvalSource for StockfishEngine {
    fn evaluate(&mut self, pos: &Chess, budget: Duration) -> Result<Evaluation, EvalError> {
        self.analyse(pos, budget).map_err(|e| EvalError(e.to_string()))
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Value following `key` in an info line
fn field<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == key && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    field(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    field(line, "mate")
}

fn parse_depth(line: &str) -> Option<u32> {
    field(line, "depth")
}

/// Score from the side to move's point of view
fn parse_score(line: &str) -> Option<Score> {
    if !line.contains(" score ") {
        return None;
    }
    parse_mate(line)
        .map(Score::Mate)
        .or_else(|| parse_cp(line).map(Score::Cp))
}

/// `mate 0` means the side to move is already checkmated.
fn white_pov(score: Score, turn: Color) -> Score {
    match (turn, score) {
        (_, Score::Mate(0)) => Score::Mated(turn),
        (Color::White, score) => score,
        (Color::Black, Score::Cp(cp)) => Score::Cp(-cp),
        (Color::Black, Score::Mate(n)) => Score::Mate(-n),
        (_, Score::Mated(side)) => Score::Mated(side),
    }
}
