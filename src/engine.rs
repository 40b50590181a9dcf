//! Position evaluation backed by an external engine.
//!
//! Evaluations are gathered in batches: [`rank_moves`] acquires an
//! evaluator from an [`EvaluatorSource`], scores the position after every
//! legal move, and drops the evaluator before returning. For
//! [`UciEngine`] dropping sends `quit` and reaps the child process, so no
//! engine outlives the batch that started it, even when an evaluation
//! fails midway.

use std::{
    collections::HashMap,
    io::{BufRead, BufReader, BufWriter, Write},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use log::{debug, info, warn};
use rayon::prelude::*;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position, fen::Fen};

use crate::{
    config::EngineConfig,
    error::DifficultyError,
    types::{EvaluatedMove, RankedEvaluations},
};

/// Scores a position in pawns from the perspective of its side to move.
pub trait Evaluate {
    fn evaluate(&mut self, position: &Chess) -> Result<f32, DifficultyError>;
}

/// Hands out an evaluator for one batch of evaluations.
pub trait EvaluatorSource: Sync {
    type Evaluator: Evaluate;

    fn acquire(&self) -> Result<Self::Evaluator, DifficultyError>;
}

/// Evaluate every legal move of `position` and rank them best first for
/// the side to move. A `NaN` from the evaluator is an `Engine` error.
pub fn rank_moves<S: EvaluatorSource>(
    source: &S,
    position: &Chess,
) -> Result<RankedEvaluations, DifficultyError> {
    let legal_moves = position.legal_moves();
    if legal_moves.is_empty() {
        return Err(DifficultyError::GameOver);
    }

    let mut evaluator = source.acquire()?;
    let entries = evaluate_moves(&mut evaluator, position, &legal_moves)?;
    Ok(RankedEvaluations::new(entries))
}

/// Like [`rank_moves`], but splits the legal moves over up to `workers`
/// evaluators running concurrently.
pub fn rank_moves_parallel<S: EvaluatorSource>(
    source: &S,
    position: &Chess,
    workers: usize,
) -> Result<RankedEvaluations, DifficultyError> {
    let legal_moves = position.legal_moves();
    if legal_moves.is_empty() {
        return Err(DifficultyError::GameOver);
    }

    let chunk_size = legal_moves.len().div_ceil(workers.max(1));
    let chunks = legal_moves
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut evaluator = source.acquire()?;
            evaluate_moves(&mut evaluator, position, chunk)
        })
        .collect::<Result<Vec<_>, DifficultyError>>()?;

    // chunks come back in move-generation order, which the stable sort keeps
    Ok(RankedEvaluations::new(chunks.into_iter().flatten().collect()))
}

fn evaluate_moves<E: Evaluate>(
    evaluator: &mut E,
    position: &Chess,
    moves: &[Move],
) -> Result<Vec<EvaluatedMove>, DifficultyError> {
    let mut entries = Vec::with_capacity(moves.len());
    for m in moves {
        let mut after = position.clone();
        after.play_unchecked(*m);

        // The evaluator answers for the opponent, who moves next
        let score = -evaluator.evaluate(&after)?;
        let uci = m.to_uci(CastlingMode::Standard);
        if score.is_nan() {
            return Err(DifficultyError::Engine(format!("no usable score for {uci}")));
        }
        debug!("{uci}: {score:.2}");
        entries.push(EvaluatedMove::new(uci, score));
    }
    Ok(entries)
}

/// An external engine speaking the UCI protocol over stdin/stdout.
pub struct UciEngine {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    movetime_ms: u64,
    mate_score: f32,
}

impl UciEngine {
    /// Spawn the engine and complete the UCI handshake.
    pub fn launch(config: &EngineConfig) -> Result<Self, DifficultyError> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DifficultyError::Engine("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DifficultyError::Engine("engine stdout unavailable".to_string()))?;

        let mut engine = Self {
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
            movetime_ms: config.movetime_ms,
            mate_score: config.mate_score,
        };

        engine.send("uci")?;
        engine.wait_for("uciok")?;
        for (name, value) in &config.options {
            engine.send(&format!("setoption name {name} value {value}"))?;
        }
        engine.send("isready")?;
        engine.wait_for("readyok")?;

        info!("engine {} ready", config.path);
        Ok(engine)
    }

    fn send(&mut self, command: &str) -> Result<(), DifficultyError> {
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self, line: &mut String) -> Result<(), DifficultyError> {
        line.clear();
        if self.stdout.read_line(line)? == 0 {
            return Err(DifficultyError::Engine(
                "engine closed its output".to_string(),
            ));
        }
        Ok(())
    }

    fn wait_for(&mut self, token: &str) -> Result<(), DifficultyError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line)?;
            if line.trim() == token {
                return Ok(());
            }
        }
    }
}

// En passant squares are only written when a capture is legal
fn position_command(position: &Chess) -> String {
    let fen = Fen::from_position(position, EnPassantMode::Legal);
    format!("position fen {fen}")
}

impl Evaluate for UciEngine {
    fn evaluate(&mut self, position: &Chess) -> Result<f32, DifficultyError> {
        self.send(&position_command(position))?;
        self.send(&format!("go movetime {}", self.movetime_ms))?;

        let mut line = String::new();
        let mut score = None;
        loop {
            self.read_line(&mut line)?;
            let trimmed = line.trim();
            if trimmed.starts_with("bestmove") {
                break;
            }
            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                match parse_score(trimmed, self.mate_score) {
                    Some(s) => score = Some(s),
                    None => warn!("unreadable score in {trimmed:?}"),
                }
            }
        }

        let fen = Fen::from_position(position, EnPassantMode::Legal);
        score.ok_or_else(|| DifficultyError::Engine(format!("no score reported for {fen}")))
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.send("quit");
        let _ = self.child.wait();
    }
}

impl EvaluatorSource for EngineConfig {
    type Evaluator = UciEngine;

    fn acquire(&self) -> Result<UciEngine, DifficultyError> {
        UciEngine::launch(self)
    }
}

/// Read the score of a UCI `info` line in pawns.
///
/// `cp N` becomes `N / 100`; `mate N` becomes `±mate_score` with the sign
/// of `N`, where `mate 0` means the side to move is already mated. The
/// result is clamped to `±mate_score`.
pub fn parse_score(line: &str, mate_score: f32) -> Option<f32> {
    let mut tokens = line.split_whitespace();
    tokens.find(|&t| t == "score")?;
    let kind = tokens.next()?;
    let value: i32 = tokens.next()?.parse().ok()?;

    let pawns = match kind {
        "cp" => value as f32 / 100.0,
        "mate" if value > 0 => mate_score,
        "mate" => -mate_score,
        _ => return None,
    };
    Some(pawns.clamp(-mate_score, mate_score))
}

/// Evaluations looked up from a fixed table keyed by piece placement and
/// side to move. Positions missing from the table score `default`.
#[derive(Debug, Clone, Default)]
pub struct FixedEvaluations {
    scores: HashMap<String, f32>,
    default: f32,
}

impl FixedEvaluations {
    pub fn new(default: f32) -> Self {
        Self {
            scores: HashMap::new(),
            default,
        }
    }

    /// Score the position described by `fen` (from its side to move).
    pub fn with(mut self, fen: &str, score: f32) -> Result<Self, DifficultyError> {
        let position: Chess = fen.parse::<Fen>()?.into_position(CastlingMode::Standard)?;
        self.scores.insert(Self::key(&position), score);
        Ok(self)
    }

    fn key(position: &Chess) -> String {
        let turn = if position.turn().is_white() { 'w' } else { 'b' };
        format!("{} {turn}", position.board())
    }
}

impl Evaluate for FixedEvaluations {
    fn evaluate(&mut self, position: &Chess) -> Result<f32, DifficultyError> {
        Ok(self
            .scores
            .get(&Self::key(position))
            .copied()
            .unwrap_or(self.default))
    }
}

impl EvaluatorSource for FixedEvaluations {
    type Evaluator = FixedEvaluations;

    fn acquire(&self) -> Result<FixedEvaluations, DifficultyError> {
        Ok(self.clone())
    }
}
