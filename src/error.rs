//! Error types for the adaptive opponent library.
//!
//! This crate uses `thiserror` to provide a single enumeration of the
//! errors that may occur while rating a player or choosing a reply. The
//! first two variants are contract violations by the caller; the rest
//! wrap failures of the chess-rules and evaluation-engine collaborators.

use shakmaty::uci::UciMove;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DifficultyError {
    /// The played move does not appear in the ranking of the position it
    /// was played from.
    #[error("Move {uci} has no evaluation in the supplied ranking")]
    MoveNotEvaluated { uci: UciMove },

    /// A move was requested from an empty ranking.
    #[error("No evaluated moves to choose from")]
    EmptyEvaluationSet,

    /// A move was requested in a position that has no legal moves.
    #[error("The game is already over")]
    GameOver,

    /// The provided FEN string could not be parsed.
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    /// A parsed position is invalid from the perspective of `shakmaty`.
    #[error("Invalid Chess Position: {0}")]
    InvalidPosition(#[from] shakmaty::PositionError<shakmaty::Chess>),

    /// Text that looked like a UCI move could not be parsed.
    #[error("Invalid UCI move: {0}")]
    InvalidUci(#[from] shakmaty::uci::ParseUciMoveError),

    /// A UCI move is not legal in the position it was applied to.
    #[error("Illegal move: {0}")]
    IllegalMove(#[from] shakmaty::uci::IllegalUciMoveError),

    /// A SAN move could not be resolved in the current position.
    #[error("Invalid SAN move: {0}")]
    InvalidSan(#[from] shakmaty::san::SanError),

    /// The engine process broke the UCI protocol.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Reading from or writing to the engine process failed.
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
