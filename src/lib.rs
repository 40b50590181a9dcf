//! A chess opponent whose strength follows the player's.
//!
//!
//! Every human move is scored for accuracy against the evaluations of all
//! legal moves in its position, and the accuracies are folded into a
//! running skill estimate with a growing confidence. On its own turn the
//! opponent turns that estimate into a target evaluation and plays a move
//! near it rather than the engine's best move.
//!
//! The core pieces are [`move_accuracy`], [`SkillEstimate::update`] and
//! [`select_move`]. Evaluations come from any [`EvaluatorSource`]; the
//! crate ships [`UciEngine`] for external engines such as Stockfish.
//! [`GameSession`] ties the pieces together into a playable game.
//!
//! The library re‑exports `shakmaty` to make position construction easy.

mod accuracy;
mod config;
mod engine;
mod error;
mod scalar;
mod selector;
mod session;
mod skill;
mod types;

/// Accuracy of a played move.
pub use accuracy::move_accuracy;

/// Tunable constants.
pub use config::{DifficultyConfig, EngineConfig, SkillTuning};

/// Evaluation-engine collaborators.
pub use engine::{
    Evaluate, EvaluatorSource, FixedEvaluations, UciEngine, parse_score, rank_moves,
    rank_moves_parallel,
};

/// Error type produced by library operations.
pub use error::DifficultyError;

pub use scalar::BoundedScalar;

/// Reply selection.
pub use selector::{select_move, target_evaluation};

/// Game driver.
pub use session::{GameSession, HumanTurn, OpponentTurn, PlayedMove, parse_move, san_table};

pub use skill::SkillEstimate;

/// Ranked move evaluations.
pub use types::{EvaluatedMove, RankedEvaluations};

/// Re-export of `shakmaty` for convenience when building positions.
pub use shakmaty;
