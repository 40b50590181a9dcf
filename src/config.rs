//! Tunable constants for rating players and choosing replies.
//!
//! Every field has a default, so a configuration document only needs to
//! name the values it changes:
//!
//! ```
//! use adaptive_opponent::DifficultyConfig;
//!
//! let config = DifficultyConfig::from_json_str(r#"{ "random_range": 0.5 }"#).unwrap();
//! assert_eq!(config.random_range, 0.5);
//! assert_eq!(config.punish_threshold, 1.0);
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::DifficultyError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Half-width, in pawns, of the band of candidate moves around the
    /// target evaluation.
    pub random_range: f32,
    /// `random_range` is multiplied by this for the capture band.
    pub extended_range_factor: f32,
    /// How far the best move may exceed the target before the target is
    /// pulled towards it.
    pub punish_threshold: f32,
    /// Exponent applied to skill when pulling the target towards the best
    /// move.
    pub punish_power: i32,
    pub skill: SkillTuning,
    pub engine: EngineConfig,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            random_range: 0.2,
            extended_range_factor: 10.0,
            punish_threshold: 1.0,
            punish_power: 4,
            skill: SkillTuning::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl DifficultyConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DifficultyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DifficultyError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Learning-rate parameters of the skill estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillTuning {
    /// Weight of the first observation. Should be greater than zero, or
    /// the first move is ignored.
    pub base_weight: f32,
    /// The weight grows by one for every this many observed moves...
    pub weight_per_move_divisor: f32,
    /// ...up to this ceiling.
    pub max_weight: f32,
    /// Confidence gained per observed move.
    pub confidence_step: f32,
}

impl Default for SkillTuning {
    fn default() -> Self {
        Self {
            base_weight: 2.0,
            weight_per_move_divisor: 3.5,
            max_weight: 14.0,
            confidence_step: 0.02,
        }
    }
}

/// How to launch and drive an external UCI engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable name or path.
    pub path: String,
    /// Search time per evaluated position.
    pub movetime_ms: u64,
    /// Magnitude, in pawns, reported for forced mates. Every score is
    /// clamped to `±mate_score`.
    pub mate_score: f32,
    /// `setoption` pairs sent after the handshake.
    pub options: Vec<(String, String)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            movetime_ms: 100,
            mate_score: 20.0,
            options: Vec::new(),
        }
    }
}
