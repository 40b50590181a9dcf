use serde::{Deserialize, Serialize};

use crate::{config::SkillTuning, scalar::BoundedScalar};

/// Running estimate of a player's skill, owned by one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEstimate {
    pub value: BoundedScalar,
    pub confidence: BoundedScalar,
    pub moves_observed: u32,
}

impl Default for SkillEstimate {
    fn default() -> Self {
        Self::new(BoundedScalar::from_fraction(0.5))
    }
}

impl SkillEstimate {
    /// Start from `prior` with no confidence and no observed moves.
    pub fn new(prior: BoundedScalar) -> Self {
        Self {
            value: prior,
            confidence: BoundedScalar::ZERO,
            moves_observed: 0,
        }
    }

    /// Fold one move's accuracy into the estimate using the default tuning.
    pub fn update(&mut self, accuracy: BoundedScalar) -> SkillEstimate {
        self.update_with(accuracy, &SkillTuning::default())
    }

    /// Fold one move's accuracy into the estimate.
    ///
    /// The new observation is weighted like `min(base + n / divisor, max)`
    /// prior moves, where `n` is the number of moves observed so far, so
    /// early moves move the estimate quickly and later ones less so.
    /// Confidence rises by a fixed step regardless of the accuracy.
    ///
    /// With a zero `base_weight` the first observation carries no weight and
    /// the value is left as it is.
    pub fn update_with(&mut self, accuracy: BoundedScalar, tuning: &SkillTuning) -> SkillEstimate {
        let n = self.moves_observed as f32;
        let weight = (tuning.base_weight + n / tuning.weight_per_move_divisor).min(tuning.max_weight);

        let total = n + weight;
        if total > 0.0 {
            self.value.set((self.value.get() * n + accuracy.get() * weight) / total);
        }

        let confidence = self.confidence.get() + tuning.confidence_step;
        // within half a step of full confidence counts as full, which absorbs
        // rounding drift from repeated steps
        if confidence >= 1.0 - tuning.confidence_step / 2.0 {
            self.confidence = BoundedScalar::ONE;
        } else {
            self.confidence.set(confidence);
        }

        self.moves_observed += 1;
        self.clone()
    }
}
