use log::debug;
use rand::{Rng, seq::SliceRandom};
use shakmaty::{Chess, Role, uci::UciMove};

use crate::{
    config::DifficultyConfig,
    error::DifficultyError,
    skill::SkillEstimate,
    types::{EvaluatedMove, RankedEvaluations},
};

/// Choose the opponent's reply in `position`, aiming for the evaluation a
/// player of the estimated skill would reach.
///
/// `ranked` must hold the evaluations of `position`'s legal moves, best
/// first for the side to move. `rng` is only drawn from when a candidate
/// band around the target is non-empty.
pub fn select_move<R: Rng + ?Sized>(
    ranked: &RankedEvaluations,
    skill: &SkillEstimate,
    position: &Chess,
    config: &DifficultyConfig,
    rng: &mut R,
) -> Result<UciMove, DifficultyError> {
    let (Some(best), Some(worst), Some(neutral)) = (ranked.best(), ranked.worst(), ranked.neutral())
    else {
        return Err(DifficultyError::EmptyEvaluationSet);
    };

    if ranked.len() == 1 {
        return Ok(best.uci.clone());
    }
    // nothing to interpolate between, so play the quiet move
    if best.score == worst.score {
        debug!("all moves score {}, playing {}", best.score, neutral.uci);
        return Ok(neutral.uci.clone());
    }

    let target = target_evaluation(ranked, skill, config)?;
    debug!(
        "target {target:.2} (best {}, worst {}, skill {}, confidence {})",
        best.score, worst.score, skill.value, skill.confidence
    );

    let close = moves_within(ranked, target, config.random_range, |_| true);
    if let Some(chosen) = close.choose(rng) {
        debug!("{} of {} moves near target, chose {}", close.len(), ranked.len(), chosen.uci);
        return Ok(chosen.uci.clone());
    }

    let wide = config.random_range * config.extended_range_factor;
    let trades = moves_within(ranked, target, wide, |e| {
        is_capture_by_weaker_piece(position, &e.uci)
    });
    if let Some(chosen) = trades.choose(rng) {
        debug!("no move near target, chose favourable capture {}", chosen.uci);
        return Ok(chosen.uci.clone());
    }

    let closest = closest_to(ranked, target).ok_or(DifficultyError::EmptyEvaluationSet)?;
    debug!("no candidates in range, chose closest {}", closest.uci);
    Ok(closest.uci.clone())
}

/// The evaluation the opponent aims for, after confidence shrinkage and
/// mistake punishment.
pub fn target_evaluation(
    ranked: &RankedEvaluations,
    skill: &SkillEstimate,
    config: &DifficultyConfig,
) -> Result<f32, DifficultyError> {
    let (Some(best), Some(worst)) = (ranked.best(), ranked.worst()) else {
        return Err(DifficultyError::EmptyEvaluationSet);
    };
    let rating = skill.value.get();
    let confidence = skill.confidence.get();

    let mut target = lerp(worst.score, best.score, rating);

    // Shrink towards a balanced position while confidence is low. Written
    // as two branches, both reduce to `confidence * target`: full confidence
    // keeps the target, zero confidence gives 0.0.
    if target > 0.0 {
        target = lerp(0.0, target, confidence);
    } else {
        target = lerp(target, 0.0, 1.0 - confidence);
    }

    if best.score > target + config.punish_threshold {
        target = lerp(target, best.score, rating.powi(config.punish_power));
    }

    Ok(target)
}

fn lerp(worse: f32, better: f32, weight: f32) -> f32 {
    weight * (better - worse) + worse
}

fn moves_within<'a>(
    ranked: &'a RankedEvaluations,
    target: f32,
    range: f32,
    mut accept: impl FnMut(&EvaluatedMove) -> bool,
) -> Vec<&'a EvaluatedMove> {
    let (lower, upper) = (target - range, target + range);
    ranked
        .iter()
        .filter(|e| lower <= e.score && e.score <= upper && accept(e))
        .collect()
}

fn closest_to(ranked: &RankedEvaluations, target: f32) -> Option<&EvaluatedMove> {
    ranked.iter().reduce(|acc, e| {
        if (e.score - target).abs() < (acc.score - target).abs() {
            e
        } else {
            acc
        }
    })
}

/// Material value used to judge trades. Kings are priceless, so a king
/// capture never counts as winning material.
fn material_value(role: Role) -> f32 {
    match role {
        Role::Pawn => 1.0,
        Role::Knight => 3.0,
        Role::Bishop => 3.0,
        Role::Rook => 5.0,
        Role::Queen => 9.0,
        Role::King => f32::INFINITY,
    }
}

fn is_capture_by_weaker_piece(position: &Chess, uci: &UciMove) -> bool {
    let Ok(m) = uci.to_move(position) else {
        return false;
    };
    match m.capture() {
        Some(captured) => material_value(m.role()) < material_value(captured),
        None => false,
    }
}
