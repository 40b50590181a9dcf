use shakmaty::uci::UciMove;

use crate::{error::DifficultyError, scalar::BoundedScalar, types::RankedEvaluations};

/// Rescale the score of `played` into `[0, 1]` between the worst (`0.0`)
/// and best (`1.0`) moves of `ranked`.
///
/// When every move scores the same the result is `1.0`.
pub fn move_accuracy(
    played: &UciMove,
    ranked: &RankedEvaluations,
) -> Result<BoundedScalar, DifficultyError> {
    let played_score = ranked
        .find(played)
        .ok_or_else(|| DifficultyError::MoveNotEvaluated {
            uci: played.clone(),
        })?
        .score;

    // `find` succeeded, so both extremes exist
    let (Some(best), Some(worst)) = (ranked.best(), ranked.worst()) else {
        return Err(DifficultyError::EmptyEvaluationSet);
    };

    if best.score == worst.score {
        return Ok(BoundedScalar::ONE);
    }

    let accuracy = (played_score - worst.score).abs() / (best.score - worst.score).abs();
    Ok(BoundedScalar::from_fraction(accuracy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ranked;
    use proptest::prelude::*;

    fn uci(s: &str) -> UciMove {
        s.parse().unwrap()
    }

    #[test]
    fn middle_move_is_rescaled_linearly() {
        let r = ranked(&[("e2e4", 3.0), ("d2d4", 0.0), ("a2a3", -2.0)]);
        let accuracy = move_accuracy(&uci("d2d4"), &r).unwrap();
        assert!((accuracy.get() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn best_and_worst_are_the_extremes() {
        let r = ranked(&[("e2e4", 1.5), ("d2d4", 0.7), ("a2a3", 0.2)]);
        assert_eq!(move_accuracy(&uci("e2e4"), &r).unwrap(), BoundedScalar::ONE);
        assert_eq!(move_accuracy(&uci("a2a3"), &r).unwrap(), BoundedScalar::ZERO);
    }

    #[test]
    fn flat_ranking_is_perfect() {
        let r = ranked(&[("e2e4", 0.4), ("d2d4", 0.4)]);
        assert_eq!(move_accuracy(&uci("d2d4"), &r).unwrap(), BoundedScalar::ONE);
    }

    #[test]
    fn unknown_move_is_rejected() {
        let r = ranked(&[("e2e4", 0.4), ("d2d4", 0.1)]);
        let err = move_accuracy(&uci("g1f3"), &r).unwrap_err();
        assert!(matches!(err, DifficultyError::MoveNotEvaluated { .. }));
    }

    #[test]
    fn repeated_calls_agree() {
        let r = ranked(&[("e2e4", -0.5), ("d2d4", -1.25), ("a2a3", -6.0)]);
        let first = move_accuracy(&uci("d2d4"), &r).unwrap();
        let second = move_accuracy(&uci("d2d4"), &r).unwrap();
        assert_eq!(first, second);
    }

    const FILES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

    proptest! {
        #[test]
        fn accuracy_follows_rank(scores in prop::collection::vec(-20.0f32..20.0, 2..8)) {
            let entries: Vec<(String, f32)> = scores
                .iter()
                .enumerate()
                .map(|(i, &s)| (format!("{}2{}3", FILES[i], FILES[i]), s))
                .collect();
            let borrowed: Vec<(&str, f32)> = entries.iter().map(|(m, s)| (m.as_str(), *s)).collect();
            let r = ranked(&borrowed);

            let accuracies: Vec<f32> = r
                .iter()
                .map(|e| move_accuracy(&e.uci, &r).unwrap().get())
                .collect();

            prop_assert!(accuracies.iter().all(|a| (0.0..=1.0).contains(a)));
            prop_assert_eq!(accuracies[0], 1.0);
            if r.best().unwrap().score != r.worst().unwrap().score {
                prop_assert_eq!(*accuracies.last().unwrap(), 0.0);
            }
            // best-first order means accuracy never increases down the list
            prop_assert!(accuracies.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
