use std::cmp::Ordering;

use shakmaty::uci::UciMove;

/// A legal move paired with the score of the position it leads to.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedMove {
    pub uci: UciMove,
    /// Pawn units from the perspective of the side making the move
    pub score: f32,
}

impl EvaluatedMove {
    pub fn new(uci: UciMove, score: f32) -> Self {
        Self { uci, score }
    }
}

/// Evaluations of every legal move in one position, sorted best to worst
/// for the side to move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedEvaluations {
    entries: Vec<EvaluatedMove>,
}

impl RankedEvaluations {
    /// Sort `entries` best first. The sort is stable, so equal scores keep
    /// the order in which they were generated. `NaN` scores sort last.
    pub fn new(mut entries: Vec<EvaluatedMove>) -> Self {
        entries.sort_by(|a, b| best_first(a.score, b.score));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&EvaluatedMove> {
        self.entries.first()
    }

    pub fn worst(&self) -> Option<&EvaluatedMove> {
        self.entries.last()
    }

    /// Entry for `uci`, if it was evaluated.
    pub fn find(&self, uci: &UciMove) -> Option<&EvaluatedMove> {
        self.entries.iter().find(|e| &e.uci == uci)
    }

    /// The move leading to the most balanced position (smallest absolute
    /// score). Ties go to the earlier entry.
    pub fn neutral(&self) -> Option<&EvaluatedMove> {
        self.entries
            .iter()
            .reduce(|acc, e| if e.score.abs() < acc.score.abs() { e } else { acc })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EvaluatedMove> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[EvaluatedMove] {
        &self.entries
    }
}

// Total order: descending for numbers (`-0.0 == 0.0`), `NaN` after all of them
fn best_first(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

impl FromIterator<EvaluatedMove> for RankedEvaluations {
    fn from_iter<I: IntoIterator<Item = EvaluatedMove>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RankedEvaluations {
    type Item = &'a EvaluatedMove;
    type IntoIter = std::slice::Iter<'a, EvaluatedMove>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
pub(crate) fn ranked(entries: &[(&str, f32)]) -> RankedEvaluations {
    entries
        .iter()
        .map(|&(uci, score)| EvaluatedMove::new(uci.parse().unwrap(), score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_best_first_and_keeps_tie_order() {
        let r = ranked(&[("a2a3", 0.1), ("e2e4", 0.5), ("h2h3", 0.1), ("g1f3", 0.4)]);
        let order: Vec<String> = r.iter().map(|e| e.uci.to_string()).collect();
        assert_eq!(order, ["e2e4", "g1f3", "a2a3", "h2h3"]);
        assert_eq!(r.best().unwrap().score, 0.5);
        assert_eq!(r.worst().unwrap().uci.to_string(), "h2h3");
    }

    #[test]
    fn nan_scores_sort_last_without_panicking() {
        let entries: Vec<(String, f32)> = (0..40)
            .map(|i| {
                let file = (b'a' + (i % 8) as u8) as char;
                let score = if i % 3 == 0 { f32::NAN } else { i as f32 * 0.1 - 2.0 };
                (format!("{file}2{file}4"), score)
            })
            .collect();
        let borrowed: Vec<(&str, f32)> = entries.iter().map(|(m, s)| (m.as_str(), *s)).collect();
        let r = ranked(&borrowed);

        assert_eq!(r.len(), 40);
        let first_nan = r.iter().position(|e| e.score.is_nan()).unwrap();
        assert!(r.as_slice()[first_nan..].iter().all(|e| e.score.is_nan()));
        assert!(r.as_slice()[..first_nan].windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn signed_zeros_tie() {
        let r = ranked(&[("a2a3", -0.0), ("h2h3", 0.0), ("b2b3", -0.0)]);
        let order: Vec<String> = r.iter().map(|e| e.uci.to_string()).collect();
        assert_eq!(order, ["a2a3", "h2h3", "b2b3"]);
    }

    #[test]
    fn neutral_has_minimal_absolute_score() {
        let r = ranked(&[("e2e4", 3.0), ("d2d4", -0.25), ("a2a3", 0.25), ("h2h4", -2.0)]);
        let neutral = r.neutral().unwrap();
        assert_eq!(neutral.uci.to_string(), "a2a3");
        assert!(r.iter().all(|e| neutral.score.abs() <= e.score.abs()));
    }

    #[test]
    fn find_looks_up_by_identifier() {
        let r = ranked(&[("e2e4", 0.3), ("d2d4", 0.2)]);
        let uci: UciMove = "d2d4".parse().unwrap();
        assert_eq!(r.find(&uci).unwrap().score, 0.2);
        let missing: UciMove = "c2c4".parse().unwrap();
        assert!(r.find(&missing).is_none());
    }

    #[test]
    fn empty_ranking_has_no_extremes() {
        let r = RankedEvaluations::default();
        assert!(r.is_empty());
        assert!(r.best().is_none());
        assert!(r.neutral().is_none());
    }
}
