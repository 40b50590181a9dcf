use log::info;
use rand::Rng;
use shakmaty::{CastlingMode, Chess, Color, Move, Position, san::San, uci::UciMove};

use crate::{
    accuracy::move_accuracy,
    config::DifficultyConfig,
    engine::{EvaluatorSource, rank_moves, rank_moves_parallel},
    error::DifficultyError,
    scalar::BoundedScalar,
    selector::select_move,
    skill::SkillEstimate,
    types::RankedEvaluations,
};

/// A move together with the position it was played from.
///
/// The accuracy is computed on first request and cached afterwards.
#[derive(Debug, Clone)]
pub struct PlayedMove {
    position: Chess,
    uci: UciMove,
    evaluation: Option<f32>,
    accuracy: Option<BoundedScalar>,
}

impl PlayedMove {
    pub fn new(position: Chess, uci: UciMove) -> Self {
        Self {
            position,
            uci,
            evaluation: None,
            accuracy: None,
        }
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn uci(&self) -> &UciMove {
        &self.uci
    }

    /// Score of the move, known once the accuracy has been computed.
    pub fn evaluation(&self) -> Option<f32> {
        self.evaluation
    }

    /// Accuracy of the move against `ranked`, the evaluations of the
    /// position it was played from.
    pub fn accuracy(&mut self, ranked: &RankedEvaluations) -> Result<BoundedScalar, DifficultyError> {
        if let Some(accuracy) = self.accuracy {
            return Ok(accuracy);
        }
        let accuracy = move_accuracy(&self.uci, ranked)?;
        self.evaluation = ranked.find(&self.uci).map(|e| e.score);
        self.accuracy = Some(accuracy);
        Ok(accuracy)
    }
}

/// Parse `text` as UCI (`e2e4`) or, failing that, SAN (`e4`, `Nf3`), and
/// check it is legal in `position`.
pub fn parse_move(text: &str, position: &Chess) -> Result<Move, DifficultyError> {
    let text = text.trim();
    match text.parse::<UciMove>() {
        Ok(uci) => Ok(uci.to_move(position)?),
        Err(uci_err) => match text.parse::<San>() {
            Ok(san) => Ok(san.to_move(position)?),
            Err(_) => Err(uci_err.into()),
        },
    }
}

/// What happened on a human turn.
#[derive(Debug, Clone)]
pub struct HumanTurn {
    pub played: PlayedMove,
    pub accuracy: BoundedScalar,
    pub skill: SkillEstimate,
}

/// What happened on an opponent turn.
#[derive(Debug, Clone)]
pub struct OpponentTurn {
    pub uci: UciMove,
    pub san: San,
    pub score: f32,
    pub ranked: RankedEvaluations,
    /// `ranked` in SAN, in the same order.
    pub candidates: Vec<(San, f32)>,
}

/// Render `ranked` in SAN for the position it was evaluated in.
pub fn san_table(
    ranked: &RankedEvaluations,
    position: &Chess,
) -> Result<Vec<(San, f32)>, DifficultyError> {
    ranked
        .iter()
        .map(|e| -> Result<(San, f32), DifficultyError> {
            let m = e.uci.to_move(position)?;
            Ok((San::from_move(position, m), e.score))
        })
        .collect()
}

/// One game against the adaptive opponent.
///
/// The session owns the board and the player's skill estimate; nothing is
/// shared between sessions. With no human colour set, the opponent plays
/// both sides.
pub struct GameSession<S, R> {
    source: S,
    rng: R,
    config: DifficultyConfig,
    skill: SkillEstimate,
    position: Chess,
    human: Option<Color>,
    workers: usize,
}

impl<S: EvaluatorSource, R: Rng> GameSession<S, R> {
    pub fn new(source: S, config: DifficultyConfig, rng: R) -> Self {
        Self {
            source,
            rng,
            config,
            skill: SkillEstimate::default(),
            position: Chess::default(),
            human: None,
            workers: 1,
        }
    }

    pub fn with_human(mut self, color: Color) -> Self {
        self.human = Some(color);
        self
    }

    pub fn with_skill(mut self, skill: SkillEstimate) -> Self {
        self.skill = skill;
        self
    }

    pub fn with_position(mut self, position: Chess) -> Self {
        self.position = position;
        self
    }

    /// Evaluate candidate moves on up to `workers` evaluators at once.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn skill(&self) -> &SkillEstimate {
        &self.skill
    }

    pub fn side_to_move(&self) -> Color {
        self.position.turn()
    }

    pub fn is_game_over(&self) -> bool {
        self.position.is_game_over()
    }

    pub fn is_human_turn(&self) -> bool {
        self.human == Some(self.position.turn())
    }

    /// Play the human's move given as UCI or SAN text, folding its accuracy
    /// into the skill estimate.
    pub fn play_human(&mut self, text: &str) -> Result<HumanTurn, DifficultyError> {
        if self.is_game_over() {
            return Err(DifficultyError::GameOver);
        }
        let m = parse_move(text, &self.position)?;
        let ranked = self.rank()?;

        let mut played = PlayedMove::new(self.position.clone(), m.to_uci(CastlingMode::Standard));
        let accuracy = played.accuracy(&ranked)?;
        let skill = self.skill.update_with(accuracy, &self.config.skill);
        self.position.play_unchecked(m);

        info!(
            "player {} accuracy {accuracy}, skill now {} (confidence {})",
            played.uci(),
            skill.value,
            skill.confidence
        );
        Ok(HumanTurn {
            played,
            accuracy,
            skill,
        })
    }

    /// Choose and play the opponent's reply.
    pub fn play_opponent(&mut self) -> Result<OpponentTurn, DifficultyError> {
        if self.is_game_over() {
            return Err(DifficultyError::GameOver);
        }
        let ranked = self.rank()?;
        let uci = select_move(&ranked, &self.skill, &self.position, &self.config, &mut self.rng)?;
        let m = uci.to_move(&self.position)?;
        let score = ranked
            .find(&uci)
            .map(|e| e.score)
            .ok_or_else(|| DifficultyError::MoveNotEvaluated { uci: uci.clone() })?;
        let san = San::from_move(&self.position, m);
        let candidates = san_table(&ranked, &self.position)?;
        self.position.play_unchecked(m);

        info!("opponent played {san} ({score:+.2})");
        Ok(OpponentTurn {
            uci,
            san,
            score,
            ranked,
            candidates,
        })
    }

    fn rank(&self) -> Result<RankedEvaluations, DifficultyError> {
        if self.workers > 1 {
            rank_moves_parallel(&self.source, &self.position, self.workers)
        } else {
            rank_moves(&self.source, &self.position)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::FixedEvaluations, types::ranked};
    use rand::{SeedableRng, rngs::StdRng};
    use shakmaty::fen::Fen;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const AFTER_A3: &str = "rnbqkbnr/pppppppp/8/8/8/P7/1PPPPPPP/RNBQKBNR b KQkq - 0 1";

    fn source() -> FixedEvaluations {
        FixedEvaluations::new(0.0)
            .with(AFTER_E4, -0.6)
            .unwrap()
            .with(AFTER_A3, 1.4)
            .unwrap()
    }

    fn session() -> GameSession<FixedEvaluations, StdRng> {
        GameSession::new(source(), DifficultyConfig::default(), StdRng::seed_from_u64(3))
            .with_human(Color::White)
    }

    #[test]
    fn parses_uci_and_san() {
        let pos = Chess::default();
        let uci = parse_move("e2e4", &pos).unwrap();
        let san = parse_move(" e4 ", &pos).unwrap();
        assert_eq!(uci, san);
        assert!(parse_move("Nf3", &pos).is_ok());
    }

    #[test]
    fn rejects_illegal_and_garbage_moves() {
        let pos = Chess::default();
        assert!(matches!(
            parse_move("e2e5", &pos),
            Err(DifficultyError::IllegalMove(_))
        ));
        assert!(matches!(parse_move("Ke2", &pos), Err(DifficultyError::InvalidSan(_))));
        assert!(matches!(parse_move("hello", &pos), Err(DifficultyError::InvalidUci(_))));
    }

    #[test]
    fn played_move_caches_its_accuracy() {
        let uci: UciMove = "d2d4".parse().unwrap();
        let mut played = PlayedMove::new(Chess::default(), uci);
        assert_eq!(played.evaluation(), None);

        let r = ranked(&[("e2e4", 3.0), ("d2d4", 0.0), ("a2a3", -2.0)]);
        let first = played.accuracy(&r).unwrap();
        assert!((first.get() - 0.4).abs() < 1e-6);
        assert_eq!(played.evaluation(), Some(0.0));

        let other = ranked(&[("d2d4", 1.0), ("e2e4", 0.0)]);
        assert_eq!(played.accuracy(&other).unwrap(), first);
    }

    #[test]
    fn best_move_raises_skill() {
        let mut game = session();
        assert!(game.is_human_turn());

        let turn = game.play_human("e4").unwrap();
        assert_eq!(turn.accuracy, BoundedScalar::ONE);
        assert_eq!(turn.played.evaluation(), Some(0.6));
        assert_eq!(turn.skill.value, BoundedScalar::ONE);
        assert_eq!(game.skill().moves_observed, 1);
        assert_eq!(game.side_to_move(), Color::Black);
        assert!(!game.is_human_turn());
    }

    #[test]
    fn worst_move_lowers_skill() {
        let mut game = session();
        let turn = game.play_human("a2a3").unwrap();
        assert_eq!(turn.accuracy, BoundedScalar::ZERO);
        assert_eq!(game.skill().value, BoundedScalar::ZERO);
        assert!((game.skill().confidence.get() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn rejected_move_leaves_the_session_untouched() {
        let mut game = session();
        assert!(game.play_human("e2e5").is_err());
        assert_eq!(game.skill(), &SkillEstimate::default());
        assert_eq!(game.side_to_move(), Color::White);
    }

    #[test]
    fn opponent_replies_with_a_legal_move() {
        let mut game = session();
        game.play_human("e4").unwrap();
        let reply = game.play_opponent().unwrap();

        assert_eq!(reply.ranked.len(), 20);
        assert!(reply.ranked.find(&reply.uci).is_some());
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.skill().moves_observed, 1);
    }

    #[test]
    fn opponent_move_is_reported_in_san() {
        // White's only sensible reply is to take the queen with the pawn
        let pos: Chess = "4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1"
            .parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap();
        let source = FixedEvaluations::new(0.0)
            .with("4k3/8/8/3P4/8/8/8/4K3 b - - 0 1", -9.0)
            .unwrap();
        let skill = SkillEstimate {
            value: BoundedScalar::ONE,
            confidence: BoundedScalar::ONE,
            moves_observed: 40,
        };
        let mut game = GameSession::new(source, DifficultyConfig::default(), StdRng::seed_from_u64(5))
            .with_skill(skill)
            .with_position(pos);

        let reply = game.play_opponent().unwrap();
        assert_eq!(reply.uci.to_string(), "e4d5");
        assert_eq!(reply.san.to_string(), "exd5");
        assert_eq!(reply.candidates.len(), reply.ranked.len());
        assert_eq!(reply.candidates[0].0.to_string(), "exd5");
        assert_eq!(reply.candidates[0].1, 9.0);
        assert!(reply.candidates.iter().any(|(san, _)| san.to_string() == "e5"));
    }

    #[test]
    fn san_table_rejects_moves_from_another_position() {
        let r = ranked(&[("e7e5", 0.2)]);
        assert!(matches!(
            san_table(&r, &Chess::default()),
            Err(DifficultyError::IllegalMove(_))
        ));
    }

    #[test]
    fn observed_game_runs_on_parallel_evaluators() {
        let mut game = GameSession::new(source(), DifficultyConfig::default(), StdRng::seed_from_u64(9))
            .with_workers(4);
        assert!(!game.is_human_turn());
        for _ in 0..6 {
            game.play_opponent().unwrap();
        }
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.skill(), &SkillEstimate::default());
    }

    #[test]
    fn finished_game_refuses_moves() {
        let mated: Chess = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"
            .parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap();
        let mut game = session().with_position(mated);
        assert!(game.is_game_over());
        assert!(matches!(game.play_human("e2e4"), Err(DifficultyError::GameOver)));
        assert!(matches!(game.play_opponent(), Err(DifficultyError::GameOver)));
    }
}
