//! Stage transitions of the two-operand games.
//!
//! Multiply, multiply-to-20, multiply-from-base, square and tricks share one
//! loop. The functions here are pure: they take the stored session (if any)
//! and return the session to store plus the view to render.

use rand::Rng;

use super::error::StageError;
use super::outcome::View;
use super::rules::TwoOperandGame;
use super::session::{AnswerRecord, GameKind, GameSession};
use super::setup::GameSetup;

/// Validate a setup and draw the first problem.
///
/// Nothing is returned on failure, so nothing partial gets stored.
pub fn configure<R: Rng + ?Sized>(setup: GameSetup, rng: &mut R) -> Result<GameSession, StageError> {
    let game = TwoOperandGame::from_setup(&setup)?;
    let (operands, expected) = game.draw(rng);
    tracing::debug!(kind = %setup.kind(), ?operands, "configured");
    Ok(GameSession::new(setup, operands, expected))
}

/// Show the current problem. Reads only.
pub fn display(kind: GameKind, session: Option<&GameSession>) -> Result<View, StageError> {
    let session = require_ref(kind, session)?;
    let game = TwoOperandGame::from_setup(&session.setup)?;
    Ok(View::Problem {
        operands: session.operands.clone(),
        operator: game.operator().symbol(),
    })
}

/// Check an answer. A correct answer draws the next problem right away;
/// a wrong one leaves the problem in place.
pub fn answer<R: Rng + ?Sized>(
    kind: GameKind,
    session: Option<GameSession>,
    submitted: Option<&str>,
    rng: &mut R,
) -> Result<(GameSession, View), StageError> {
    let mut session = require(kind, session)?;
    let game = TwoOperandGame::from_setup(&session.setup)?;

    let expression = game.operator().expression(&session.operands);
    let record = AnswerRecord::check(submitted, session.target_value, expression);
    let correct = record.correct;
    session.record(record.clone());

    if correct {
        let (operands, expected) = game.draw(rng);
        session.next_round(operands, expected);
    }
    tracing::debug!(%kind, correct, rounds = session.rounds_played, "answer checked");

    let view = View::Verdict {
        record,
        rounds_played: session.rounds_played,
        rounds_correct: session.rounds_correct,
    };
    Ok((session, view))
}

fn require(kind: GameKind, session: Option<GameSession>) -> Result<GameSession, StageError> {
    match session {
        Some(s) if s.kind == kind && !s.operands.is_empty() => Ok(s),
        _ => Err(StageError::MissingSession(kind)),
    }
}

fn require_ref(kind: GameKind, session: Option<&GameSession>) -> Result<&GameSession, StageError> {
    match session {
        Some(s) if s.kind == kind && !s.operands.is_empty() => Ok(s),
        _ => Err(StageError::MissingSession(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::Stage;
    use crate::state::setup::TrickWidth;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn multiply_setup() -> GameSetup {
        GameSetup::Multiply {
            first_range: "1-9".to_string(),
            second_range: "1-9".to_string(),
        }
    }

    #[test]
    fn test_configure_draws_problem() {
        let mut rng = StdRng::seed_from_u64(1);
        let session = configure(multiply_setup(), &mut rng).unwrap();
        assert_eq!(session.kind, GameKind::Multiply);
        assert_eq!(session.stage, Stage::Display);
        assert_eq!(session.operands.len(), 2);
        assert_eq!(session.target_value, session.operands[0] * session.operands[1]);
    }

    #[test]
    fn test_configure_rejects_empty_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = configure(GameSetup::Square { ranges: vec![] }, &mut rng).unwrap_err();
        assert!(matches!(err, StageError::Setup(_)));
    }

    #[test]
    fn test_display_is_read_only() {
        let mut rng = StdRng::seed_from_u64(2);
        let session = configure(multiply_setup(), &mut rng).unwrap();
        let first = display(GameKind::Multiply, Some(&session)).unwrap();
        let second = display(GameKind::Multiply, Some(&session)).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            View::Problem {
                operands: session.operands.clone(),
                operator: "×"
            }
        );
    }

    #[test]
    fn test_missing_or_foreign_session() {
        assert_eq!(
            display(GameKind::Tricks, None).unwrap_err(),
            StageError::MissingSession(GameKind::Tricks)
        );

        let mut rng = StdRng::seed_from_u64(3);
        let session = configure(multiply_setup(), &mut rng).unwrap();
        assert!(display(GameKind::Square, Some(&session)).is_err());
        assert!(answer(GameKind::Tricks, None, Some("1"), &mut rng).is_err());
        assert_eq!(
            answer(GameKind::Square, Some(session), Some("1"), &mut rng).unwrap_err(),
            StageError::MissingSession(GameKind::Square)
        );
    }

    #[test]
    fn test_correct_answer_advances() {
        let mut rng = StdRng::seed_from_u64(4);
        let session = configure(multiply_setup(), &mut rng).unwrap();
        let correct = session.target_value.to_string();

        let (next, view) =
            answer(GameKind::Multiply, Some(session.clone()), Some(&correct), &mut rng).unwrap();
        match view {
            View::Verdict { record, .. } => {
                assert!(record.correct);
                assert_eq!(record.correct_value, session.target_value);
            }
            other => panic!("unexpected view {:?}", other),
        }
        assert_eq!(next.rounds_played, 1);
        assert_eq!(next.rounds_correct, 1);
        assert_eq!(next.stage, Stage::Display);
        assert_eq!(next.target_value, next.operands[0] * next.operands[1]);
        for op in &next.operands {
            assert!((1..=9).contains(&op.abs()));
        }
    }

    #[test]
    fn test_wrong_answer_keeps_problem() {
        let mut rng = StdRng::seed_from_u64(5);
        let session = configure(
            GameSetup::Tricks {
                width: TrickWidth::Three,
            },
            &mut rng,
        )
        .unwrap();

        for bad in [Some("not a number"), Some(""), None] {
            let (next, view) =
                answer(GameKind::Tricks, Some(session.clone()), bad, &mut rng).unwrap();
            assert_eq!(next.operands, session.operands);
            assert_eq!(next.rounds_correct, 0);
            assert!(matches!(view, View::Verdict { ref record, .. } if !record.correct));
        }
    }

    #[test]
    fn test_square_answer() {
        let mut rng = StdRng::seed_from_u64(6);
        let session = configure(
            GameSetup::Square {
                ranges: vec!["10-99".to_string()],
            },
            &mut rng,
        )
        .unwrap();
        let n = session.operands[0];
        let (_, view) = answer(
            GameKind::Square,
            Some(session),
            Some(&(n * n).to_string()),
            &mut rng,
        )
        .unwrap();
        match view {
            View::Verdict { record, .. } => {
                assert!(record.correct);
                assert_eq!(record.expression, format!("{}²", n));
            }
            other => panic!("unexpected view {:?}", other),
        }
    }
}
