//! Stage transitions of the batch games: simple sum and flashcards.
//!
//! A round generates the whole sequence at once, shows it one item at a
//! time, then asks for the total. Flashcards show each item as abacus rods
//! instead of digits.

use rand::Rng;

use super::abacus::AbacusCard;
use super::config::GeneratorLimits;
use super::error::{SetupError, StageError};
use super::generator::ConstrainedGenerator;
use super::outcome::{Outcome, View};
use super::session::{sum_expression, AnswerRecord, GameKind, GameSession, Stage};
use super::setup::{BatchSetup, GameSetup};

/// Generate a round for `setup` and start at the first item.
pub fn configure<R: Rng + ?Sized>(
    setup: GameSetup,
    limits: GeneratorLimits,
    rng: &mut R,
) -> Result<GameSession, StageError> {
    let (operands, total) = generate(&setup, limits, rng)?;
    Ok(GameSession::new(setup, operands, total))
}

/// Start another round with the same setup, keeping the tallies.
pub fn next_round<R: Rng + ?Sized>(
    kind: GameKind,
    session: Option<GameSession>,
    limits: GeneratorLimits,
    rng: &mut R,
) -> Result<GameSession, StageError> {
    let mut session = require(kind, session)?;
    let (operands, total) = generate(&session.setup, limits, rng)?;
    session.next_round(operands, total);
    Ok(session)
}

/// Show the item under the cursor, or move on to the answer once all are shown.
pub fn display(kind: GameKind, session: Option<&GameSession>) -> Result<Outcome, StageError> {
    let session = require_ref(kind, session)?;
    let Some(value) = session.current_item() else {
        return Ok(Outcome::Redirect {
            kind,
            stage: Stage::Answer,
        });
    };
    let batch = batch_setup(session)?;
    let abacus = (kind == GameKind::Flashcards)
        .then(|| AbacusCard::encode_padded(value, batch.width.digits() as usize));

    Ok(Outcome::Render {
        kind,
        stage: Stage::Display,
        view: View::Item {
            value,
            position: session.cursor + 1,
            total: session.operands.len(),
            display_speed: batch.display_speed,
            abacus,
        },
    })
}

/// Step the cursor forward. Once the round reaches Answer or Result the
/// session is left as is.
pub fn advance(
    kind: GameKind,
    session: Option<GameSession>,
) -> Result<(GameSession, Outcome), StageError> {
    let mut session = require(kind, session)?;
    if matches!(session.stage, Stage::Answer | Stage::Result) {
        let stage = session.stage;
        return Ok((session, Outcome::Redirect { kind, stage }));
    }
    if !session.items_exhausted() {
        session.cursor += 1;
    }
    let stage = if session.items_exhausted() {
        Stage::Answer
    } else {
        Stage::Display
    };
    session.stage = stage;
    Ok((session, Outcome::Redirect { kind, stage }))
}

/// Answer entry form.
pub fn answer_form(kind: GameKind, session: Option<&GameSession>) -> Result<View, StageError> {
    let session = require_ref(kind, session)?;
    Ok(View::AnswerForm {
        total_items: session.operands.len(),
    })
}

/// Compare the submitted total with the generated one.
///
/// A round is scored once; later submissions get the stored verdict back.
pub fn answer(
    kind: GameKind,
    session: Option<GameSession>,
    submitted: Option<&str>,
) -> Result<(GameSession, View), StageError> {
    let mut session = require(kind, session)?;
    if session.stage == Stage::Result {
        tracing::debug!(%kind, "round already scored");
        let view = verdict(&session)?;
        return Ok((session, view));
    }
    let record = AnswerRecord::check(
        submitted,
        session.target_value,
        sum_expression(&session.operands),
    );
    session.record(record.clone());
    session.stage = Stage::Result;
    tracing::debug!(%kind, correct = record.correct, "batch answer checked");

    let view = View::Verdict {
        record,
        rounds_played: session.rounds_played,
        rounds_correct: session.rounds_correct,
    };
    Ok((session, view))
}

/// Re-show the last verdict.
pub fn result(kind: GameKind, session: Option<&GameSession>) -> Result<View, StageError> {
    verdict(require_ref(kind, session)?)
}

fn verdict(session: &GameSession) -> Result<View, StageError> {
    let record = session.last_result.clone().ok_or(StageError::NoSubmission)?;
    Ok(View::Verdict {
        record,
        rounds_played: session.rounds_played,
        rounds_correct: session.rounds_correct,
    })
}

fn generate<R: Rng + ?Sized>(
    setup: &GameSetup,
    limits: GeneratorLimits,
    rng: &mut R,
) -> Result<(Vec<i64>, i64), StageError> {
    let batch = setup.batch().ok_or(SetupError::KindMismatch {
        expected: GameKind::SimpleSum,
        found: setup.kind(),
    })?;
    let generator = ConstrainedGenerator::new(batch.digit_spec()?, limits);
    let sequence = generator.generate(batch.operand_count, rng);
    Ok((sequence.terms, sequence.total))
}

fn batch_setup(session: &GameSession) -> Result<&BatchSetup, StageError> {
    session.setup.batch().ok_or(StageError::MissingSession(session.kind))
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
