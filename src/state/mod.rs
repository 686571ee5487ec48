//! Game state module.
//!
//! - `session` - game kinds, stages and the persisted [`GameSession`]
//! - `setup` - per-game configuration and form parsing
//! - `rules` - operand drawing and scoring for two-operand games
//! - `two_operand` / `batch` - pure stage transitions per game family
//! - `generator` - constrained signed-sequence generator
//! - `abacus` - bead patterns for flashcards
//! - `ranges` - named numeric ranges
//! - `store` - session and preference storage contracts
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                            GameEngine                                │
//! │                                                                      │
//! │   request ──▶ load_session ──▶ transition ──▶ save_session ──▶ Outcome│
//! │                  │              (pure)            │                   │
//! │                  ▼                                ▼                   │
//! │          ┌──────────────┐                ┌─────────────────┐          │
//! │          │ SessionStore │                │ PreferenceStore │          │
//! │          │ game.<kind>  │                │ (user, kind) →  │          │
//! │          │  → session   │                │    GameSetup    │          │
//! │          └──────────────┘                └─────────────────┘          │
//! │                                                                      │
//! │   transition = two_operand::{configure, display, answer}             │
//! │              | batch::{configure, display, advance, answer, result}  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure degrades to a redirect: back to Configure when state is
//! missing or the setup is invalid, back to Display when an answer page is
//! loaded without a submission.

pub mod abacus;
pub mod batch;
pub mod config;
pub mod error;
pub mod form;
pub mod generator;
pub mod outcome;
pub mod ranges;
pub mod rules;
pub mod session;
pub mod setup;
pub mod store;
pub mod two_operand;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Re-export commonly used types
pub use abacus::{AbacusCard, BeadPattern, Sign};
pub use config::{EngineConfig, GeneratorLimits, MAX_ATTEMPTS_PER_POSITION, MAX_RESTARTS};
pub use error::{SetupError, StageError};
pub use form::{Action, FormParams};
pub use generator::{ConstrainedGenerator, DigitSpec, DigitWidth, GeneratedSequence};
pub use outcome::{Outcome, View};
pub use ranges::{OperandPool, RANGES};
pub use rules::{complement_pair, Operator, TwoOperandGame};
pub use session::{parse_answer, AnswerRecord, GameKind, GameSession, Stage};
pub use setup::{BatchSetup, Difficulty, GameSetup, TrickWidth};
pub use store::{
    load_preference, load_session, save_session, session_key, MemoryPreferenceStore,
    MemorySessionStore, PreferenceStore, SessionStore, UserId,
};

/// Answer field name; some forms post it with an underscore.
pub const FIELD_ANSWER: &str = "user-answer";
const FIELD_ANSWER_ALT: &str = "user_answer";

/// Runs stage transitions against externally provided storage.
#[derive(Debug)]
pub struct GameEngine<P = MemoryPreferenceStore, R = StdRng> {
    pub preferences: P,
    config: EngineConfig,
    rng: R,
}

impl GameEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_parts(MemoryPreferenceStore::new(), config, StdRng::from_entropy())
    }

    /// Deterministic engine for reproducible rounds.
    pub fn seeded(seed: u64) -> Self {
        Self::with_parts(
            MemoryPreferenceStore::new(),
            EngineConfig::default(),
            StdRng::seed_from_u64(seed),
        )
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PreferenceStore, R: Rng> GameEngine<P, R> {
    pub fn with_parts(preferences: P, config: EngineConfig, rng: R) -> Self {
        Self {
            preferences,
            config,
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Entry point for every game: run `stage` of `kind` for this request.
    ///
    /// `user` is the signed-in player, if any; only they get preferences.
    pub fn handle(
        &mut self,
        store: &mut dyn SessionStore,
        user: Option<UserId>,
        kind: GameKind,
        stage: Stage,
        action: &Action,
    ) -> Outcome {
        tracing::debug!(%kind, %stage, submit = action.form().is_some(), "handling stage");

        let result = if !stage.is_part_of(kind) {
            Err(StageError::UnsupportedStage { kind, stage })
        } else if stage == Stage::Configure {
            self.configure(store, user, kind, action)
        } else if kind.is_batch() {
            self.batch_stage(store, kind, stage, action)
        } else {
            self.two_operand_stage(store, kind, stage, action)
        };

        result.unwrap_or_else(|err| {
            let stage = err.fallback_stage();
            tracing::debug!(%kind, %stage, reason = %err, "redirecting");
            Outcome::Redirect { kind, stage }
        })
    }

    fn configure(
        &mut self,
        store: &mut dyn SessionStore,
        user: Option<UserId>,
        kind: GameKind,
        action: &Action,
    ) -> Result<Outcome, StageError> {
        let Some(form) = action.form() else {
            return Ok(Outcome::Render {
                kind,
                stage: Stage::Configure,
                view: View::ConfigureForm {
                    defaults: self.configure_defaults(store, user, kind),
                },
            });
        };

        let setup = GameSetup::from_form(kind, form, self.config.max_operand_count)?;
        let session = if kind.is_batch() {
            batch::configure(setup.clone(), self.config.generator, &mut self.rng)?
        } else {
            two_operand::configure(setup.clone(), &mut self.rng)?
        };
        save_session(store, &session);

        if let Some(user) = user {
            self.preferences.save(user, kind, setup.to_json());
        }

        Ok(Outcome::Redirect {
            kind,
            stage: Stage::Display,
        })
    }

    /// Saved preference, then the session in progress, then built-in defaults.
    fn configure_defaults(
        &self,
        store: &dyn SessionStore,
        user: Option<UserId>,
        kind: GameKind,
    ) -> GameSetup {
        user.and_then(|user| load_preference(&self.preferences, user, kind))
            .or_else(|| load_session(store, kind).map(|s| s.setup))
            .unwrap_or_else(|| GameSetup::default_for(kind))
    }

    fn two_operand_stage(
        &mut self,
        store: &mut dyn SessionStore,
        kind: GameKind,
        stage: Stage,
        action: &Action,
    ) -> Result<Outcome, StageError> {
        let session = load_session(store, kind);
        match stage {
            Stage::Display => {
                let view = two_operand::display(kind, session.as_ref())?;
                Ok(Outcome::Render { kind, stage, view })
            }
            Stage::Answer => {
                // The answer page is never rendered without a submission.
                let form = action.form().ok_or(StageError::NoSubmission)?;
                let (session, view) =
                    two_operand::answer(kind, session, submitted_answer(form), &mut self.rng)?;
                save_session(store, &session);
                Ok(Outcome::Render { kind, stage, view })
            }
            _ => Err(StageError::UnsupportedStage { kind, stage }),
        }
    }

    fn batch_stage(
        &mut self,
        store: &mut dyn SessionStore,
        kind: GameKind,
        stage: Stage,
        action: &Action,
    ) -> Result<Outcome, StageError> {
        let session = load_session(store, kind);
        match (stage, action.form()) {
            (Stage::Display, _) => batch::display(kind, session.as_ref()),
            (Stage::Advance, _) => {
                let (session, outcome) = batch::advance(kind, session)?;
                save_session(store, &session);
                Ok(outcome)
            }
            (Stage::Answer, None) => {
                let view = batch::answer_form(kind, session.as_ref())?;
                Ok(Outcome::Render { kind, stage, view })
            }
            (Stage::Answer, Some(form)) => {
                let (session, view) = batch::answer(kind, session, submitted_answer(form))?;
                save_session(store, &session);
                Ok(Outcome::Render { kind, stage, view })
            }
            (Stage::Result, None) => {
                let view = batch::result(kind, session.as_ref())?;
                Ok(Outcome::Render { kind, stage, view })
            }
            (Stage::Result, Some(_)) => {
                // Play again with the same setup
                let session =
                    batch::next_round(kind, session, self.config.generator, &mut self.rng)?;
                save_session(store, &session);
                Ok(Outcome::Redirect {
                    kind,
                    stage: Stage::Display,
                })
            }
            (Stage::Configure, _) => Err(StageError::UnsupportedStage { kind, stage }),
        }
    }
}

fn submitted_answer(form: &FormParams) -> Option<&str> {
    form.get(FIELD_ANSWER).or_else(|| form.get(FIELD_ANSWER_ALT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::setup::{
        FIELD_EXAMPLES, FIELD_FIRST_MULTIPLIER, FIELD_MAX_DIGIT, FIELD_NUMBER_RANGES,
        FIELD_NUMBER_TYPE, FIELD_RANGE, FIELD_SECOND_MULTIPLIER,
    };
    use pretty_assertions::assert_eq;

    fn submit(pairs: &[(&str, &str)]) -> Action {
        Action::Submit(pairs.iter().copied().collect())
    }

    fn answer(value: i64) -> Action {
        submit(&[(FIELD_ANSWER, value.to_string().as_str())])
    }

    fn problem(outcome: &Outcome) -> Vec<i64> {
        match outcome.view() {
            Some(View::Problem { operands, .. }) => operands.clone(),
            other => panic!("expected a problem, got {:?}", other),
        }
    }

    fn verdict(outcome: &Outcome) -> &AnswerRecord {
        match outcome.view() {
            Some(View::Verdict { record, .. }) => record,
            other => panic!("expected a verdict, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario_a_multiply_single_digits() {
        let mut engine = GameEngine::seeded(1);
        let mut store = MemorySessionStore::new();

        let outcome = engine.handle(
            &mut store,
            None,
            GameKind::Multiply,
            Stage::Configure,
            &submit(&[(FIELD_FIRST_MULTIPLIER, "1-9"), (FIELD_SECOND_MULTIPLIER, "1-9")]),
        );
        assert_eq!(
            outcome,
            Outcome::Redirect {
                kind: GameKind::Multiply,
                stage: Stage::Display
            }
        );

        let shown = engine.handle(&mut store, None, GameKind::Multiply, Stage::Display, &Action::View);
        let operands = problem(&shown);
        assert_eq!(operands.len(), 2);
        for op in &operands {
            assert!((1..=9).contains(&op.abs()));
        }

        let checked = engine.handle(
            &mut store,
            None,
            GameKind::Multiply,
            Stage::Answer,
            &answer(operands[0] * operands[1]),
        );
        assert!(verdict(&checked).correct);
    }

    #[test]
    fn test_scenario_b_simple_sum() {
        let mut engine = GameEngine::seeded(2);
        let mut store = MemorySessionStore::new();

        let outcome = engine.handle(
            &mut store,
            None,
            GameKind::SimpleSum,
            Stage::Configure,
            &submit(&[(FIELD_EXAMPLES, "5"), (FIELD_MAX_DIGIT, "3"), (FIELD_RANGE, "2")]),
        );
        assert_eq!(outcome.stage(), Stage::Display);

        // Walk through every item the way the client does
        let mut shown = Vec::new();
        loop {
            match engine.handle(&mut store, None, GameKind::SimpleSum, Stage::Display, &Action::View) {
                Outcome::Render {
                    view: View::Item { value, .. },
                    ..
                } => shown.push(value),
                Outcome::Redirect { stage, .. } => {
                    assert_eq!(stage, Stage::Answer);
                    break;
                }
                other => panic!("unexpected outcome {:?}", other),
            }
            engine.handle(&mut store, None, GameKind::SimpleSum, Stage::Advance, &Action::View);
        }

        assert_eq!(shown.len(), 5);
        let mut running = 0;
        for term in &shown {
            running += term;
            assert!((0..=33).contains(&running), "prefix {} in {:?}", running, shown);
        }
        assert!((0..=33).contains(&running));

        let form = engine.handle(&mut store, None, GameKind::SimpleSum, Stage::Answer, &Action::View);
        assert_eq!(form.view(), Some(&View::AnswerForm { total_items: 5 }));

        let checked = engine.handle(&mut store, None, GameKind::SimpleSum, Stage::Answer, &answer(running));
        assert!(verdict(&checked).correct);
        assert_eq!(verdict(&checked).correct_value, running);
    }

    #[test]
    fn test_scenario_c_square_without_ranges() {
        let mut engine = GameEngine::seeded(3);
        let mut store = MemorySessionStore::new();

        let outcome = engine.handle(&mut store, None, GameKind::Square, Stage::Configure, &submit(&[]));
        assert_eq!(
            outcome,
            Outcome::Redirect {
                kind: GameKind::Square,
                stage: Stage::Configure
            }
        );
        assert!(!store.contains(&session_key(GameKind::Square)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_scenario_d_tricks_two_digit() {
        let mut engine = GameEngine::seeded(4);
        let mut store = MemorySessionStore::new();

        engine.handle(
            &mut store,
            None,
            GameKind::Tricks,
            Stage::Configure,
            &submit(&[(FIELD_NUMBER_TYPE, "2")]),
        );
        let operands = problem(&engine.handle(&mut store, None, GameKind::Tricks, Stage::Display, &Action::View));
        assert_eq!(operands[0].abs() % 10 + operands[1].abs() % 10, 10);
        assert_eq!(operands[0].abs() / 10, operands[1].abs() / 10);
    }

    #[test]
    fn test_scenario_e_bead_pattern() {
        let pattern = BeadPattern::for_digit(7).unwrap();
        assert_eq!(pattern.upper, [false, true]);
        assert_eq!(pattern.lower, [true, true, false, true, true]);
    }

    #[test]
    fn test_missing_session_redirects_to_configure() {
        let mut engine = GameEngine::seeded(5);
        let mut store = MemorySessionStore::new();

        for kind in GameKind::ALL {
            for stage in [Stage::Display, Stage::Answer] {
                let outcome = engine.handle(&mut store, None, kind, stage, &answer(1));
                assert_eq!(
                    outcome,
                    Outcome::Redirect {
                        kind,
                        stage: Stage::Configure
                    },
                    "{} {}",
                    kind,
                    stage
                );
            }
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_display_is_idempotent() {
        let mut engine = GameEngine::seeded(6);
        let mut store = MemorySessionStore::new();
        engine.handle(
            &mut store,
            None,
            GameKind::MultiplyFromBase,
            Stage::Configure,
            &submit(&[(setup::FIELD_MULTIPLIER_RANGE, "80-120")]),
        );
        let configured = load_session(&store, GameKind::MultiplyFromBase).unwrap();

        let a = engine.handle(&mut store, None, GameKind::MultiplyFromBase, Stage::Display, &Action::View);
        let b = engine.handle(&mut store, None, GameKind::MultiplyFromBase, Stage::Display, &Action::View);
        assert_eq!(a, b);
        assert_eq!(problem(&a), configured.operands);
    }

    #[test]
    fn test_answer_round_trip_regenerates() {
        let mut engine = GameEngine::seeded(7);
        let mut store = MemorySessionStore::new();
        engine.handle(
            &mut store,
            None,
            GameKind::MultiplyTo20,
            Stage::Configure,
            &submit(&[(FIELD_FIRST_MULTIPLIER, "10-19"), (FIELD_SECOND_MULTIPLIER, "13")]),
        );

        for _ in 0..20 {
            let before = load_session(&store, GameKind::MultiplyTo20).unwrap();
            let checked = engine.handle(
                &mut store,
                None,
                GameKind::MultiplyTo20,
                Stage::Answer,
                &answer(before.target_value),
            );
            assert!(verdict(&checked).correct);

            let after = load_session(&store, GameKind::MultiplyTo20).unwrap();
            assert_eq!(after.operands[1].abs(), 13);
            assert!((10..=18).contains(&after.operands[0].abs()));
            assert_eq!(after.target_value, after.operands[0] * after.operands[1]);
        }
    }

    #[test]
    fn test_wrong_answer_keeps_state() {
        let mut engine = GameEngine::seeded(8);
        let mut store = MemorySessionStore::new();
        engine.handle(
            &mut store,
            None,
            GameKind::Square,
            Stage::Configure,
            &submit(&[(FIELD_NUMBER_RANGES, "1-9"), (FIELD_NUMBER_RANGES, "10-99")]),
        );
        let before = load_session(&store, GameKind::Square).unwrap();

        let checked = engine.handle(
            &mut store,
            None,
            GameKind::Square,
            Stage::Answer,
            &submit(&[("user_answer", "abc")]),
        );
        assert!(!verdict(&checked).correct);
        assert_eq!(verdict(&checked).submitted, "abc");
        assert_eq!(load_session(&store, GameKind::Square).unwrap().operands, before.operands);
    }

    #[test]
    fn test_answer_without_submission_goes_back_to_display() {
        let mut engine = GameEngine::seeded(9);
        let mut store = MemorySessionStore::new();
        engine.handle(
            &mut store,
            None,
            GameKind::Tricks,
            Stage::Configure,
            &submit(&[(FIELD_NUMBER_TYPE, "3")]),
        );
        let outcome = engine.handle(&mut store, None, GameKind::Tricks, Stage::Answer, &Action::View);
        assert_eq!(
            outcome,
            Outcome::Redirect {
                kind: GameKind::Tricks,
                stage: Stage::Display
            }
        );
    }

    #[test]
    fn test_unsupported_stage_redirects() {
        let mut engine = GameEngine::seeded(10);
        let mut store = MemorySessionStore::new();
        let outcome = engine.handle(&mut store, None, GameKind::Multiply, Stage::Advance, &Action::View);
        assert_eq!(outcome.stage(), Stage::Configure);
        assert!(outcome.is_redirect());
    }

    #[test]
    fn test_preferences_saved_and_prefilled() {
        let mut engine = GameEngine::seeded(11);
        let mut store = MemorySessionStore::new();

        // Built-in defaults for a fresh player
        let form = engine.handle(&mut store, Some(42), GameKind::SimpleSum, Stage::Configure, &Action::View);
        assert_eq!(
            form.view(),
            Some(&View::ConfigureForm {
                defaults: GameSetup::default_for(GameKind::SimpleSum)
            })
        );

        engine.handle(
            &mut store,
            Some(42),
            GameKind::SimpleSum,
            Stage::Configure,
            &submit(&[(FIELD_EXAMPLES, "7"), (FIELD_MAX_DIGIT, "5"), (FIELD_RANGE, "1")]),
        );
        let saved = load_preference(&engine.preferences, 42, GameKind::SimpleSum).unwrap();
        assert_eq!(
            saved,
            GameSetup::SimpleSum(BatchSetup {
                width: DigitWidth::One,
                digit_cap: 5,
                operand_count: 7,
                display_speed: 1.0,
            })
        );

        // A new browser session still sees the saved preference
        let mut fresh = MemorySessionStore::new();
        let form = engine.handle(&mut fresh, Some(42), GameKind::SimpleSum, Stage::Configure, &Action::View);
        assert_eq!(form.view(), Some(&View::ConfigureForm { defaults: saved }));

        // Anonymous players get nothing saved, but the session setup pre-fills
        let mut anon = MemorySessionStore::new();
        engine.handle(
            &mut anon,
            None,
            GameKind::Tricks,
            Stage::Configure,
            &submit(&[(FIELD_NUMBER_TYPE, "3")]),
        );
        assert!(engine.preferences.record(42, GameKind::Tricks).is_none());
        let form = engine.handle(&mut anon, None, GameKind::Tricks, Stage::Configure, &Action::View);
        assert_eq!(
            form.view(),
            Some(&View::ConfigureForm {
                defaults: GameSetup::Tricks {
                    width: TrickWidth::Three
                }
            })
        );
    }

    #[test]
    fn test_invalid_batch_setup_redirects() {
        let mut engine = GameEngine::seeded(12);
        let mut store = MemorySessionStore::new();
        let outcome = engine.handle(
            &mut store,
            Some(1),
            GameKind::SimpleSum,
            Stage::Configure,
            &submit(&[(FIELD_MAX_DIGIT, "0")]),
        );
        assert_eq!(outcome.stage(), Stage::Configure);
        assert!(store.is_empty());
        assert_eq!(engine.preferences.count(), 0);
    }

    #[test]
    fn test_flashcards_round_and_replay() {
        let mut engine = GameEngine::seeded(13);
        let mut store = MemorySessionStore::new();
        engine.handle(
            &mut store,
            None,
            GameKind::Flashcards,
            Stage::Configure,
            &submit(&[("difficulty", "easy"), ("card_count", "4")]),
        );

        let shown = engine.handle(&mut store, None, GameKind::Flashcards, Stage::Display, &Action::View);
        match shown.view() {
            Some(View::Item {
                value,
                abacus: Some(card),
                total,
                ..
            }) => {
                assert_eq!(card.value(), *value);
                assert_eq!(*total, 4);
            }
            other => panic!("unexpected view {:?}", other),
        }

        let session = load_session(&store, GameKind::Flashcards).unwrap();
        let checked = engine.handle(
            &mut store,
            None,
            GameKind::Flashcards,
            Stage::Answer,
            &answer(session.target_value),
        );
        assert!(verdict(&checked).correct);

        let result = engine.handle(&mut store, None, GameKind::Flashcards, Stage::Result, &Action::View);
        assert_eq!(result.view(), checked.view());

        let replay = engine.handle(
            &mut store,
            None,
            GameKind::Flashcards,
            Stage::Result,
            &Action::Submit(FormParams::new()),
        );
        assert_eq!(replay.stage(), Stage::Display);
        let next = load_session(&store, GameKind::Flashcards).unwrap();
        assert_eq!(next.cursor, 0);
        assert_eq!(next.rounds_played, 1);
        assert_eq!(next.operands.len(), 4);
    }

    #[test]
    fn test_batch_verdict_cannot_be_resubmitted() {
        let mut engine = GameEngine::seeded(15);
        let mut store = MemorySessionStore::new();
        engine.handle(
            &mut store,
            None,
            GameKind::SimpleSum,
            Stage::Configure,
            &submit(&[(FIELD_EXAMPLES, "5"), (FIELD_MAX_DIGIT, "3"), (FIELD_RANGE, "2")]),
        );

        let first = engine.handle(&mut store, None, GameKind::SimpleSum, Stage::Answer, &answer(-999));
        let revealed = verdict(&first).correct_value;
        for _ in 0..3 {
            let again = engine.handle(&mut store, None, GameKind::SimpleSum, Stage::Answer, &answer(revealed));
            assert!(!verdict(&again).correct);
        }

        let redirect = engine.handle(&mut store, None, GameKind::SimpleSum, Stage::Advance, &Action::View);
        assert_eq!(redirect.stage(), Stage::Result);

        let session = load_session(&store, GameKind::SimpleSum).unwrap();
        assert_eq!(session.stage, Stage::Result);
        assert_eq!((session.rounds_played, session.rounds_correct), (1, 0));
    }

    #[test]
    fn test_malformed_stored_session_redirects() {
        let mut engine = GameEngine::seeded(14);
        let mut store = MemorySessionStore::new();
        store.set(&session_key(GameKind::Multiply), serde_json::json!({"first": 3, "second": 4}));

        let outcome = engine.handle(&mut store, None, GameKind::Multiply, Stage::Display, &Action::View);
        assert_eq!(outcome.stage(), Stage::Configure);
    }
}
