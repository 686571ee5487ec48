//! Error types for stage transitions.
//!
//! None of these are fatal. The engine turns every [`StageError`] into a
//! redirect to the stage that can rebuild the missing state.

use thiserror::Error;

use super::session::{GameKind, Stage};

/// A configuration submission that cannot start a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has invalid value `{value}`")]
    InvalidValue { field: &'static str, value: String },

    #[error("no operands available for ranges {0:?}")]
    EmptyPool(Vec<String>),

    #[error("{found} setup cannot drive a {expected} game")]
    KindMismatch { expected: GameKind, found: GameKind },
}

impl SetupError {
    pub(crate) fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

/// Why a stage could not be entered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("no {0} session in progress")]
    MissingSession(GameKind),

    #[error("stage {stage} is not part of {kind}")]
    UnsupportedStage { kind: GameKind, stage: Stage },

    #[error("answer stage needs a submission")]
    NoSubmission,

    #[error(transparent)]
    Setup(#[from] SetupError),
}

impl StageError {
    /// The stage the player is sent back to.
    pub fn fallback_stage(&self) -> Stage {
        match self {
            Self::NoSubmission => Stage::Display,
            _ => Stage::Configure,
        }
    }
}
