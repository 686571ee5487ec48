//! Per-game configuration and its form parsing.
//!
//! A [`GameSetup`] is what a player picks on the Configure stage. It is
//! stored in the session (to regenerate problems) and, for signed-in
//! players, as their saved preference for that game.

use serde::{Deserialize, Serialize};

use super::error::SetupError;
use super::form::FormParams;
use super::generator::{DigitSpec, DigitWidth};
use super::session::GameKind;

pub const FIELD_FIRST_MULTIPLIER: &str = "first-multiplier";
pub const FIELD_SECOND_MULTIPLIER: &str = "second-multiplier";
pub const FIELD_NUMBER_RANGES: &str = "number-ranges";
pub const FIELD_MULTIPLIER_RANGE: &str = "multiplier-range";
pub const FIELD_NUMBER_TYPE: &str = "number-type";
pub const FIELD_RANGE: &str = "range";
pub const FIELD_EXAMPLES: &str = "examples";
pub const FIELD_SPEED: &str = "speed";
pub const FIELD_MAX_DIGIT: &str = "max_digit";
pub const FIELD_DIFFICULTY: &str = "difficulty";
pub const FIELD_CARD_COUNT: &str = "card_count";
pub const FIELD_DISPLAY_TIME: &str = "display_time";

/// Largest fixed factor accepted by multiply-to-20.
pub const MAX_FIXED_FACTOR: i64 = 20;

const DEFAULT_OPERAND_COUNT: usize = 10;
const DEFAULT_DIGIT_CAP: u8 = 9;
const DEFAULT_SPEED: f64 = 1.0;
const DEFAULT_CARD_SECONDS: f64 = 3.0;

/// Digit width of a complement-trick pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrickWidth {
    Two,
    Three,
}

impl TrickWidth {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "2" => Some(Self::Two),
            "3" => Some(Self::Three),
            _ => None,
        }
    }
}

/// Flashcard difficulty, mapped onto a digit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Unknown labels read as medium.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }

    pub fn width(&self) -> DigitWidth {
        match self {
            Self::Easy => DigitWidth::One,
            Self::Medium => DigitWidth::Two,
            Self::Hard => DigitWidth::Three,
        }
    }

}

/// Settings of a batch (simple sum or flashcards) game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchSetup {
    pub width: DigitWidth,
    pub digit_cap: u8,
    pub operand_count: usize,
    /// Seconds each item stays on screen.
    pub display_speed: f64,
}

impl BatchSetup {
    pub fn digit_spec(&self) -> Result<DigitSpec, SetupError> {
        DigitSpec::new(self.width, self.digit_cap)
    }

    fn validate(self, max_operand_count: usize) -> Result<Self, SetupError> {
        self.digit_spec()?;
        if self.operand_count == 0 || self.operand_count > max_operand_count {
            return Err(SetupError::invalid(
                FIELD_EXAMPLES,
                self.operand_count.to_string(),
            ));
        }
        if !self.display_speed.is_finite() || self.display_speed <= 0.0 {
            return Err(SetupError::invalid(
                FIELD_SPEED,
                self.display_speed.to_string(),
            ));
        }
        Ok(self)
    }
}

impl Default for BatchSetup {
    fn default() -> Self {
        Self {
            width: DigitWidth::Two,
            digit_cap: DEFAULT_DIGIT_CAP,
            operand_count: DEFAULT_OPERAND_COUNT,
            display_speed: DEFAULT_SPEED,
        }
    }
}

/// What a player chose on the Configure stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameSetup {
    Multiply { first_range: String, second_range: String },
    MultiplyTo20 { first_range: String, factor: i64 },
    Square { ranges: Vec<String> },
    MultiplyFromBase { ranges: Vec<String> },
    Tricks { width: TrickWidth },
    SimpleSum(BatchSetup),
    Flashcards(BatchSetup),
}

impl GameSetup {
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Multiply { .. } => GameKind::Multiply,
            Self::MultiplyTo20 { .. } => GameKind::MultiplyTo20,
            Self::Square { .. } => GameKind::Square,
            Self::MultiplyFromBase { .. } => GameKind::MultiplyFromBase,
            Self::Tricks { .. } => GameKind::Tricks,
            Self::SimpleSum(_) => GameKind::SimpleSum,
            Self::Flashcards(_) => GameKind::Flashcards,
        }
    }

    /// Pre-filled form values when nothing is saved.
    pub fn default_for(kind: GameKind) -> Self {
        match kind {
            GameKind::Multiply => Self::Multiply {
                first_range: "1-9".to_string(),
                second_range: "1-9".to_string(),
            },
            GameKind::MultiplyTo20 => Self::MultiplyTo20 {
                first_range: "1-9".to_string(),
                factor: 11,
            },
            GameKind::Square => Self::Square {
                ranges: vec!["10-99".to_string()],
            },
            GameKind::MultiplyFromBase => Self::MultiplyFromBase {
                ranges: vec!["80-120".to_string()],
            },
            GameKind::Tricks => Self::Tricks {
                width: TrickWidth::Two,
            },
            GameKind::SimpleSum => Self::SimpleSum(BatchSetup::default()),
            GameKind::Flashcards => Self::Flashcards(BatchSetup {
                width: Difficulty::Easy.width(),
                display_speed: DEFAULT_CARD_SECONDS,
                ..BatchSetup::default()
            }),
        }
    }

    pub fn batch(&self) -> Option<&BatchSetup> {
        match self {
            Self::SimpleSum(batch) | Self::Flashcards(batch) => Some(batch),
            _ => None,
        }
    }

    /// Parse a Configure submission for `kind`.
    ///
    /// Pool emptiness is not checked here; see [`TwoOperandGame`](super::rules::TwoOperandGame).
    pub fn from_form(
        kind: GameKind,
        form: &FormParams,
        max_operand_count: usize,
    ) -> Result<Self, SetupError> {
        match kind {
            GameKind::Multiply => Ok(Self::Multiply {
                first_range: required(form, FIELD_FIRST_MULTIPLIER)?.to_string(),
                second_range: required(form, FIELD_SECOND_MULTIPLIER)?.to_string(),
            }),
            GameKind::MultiplyTo20 => {
                let raw = required(form, FIELD_SECOND_MULTIPLIER)?;
                let factor = raw
                    .parse::<i64>()
                    .ok()
                    .filter(|f| (1..=MAX_FIXED_FACTOR).contains(f))
                    .ok_or_else(|| SetupError::invalid(FIELD_SECOND_MULTIPLIER, raw))?;
                Ok(Self::MultiplyTo20 {
                    first_range: required(form, FIELD_FIRST_MULTIPLIER)?.to_string(),
                    factor,
                })
            }
            GameKind::Square => Ok(Self::Square {
                ranges: form.get_all(FIELD_NUMBER_RANGES).to_vec(),
            }),
            GameKind::MultiplyFromBase => Ok(Self::MultiplyFromBase {
                ranges: form.get_all(FIELD_MULTIPLIER_RANGE).to_vec(),
            }),
            GameKind::Tricks => {
                let raw = required(form, FIELD_NUMBER_TYPE)?;
                let width = TrickWidth::parse(raw)
                    .ok_or_else(|| SetupError::invalid(FIELD_NUMBER_TYPE, raw))?;
                Ok(Self::Tricks { width })
            }
            GameKind::SimpleSum => {
                let defaults = BatchSetup::default();
                let batch = BatchSetup {
                    width: DigitWidth::from_range_key(optional(
                        form,
                        FIELD_RANGE,
                        defaults.width.range_key() as i64,
                    )?),
                    digit_cap: optional(form, FIELD_MAX_DIGIT, defaults.digit_cap)?,
                    operand_count: optional(form, FIELD_EXAMPLES, defaults.operand_count)?,
                    display_speed: optional(form, FIELD_SPEED, defaults.display_speed)?,
                };
                Ok(Self::SimpleSum(batch.validate(max_operand_count)?))
            }
            GameKind::Flashcards => {
                let difficulty = form
                    .get_trimmed(FIELD_DIFFICULTY)
                    .map(Difficulty::parse)
                    .unwrap_or(Difficulty::Easy);
                let batch = BatchSetup {
                    width: difficulty.width(),
                    digit_cap: optional(form, FIELD_MAX_DIGIT, DEFAULT_DIGIT_CAP)?,
                    operand_count: optional(form, FIELD_CARD_COUNT, DEFAULT_OPERAND_COUNT)?,
                    display_speed: optional(form, FIELD_DISPLAY_TIME, DEFAULT_CARD_SECONDS)?,
                };
                Ok(Self::Flashcards(batch.validate(max_operand_count)?))
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Parse stored JSON, insisting on the expected kind.
    pub fn from_json(value: serde_json::Value, kind: GameKind) -> Result<Self, SetupError> {
        let setup: Self = serde_json::from_value(value)
            .map_err(|e| SetupError::invalid("setup", e.to_string()))?;
        if setup.kind() != kind {
            return Err(SetupError::KindMismatch {
                expected: kind,
                found: setup.kind(),
            });
        }
        Ok(setup)
    }
}

fn required<'a>(form: &'a FormParams, field: &'static str) -> Result<&'a str, SetupError> {
    form.get_trimmed(field)
        .ok_or(SetupError::MissingField(field))
}

/// Blank or missing fields take `default`; anything unparseable is invalid.
fn optional<T: std::str::FromStr>(
    form: &FormParams,
    field: &'static str,
    default: T,
) -> Result<T, SetupError> {
    match form.get_trimmed(field) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| SetupError::invalid(field, raw)),
    }
}
