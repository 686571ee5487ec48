//! Session records for a single game in progress.
//!
//! A [`GameSession`] is the only state carried between requests. It is read
//! from the session store at the start of a transition and written back at
//! the end; the transition itself never touches storage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::setup::GameSetup;

/// The mini-games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Multiply,
    MultiplyTo20,
    Square,
    MultiplyFromBase,
    Tricks,
    SimpleSum,
    Flashcards,
}

impl GameKind {
    pub const ALL: [GameKind; 7] = [
        Self::Multiply,
        Self::MultiplyTo20,
        Self::Square,
        Self::MultiplyFromBase,
        Self::Tricks,
        Self::SimpleSum,
        Self::Flashcards,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multiply => "multiply",
            Self::MultiplyTo20 => "multiply_to_20",
            Self::Square => "square",
            Self::MultiplyFromBase => "multiply_from_base",
            Self::Tricks => "tricks",
            Self::SimpleSum => "simple_sum",
            Self::Flashcards => "flashcards",
        }
    }

    /// Batch games show a whole generated sequence before asking for one answer.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::SimpleSum | Self::Flashcards)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown game kind `{}`", s))
    }
}

/// Stage of a game's interaction loop.
///
/// ```text
/// two-operand:  Configure ──▶ Display ──▶ Answer ─┐
///                   ▲            ▲                │
///                   │            └────────────────┘
///                   └── missing state / invalid setup
///
/// batch:        Configure ──▶ Display ⇄ Advance ──▶ Answer ──▶ Result
///                                ▲                               │
///                                └────────── next round ─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Configure,
    Display,
    Advance,
    Answer,
    Result,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Display => "display",
            Self::Advance => "advance",
            Self::Answer => "answer",
            Self::Result => "result",
        }
    }

    /// Whether the stage belongs to games of `kind`.
    pub fn is_part_of(&self, kind: GameKind) -> bool {
        match self {
            Self::Configure | Self::Display | Self::Answer => true,
            Self::Advance | Self::Result => kind.is_batch(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "configure" => Ok(Self::Configure),
            "display" => Ok(Self::Display),
            "advance" => Ok(Self::Advance),
            "answer" => Ok(Self::Answer),
            "result" => Ok(Self::Result),
            _ => Err(format!("unknown stage `{}`", s)),
        }
    }
}

/// Parse a submitted answer. Anything but an integer is `None`.
pub fn parse_answer(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Outcome of checking one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Raw submission, as typed.
    pub submitted: String,
    pub correct_value: i64,
    pub correct: bool,
    /// The problem written out, e.g. `7 × -8` or `+12-5+31`.
    pub expression: String,
}

impl AnswerRecord {
    pub fn check(submitted: Option<&str>, correct_value: i64, expression: String) -> Self {
        let correct = parse_answer(submitted) == Some(correct_value);
        Self {
            submitted: submitted.unwrap_or_default().to_string(),
            correct_value,
            correct,
            expression,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "user_answer": self.submitted,
            "correct_answer": self.correct_value,
            "is_correct": self.correct,
            "expression": self.expression
        })
    }
}

/// Signed-term chain like `+12-5+31`.
pub fn sum_expression(terms: &[i64]) -> String {
    terms.iter().map(|t| format!("{:+}", t)).collect()
}

/// Persisted state of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub kind: GameKind,
    pub stage: Stage,
    pub setup: GameSetup,
    /// Current problem: two factors, one base, or a whole batch.
    pub operands: Vec<i64>,
    /// Expected answer for `operands`.
    pub target_value: i64,
    /// Next batch item to show.
    pub cursor: usize,
    pub rounds_played: u32,
    pub rounds_correct: u32,
    pub last_result: Option<AnswerRecord>,
    pub configured_at: DateTime<Utc>,
}

impl GameSession {
    /// Fresh session at the Display stage.
    pub fn new(setup: GameSetup, operands: Vec<i64>, target_value: i64) -> Self {
        Self {
            kind: setup.kind(),
            stage: Stage::Display,
            setup,
            operands,
            target_value,
            cursor: 0,
            rounds_played: 0,
            rounds_correct: 0,
            last_result: None,
            configured_at: Utc::now(),
        }
    }

    /// Replace the problem, keeping setup and tallies.
    pub fn next_round(&mut self, operands: Vec<i64>, target_value: i64) {
        self.operands = operands;
        self.target_value = target_value;
        self.cursor = 0;
        self.stage = Stage::Display;
    }

    pub fn record(&mut self, result: AnswerRecord) {
        self.rounds_played += 1;
        if result.correct {
            self.rounds_correct += 1;
        }
        self.stage = Stage::Answer;
        self.last_result = Some(result);
    }

    /// The batch item under the cursor, if any remain.
    pub fn current_item(&self) -> Option<i64> {
        self.operands.get(self.cursor).copied()
    }

    pub fn items_exhausted(&self) -> bool {
        self.cursor >= self.operands.len()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Rebuild from stored JSON; `None` if the shape is wrong.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}
