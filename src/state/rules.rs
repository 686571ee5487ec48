//! Problem generation and scoring for the two-operand games.
//!
//! Every two-operand game runs the same loop; only the way operands are drawn
//! and the way the answer is computed differ. [`TwoOperandGame`] bundles those
//! two choices, built once from a validated [`GameSetup`].

use rand::Rng;

use super::error::SetupError;
use super::ranges::OperandPool;
use super::session::GameKind;
use super::setup::{GameSetup, TrickWidth};

/// How the expected answer is computed from the operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Multiply,
    Square,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Multiply => "×",
            Self::Square => "²",
        }
    }

    pub fn apply(&self, operands: &[i64]) -> i64 {
        match self {
            Self::Multiply => operands.iter().product(),
            Self::Square => operands.first().map_or(0, |n| n * n),
        }
    }

    /// Written-out problem, e.g. `-7 × 8` or `12²`.
    pub fn expression(&self, operands: &[i64]) -> String {
        match self {
            Self::Multiply => operands
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(" × "),
            Self::Square => operands
                .first()
                .map(|n| format!("{}²", n))
                .unwrap_or_default(),
        }
    }
}

/// Where operands come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandSource {
    /// One draw from each pool.
    Independent { first: OperandPool, second: OperandPool },
    /// One draw from the pool times a fixed factor.
    FixedFactor { first: OperandPool, factor: i64 },
    /// Two draws from the same pool.
    Shared(OperandPool),
    /// A single unsigned draw.
    Single(OperandPool),
    /// Same leading digits, unit digits summing to ten.
    ComplementPair(TrickWidth),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoOperandGame {
    source: OperandSource,
    operator: Operator,
}

impl TwoOperandGame {
    /// Build the game for a setup. Fails when a selected pool has no values.
    pub fn from_setup(setup: &GameSetup) -> Result<Self, SetupError> {
        let (source, operator) = match setup {
            GameSetup::Multiply {
                first_range,
                second_range,
            } => {
                let first = non_empty(&[first_range.as_str()])?;
                let second = non_empty(&[second_range.as_str()])?;
                (OperandSource::Independent { first, second }, Operator::Multiply)
            }
            GameSetup::MultiplyTo20 {
                first_range,
                factor,
            } => {
                let first = non_empty(&[first_range.as_str()])?;
                (
                    OperandSource::FixedFactor {
                        first,
                        factor: *factor,
                    },
                    Operator::Multiply,
                )
            }
            GameSetup::Square { ranges } => {
                (OperandSource::Single(non_empty(ranges)?), Operator::Square)
            }
            GameSetup::MultiplyFromBase { ranges } => {
                (OperandSource::Shared(non_empty(ranges)?), Operator::Multiply)
            }
            GameSetup::Tricks { width } => {
                (OperandSource::ComplementPair(*width), Operator::Multiply)
            }
            GameSetup::SimpleSum(_) | GameSetup::Flashcards(_) => {
                return Err(SetupError::KindMismatch {
                    expected: GameKind::Multiply,
                    found: setup.kind(),
                })
            }
        };
        Ok(Self { source, operator })
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Draw a fresh problem: operands and the expected answer.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> (Vec<i64>, i64) {
        let operands = match &self.source {
            OperandSource::Independent { first, second } => {
                vec![signed(draw(first, rng), rng), signed(draw(second, rng), rng)]
            }
            OperandSource::FixedFactor { first, factor } => {
                vec![signed(draw(first, rng), rng), signed(*factor, rng)]
            }
            OperandSource::Shared(pool) => {
                vec![signed(draw(pool, rng), rng), signed(draw(pool, rng), rng)]
            }
            OperandSource::Single(pool) => vec![draw(pool, rng)],
            OperandSource::ComplementPair(width) => {
                let (a, b) = complement_pair(*width, rng);
                vec![signed(a, rng), signed(b, rng)]
            }
        };
        let expected = self.operator.apply(&operands);
        (operands, expected)
    }
}

fn non_empty<S: AsRef<str>>(ids: &[S]) -> Result<OperandPool, SetupError> {
    let pool = OperandPool::from_ids(ids);
    if pool.is_empty() {
        return Err(SetupError::EmptyPool(
            ids.iter().map(|id| id.as_ref().to_string()).collect(),
        ));
    }
    Ok(pool)
}

// Pools are checked non-empty at construction.
fn draw<R: Rng + ?Sized>(pool: &OperandPool, rng: &mut R) -> i64 {
    pool.choose(rng).unwrap_or_default()
}

fn signed<R: Rng + ?Sized>(magnitude: i64, rng: &mut R) -> i64 {
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

/// Unsigned pair sharing every digit but the last, whose last digits sum to 10.
pub fn complement_pair<R: Rng + ?Sized>(width: TrickWidth, rng: &mut R) -> (i64, i64) {
    let group = match width {
        TrickWidth::Two => rng.gen_range(1..=9),
        TrickWidth::Three => rng.gen_range(1..=9) * 10 + rng.gen_range(0..=9),
    };
    let unit = rng.gen_range(1..=9);
    (group * 10 + unit, group * 10 + (10 - unit))
}
