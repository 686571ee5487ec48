//! Constrained number generator for addition/subtraction drills.
//!
//! Produces `n` signed terms whose magnitudes use only the digits
//! `1..=digit_cap` at a fixed width. Every prefix sum stays inside
//! `[0, max_sum]` and the full sum lands on a target drawn up front, so a
//! learner never carries a negative or oversized running total.
//!
//! # Construction
//!
//! ```text
//! draw target ─▶ for each position ──▶ sample magnitude ─▶ admissible signs?
//!      ▲                │                                      │ none: retry
//!      │                │ last position: the remaining gap     │ (bounded)
//!      │                │ must itself be a valid magnitude     │
//!      └── restart ◀────┴──────── attempts exhausted ◀─────────┘
//!
//! restarts exhausted ─▶ fallback policy (never retries)
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::GeneratorLimits;
use super::error::SetupError;

/// Number of digits in every generated magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitWidth {
    One,
    Two,
    Three,
    Four,
}

impl DigitWidth {
    /// Map the range selector used by the configuration form.
    ///
    /// Keys outside 1..=4 fall back to two digits.
    pub fn from_range_key(key: i64) -> Self {
        match key {
            1 => Self::One,
            3 => Self::Three,
            4 => Self::Four,
            _ => Self::Two,
        }
    }

    pub fn range_key(self) -> u8 {
        self.digits() as u8
    }

    pub fn digits(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Smallest number with this many digits.
    pub fn min_num(self) -> i64 {
        10_i64.pow(self.digits() - 1)
    }

    /// Upper end of the magnitude range (exclusive of any real magnitude).
    pub fn max_num(self) -> i64 {
        10_i64.pow(self.digits())
    }

    /// 1, 11, 111, 1111.
    pub fn repunit(self) -> i64 {
        (0..self.digits()).fold(0, |acc, _| acc * 10 + 1)
    }
}

/// Which magnitudes may appear: width plus the largest allowed digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitSpec {
    width: DigitWidth,
    digit_cap: u8,
}

impl DigitSpec {
    pub fn new(width: DigitWidth, digit_cap: u8) -> Result<Self, SetupError> {
        if !(1..=9).contains(&digit_cap) {
            return Err(SetupError::invalid("max_digit", digit_cap.to_string()));
        }
        Ok(Self { width, digit_cap })
    }

    /// Largest composable magnitude: every digit at the cap.
    pub fn max_magnitude(&self) -> i64 {
        self.digit_cap as i64 * self.width.repunit()
    }

    /// Ceiling for every prefix sum.
    pub fn max_sum(&self) -> i64 {
        self.max_magnitude()
    }

    /// Compose a magnitude from independent random digits, most significant first.
    pub fn sample_magnitude<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        (0..self.width.digits()).fold(0, |acc, _| {
            acc * 10 + rng.gen_range(1..=self.digit_cap) as i64
        })
    }

    /// Whether `value` has exactly the configured width and only allowed digits.
    pub fn is_composable(&self, value: i64) -> bool {
        if !(self.width.min_num()..self.width.max_num()).contains(&value) {
            return false;
        }
        let mut rest = value;
        while rest > 0 {
            let digit = rest % 10;
            if digit == 0 || digit > self.digit_cap as i64 {
                return false;
            }
            rest /= 10;
        }
        true
    }
}

/// Output of one generator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSequence {
    pub terms: Vec<i64>,
    pub total: i64,
    /// Target the construction aimed for. Equals `total` unless the fallback ran.
    pub target: i64,
    pub used_fallback: bool,
}

impl GeneratedSequence {
    /// Running totals after each term.
    pub fn prefix_sums(&self) -> Vec<i64> {
        self.terms
            .iter()
            .scan(0, |running, term| {
                *running += term;
                Some(*running)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstrainedGenerator {
    spec: DigitSpec,
    limits: GeneratorLimits,
}

impl ConstrainedGenerator {
    pub fn new(spec: DigitSpec, limits: GeneratorLimits) -> Self {
        Self { spec, limits }
    }

    pub fn spec(&self) -> &DigitSpec {
        &self.spec
    }

    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> GeneratedSequence {
        if count == 0 {
            return GeneratedSequence {
                terms: Vec::new(),
                total: 0,
                target: 0,
                used_fallback: false,
            };
        }

        let max_sum = self.spec.max_sum();
        for restart in 0..=self.limits.max_restarts {
            let target = rng.gen_range(0..=max_sum);
            if let Some(terms) = self.build(count, target, rng) {
                tracing::debug!(count, target, restart, "generated sequence");
                return GeneratedSequence {
                    total: terms.iter().sum(),
                    terms,
                    target,
                    used_fallback: false,
                };
            }
        }

        tracing::warn!(
            count,
            width = self.spec.width.digits(),
            digit_cap = self.spec.digit_cap,
            "generator exhausted its restarts, using fallback policy"
        );
        self.fallback(count, rng)
    }

    fn build<R: Rng + ?Sized>(&self, count: usize, target: i64, rng: &mut R) -> Option<Vec<i64>> {
        let mut terms = Vec::with_capacity(count);
        let mut running = 0;
        for position in 0..count {
            let remaining = count - position - 1;
            let term = self.next_term(running, target, remaining, rng)?;
            running += term;
            terms.push(term);
        }
        Some(terms)
    }

    fn next_term<R: Rng + ?Sized>(
        &self,
        running: i64,
        target: i64,
        remaining: usize,
        rng: &mut R,
    ) -> Option<i64> {
        if remaining == 0 {
            // Only one magnitude can close the gap; it either exists or this target is dead.
            let gap = target - running;
            return self.spec.is_composable(gap.abs()).then_some(gap);
        }

        for _ in 0..self.limits.attempts_per_position {
            let magnitude = self.spec.sample_magnitude(rng);
            let admissible: Vec<i64> = [magnitude, -magnitude]
                .into_iter()
                .filter(|term| self.admits(running + term, target, remaining))
                .collect();
            if let Some(&term) = admissible.choose(rng) {
                return Some(term);
            }
        }
        None
    }

    /// A prefix is admissible if it is in bounds and the target stays reachable.
    fn admits(&self, prefix: i64, target: i64, remaining: usize) -> bool {
        if !(0..=self.spec.max_sum()).contains(&prefix) {
            return false;
        }
        let gap = (target - prefix).abs();
        if remaining == 1 {
            return self.spec.is_composable(gap);
        }
        gap <= remaining as i64 * self.spec.max_magnitude()
    }

    /// Positive unless that overflows, then negative if the running sum can
    /// absorb it, otherwise a positive term clamped to fit.
    fn fallback<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> GeneratedSequence {
        let max_sum = self.spec.max_sum();
        let mut terms = Vec::with_capacity(count);
        let mut running = 0;
        for _ in 0..count {
            let magnitude = self.spec.sample_magnitude(rng);
            let term = if running + magnitude <= max_sum {
                magnitude
            } else if running >= magnitude {
                -magnitude
            } else {
                max_sum - running
            };
            running += term;
            terms.push(term);
        }
        let total = running.clamp(0, max_sum);
        GeneratedSequence {
            terms,
            total,
            target: total,
            used_fallback: true,
        }
    }
}
