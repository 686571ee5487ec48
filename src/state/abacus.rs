//! Abacus bead patterns for flashcards.
//!
//! Each rod has two rows of slots. The upper row has two slots and one
//! "five" bead; the lower row has five slots and four "one" beads. A pattern
//! records which slots hold a bead:
//!
//! ```text
//!   digit 7        upper  [ ][●]     five bead pulled to the beam
//!                  ─────────────
//!                  lower  [●][●][ ][●][●]   two ones pushed to the beam
//! ```
//!
//! Digits 0-4 leave the five bead at rest and push `digit` ones to the beam;
//! digits 5-9 pull the five bead down and push `digit - 5` ones.

use serde::{Deserialize, Serialize};

pub const UPPER_SLOTS: usize = 2;
pub const LOWER_SLOTS: usize = 5;

/// Slot occupancy of a single rod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeadPattern {
    pub upper: [bool; UPPER_SLOTS],
    pub lower: [bool; LOWER_SLOTS],
}

impl BeadPattern {
    /// Pattern for a decimal digit. `None` above 9.
    pub fn for_digit(digit: u8) -> Option<Self> {
        if digit > 9 {
            return None;
        }
        let five_active = digit >= 5;
        let ones = (digit % 5) as usize;

        let upper = if five_active {
            [false, true]
        } else {
            [true, false]
        };
        let mut lower = [true; LOWER_SLOTS];
        lower[ones] = false;

        Some(Self { upper, lower })
    }

    pub fn five_active(&self) -> bool {
        self.upper[1]
    }

    /// One-beads pushed to the beam: the slots before the gap.
    pub fn ones_active(&self) -> u8 {
        self.lower.iter().take_while(|slot| **slot).count() as u8
    }

    /// Digit shown by this rod.
    pub fn digit(&self) -> u8 {
        if self.five_active() {
            5 + self.ones_active()
        } else {
            self.ones_active()
        }
    }
}

/// Sign of a flashcard value; drawn as a label, never in bead state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn of(value: i64) -> Self {
        if value < 0 {
            Self::Negative
        } else {
            Self::Positive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// A whole number laid out on consecutive rods, most significant first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbacusCard {
    pub sign: Sign,
    pub rods: Vec<BeadPattern>,
}

impl AbacusCard {
    pub fn encode(value: i64) -> Self {
        let rods = value
            .unsigned_abs()
            .to_string()
            .bytes()
            .filter_map(|b| BeadPattern::for_digit(b - b'0'))
            .collect();
        Self {
            sign: Sign::of(value),
            rods,
        }
    }

    /// Encode onto at least `rods` rods, padding with zero rods on the left.
    pub fn encode_padded(value: i64, rods: usize) -> Self {
        let mut card = Self::encode(value);
        if let (Some(zero), Some(missing)) =
            (BeadPattern::for_digit(0), rods.checked_sub(card.rods.len()))
        {
            let digits = std::mem::take(&mut card.rods);
            card.rods = std::iter::repeat(zero).take(missing).chain(digits).collect();
        }
        card
    }

    /// Read the card back as a signed number.
    pub fn value(&self) -> i64 {
        let magnitude = self
            .rods
            .iter()
            .fold(0_i64, |acc, rod| acc * 10 + rod.digit() as i64);
        match self.sign {
            Sign::Positive => magnitude,
            Sign::Negative => -magnitude,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let rods: Vec<serde_json::Value> = self
            .rods
            .iter()
            .map(|rod| serde_json::json!({"upper": rod.upper, "lower": rod.lower}))
            .collect();
        serde_json::json!({
            "sign": self.sign.as_str(),
            "rods": rods
        })
    }
}
