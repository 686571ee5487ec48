//! Named numeric ranges and the operand pools built from them.
//!
//! Spans are half-open, `[start, end)`. Some names read wider than their span
//! (`"10-19"` stops at 18); the table is kept as players have always seen it.

use rand::Rng;

/// Selectable range identifiers and their spans.
pub const RANGES: &[(&str, i64, i64)] = &[
    ("1-9", 1, 10),
    ("10-19", 10, 19),
    ("20-29", 20, 29),
    ("30-70", 30, 70),
    ("80-120", 80, 120),
    ("10-99", 10, 100),
    ("100-999", 100, 1000),
    ("1000-9999", 1000, 10000),
    ("10000-99999", 10000, 100000),
    ("10", 1, 10),
    ("50", 1, 50),
    ("100", 1, 100),
    ("200", 1, 200),
    ("1000", 1, 1000),
    ("random", 1, 101),
    ("both-lower", 1, 51),
    ("one-lower-one-higher", 1, 101),
    ("both-higher", 50, 151),
    ("2-9", 2, 10),
    ("1-10", 1, 10),
    ("10-100", 10, 100),
    ("100-1000", 100, 1000),
    ("1000-10000", 1000, 10000),
];

/// Look up the span for a range identifier.
pub fn span(id: &str) -> Option<(i64, i64)> {
    RANGES
        .iter()
        .find(|(name, _, _)| *name == id)
        .map(|&(_, start, end)| (start, end))
}

/// Candidate magnitudes from one or more ranges.
///
/// Selecting the same range twice doubles its weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperandPool {
    spans: Vec<(i64, i64)>,
}

impl OperandPool {
    /// Build a pool from range identifiers. Unknown identifiers add nothing.
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Self {
        let spans = ids
            .iter()
            .filter_map(|id| span(id.as_ref()))
            .filter(|(start, end)| end > start)
            .collect();
        Self { spans }
    }

    pub fn len(&self) -> usize {
        self.spans
            .iter()
            .map(|(start, end)| (end - start) as usize)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Value at a flat index across all spans.
    pub fn get(&self, mut index: usize) -> Option<i64> {
        for &(start, end) in &self.spans {
            let width = (end - start) as usize;
            if index < width {
                return Some(start + index as i64);
            }
            index -= width;
        }
        None
    }

    /// Uniform draw over every entry of the pool.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<i64> {
        if self.is_empty() {
            return None;
        }
        self.get(rng.gen_range(0..self.len()))
    }
}
