//! Engine configuration.
//!
//! Everything has a default. Values can be overridden from a JSON document
//! or from `MENTAL_GAMES_*` environment variables.

use serde::{Deserialize, Serialize};

/// Candidate draws allowed per sequence position before the generator
/// restarts with a new target.
pub const MAX_ATTEMPTS_PER_POSITION: u32 = 1000;

/// Fresh targets drawn before the generator gives up and uses its fallback.
pub const MAX_RESTARTS: u32 = 100;

/// Upper bound on operands per batch game.
pub const DEFAULT_MAX_OPERAND_COUNT: usize = 100;

const ENV_ATTEMPTS: &str = "MENTAL_GAMES_ATTEMPTS_PER_POSITION";
const ENV_RESTARTS: &str = "MENTAL_GAMES_MAX_RESTARTS";
const ENV_MAX_OPERANDS: &str = "MENTAL_GAMES_MAX_OPERANDS";

/// Retry budget of the constrained generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorLimits {
    pub attempts_per_position: u32,
    pub max_restarts: u32,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        Self {
            attempts_per_position: MAX_ATTEMPTS_PER_POSITION,
            max_restarts: MAX_RESTARTS,
        }
    }
}

impl GeneratorLimits {
    /// No retries at all: every batch comes from the fallback policy.
    pub fn exhausted() -> Self {
        Self {
            attempts_per_position: 0,
            max_restarts: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub generator: GeneratorLimits,
    pub max_operand_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorLimits::default(),
            max_operand_count: DEFAULT_MAX_OPERAND_COUNT,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
            default: T,
        ) -> T {
            match lookup(key) {
                Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                    tracing::warn!(key, value = %raw, "ignoring unparseable setting");
                    default
                }),
                None => default,
            }
        }

        let defaults = Self::default();
        Self {
            generator: GeneratorLimits {
                attempts_per_position: parsed(
                    &lookup,
                    ENV_ATTEMPTS,
                    defaults.generator.attempts_per_position,
                ),
                max_restarts: parsed(&lookup, ENV_RESTARTS, defaults.generator.max_restarts),
            },
            max_operand_count: parsed(&lookup, ENV_MAX_OPERANDS, defaults.max_operand_count),
        }
    }
}
