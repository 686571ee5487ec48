//! What a stage transition tells the web layer to do.

use super::abacus::AbacusCard;
use super::session::{AnswerRecord, GameKind, Stage};
use super::setup::GameSetup;

/// Stage-specific payload for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Configuration form, pre-filled.
    ConfigureForm { defaults: GameSetup },

    /// A two-operand problem.
    Problem {
        operands: Vec<i64>,
        operator: &'static str,
    },

    /// One item of a batch.
    Item {
        value: i64,
        /// 1-based position for display.
        position: usize,
        total: usize,
        display_speed: f64,
        abacus: Option<AbacusCard>,
    },

    /// Batch answer entry.
    AnswerForm { total_items: usize },

    /// Result of a checked answer.
    Verdict {
        record: AnswerRecord,
        rounds_played: u32,
        rounds_correct: u32,
    },
}

impl View {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::ConfigureForm { defaults } => serde_json::json!({
                "saved_settings": defaults.to_json()
            }),
            Self::Problem { operands, operator } => serde_json::json!({
                "operands": operands,
                "operation": operator
            }),
            Self::Item {
                value,
                position,
                total,
                display_speed,
                abacus,
            } => {
                let mut obj = serde_json::json!({
                    "current_number": value,
                    "current_index": position,
                    "total_count": total,
                    "speed": display_speed
                });
                if let Some(card) = abacus {
                    obj["abacus_data"] = card.to_json();
                }
                obj
            }
            Self::AnswerForm { total_items } => serde_json::json!({
                "total_count": total_items
            }),
            Self::Verdict {
                record,
                rounds_played,
                rounds_correct,
            } => {
                let mut obj = record.to_json();
                obj["rounds_played"] = serde_json::json!(rounds_played);
                obj["rounds_correct"] = serde_json::json!(rounds_correct);
                obj
            }
        }
    }
}

/// The two observable results of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render {
        kind: GameKind,
        stage: Stage,
        view: View,
    },
    Redirect {
        kind: GameKind,
        stage: Stage,
    },
}

impl Outcome {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Render { stage, .. } | Self::Redirect { stage, .. } => *stage,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    pub fn view(&self) -> Option<&View> {
        match self {
            Self::Render { view, .. } => Some(view),
            Self::Redirect { .. } => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Render { kind, stage, view } => {
                let mut obj = view.to_json();
                obj["game"] = serde_json::json!(kind.as_str());
                obj["mode"] = serde_json::json!(stage.as_str());
                obj
            }
            Self::Redirect { kind, stage } => serde_json::json!({
                "redirect": {"game": kind.as_str(), "mode": stage.as_str()}
            }),
        }
    }
}
