//! Mental Games Library
//!
//! Session-driven arithmetic practice: seven mini-games that each walk a
//! player through configure, display and answer stages.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Two-operand games** - Multiply, multiply-to-20, multiply-from-base,
//!   square and complement tricks. One problem at a time, checked on submit.
//!
//! - **Batch games** - Simple sum and abacus flashcards. A signed sequence is
//!   shown item by item, then the player enters the total.
//!
//! - **Constrained generator** - Produces signed sequences whose every
//!   running sum stays within the configured bounds.
//!
//! - **Preferences** - Signed-in players get their last setup pre-filled.
//!
//! # Design Principles
//!
//! 1. **Transitions are pure** - Stage functions take the stored session and
//!    return the session to store plus what to render.
//!
//! 2. **Failures redirect** - Missing state or a bad setup sends the player
//!    back to a stage that can recover, never to an error page.
//!
//! 3. **No web framework** - Storage comes in through the
//!    [`SessionStore`] and [`PreferenceStore`] traits.
//!
//! 4. **Serialization-ready** - Sessions, setups and views convert to JSON.
//!
//! # Example
//!
//! ```rust
//! use mental_games::state::{
//!     Action, FormParams, GameEngine, GameKind, MemorySessionStore, Stage, View,
//! };
//!
//! let mut engine = GameEngine::seeded(7);
//! let mut session = MemorySessionStore::new();
//!
//! // Configure a multiplication drill
//! let form = FormParams::new()
//!     .with("first-multiplier", "1-9")
//!     .with("second-multiplier", "1-9");
//! let outcome = engine.handle(&mut session, None, GameKind::Multiply, Stage::Configure, &Action::Submit(form));
//! assert_eq!(outcome.stage(), Stage::Display);
//!
//! // Show the problem and answer it
//! let shown = engine.handle(&mut session, None, GameKind::Multiply, Stage::Display, &Action::View);
//! let product = match shown.view() {
//!     Some(View::Problem { operands, .. }) => operands[0] * operands[1],
//!     _ => unreachable!(),
//! };
//! let answer = FormParams::new().with("user-answer", product.to_string());
//! let verdict = engine.handle(&mut session, None, GameKind::Multiply, Stage::Answer, &Action::Submit(answer));
//! assert_eq!(verdict.to_json()["is_correct"], true);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
