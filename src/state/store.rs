//! Storage contracts the engine is run against.
//!
//! The web layer owns the real session and preference storage; the engine
//! only needs get/set/delete on JSON values. In-memory implementations are
//! provided for tests and single-process use.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::session::{GameKind, GameSession};
use super::setup::GameSetup;

/// Player identity for saved preferences.
pub type UserId = i64;

/// Per-browser-session key/value storage.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<serde_json::Value>;
    fn set(&mut self, key: &str, value: serde_json::Value);
    fn delete(&mut self, key: &str);
}

/// Saved configuration per (user, game kind). `save` is an upsert.
pub trait PreferenceStore {
    fn load(&self, user: UserId, kind: GameKind) -> Option<serde_json::Value>;
    fn save(&mut self, user: UserId, kind: GameKind, config: serde_json::Value);
}

/// Session key under which a game's state lives.
pub fn session_key(kind: GameKind) -> String {
    format!("game.{}", kind.as_str())
}

/// Read a game's session, discarding anything that fails shape validation.
pub fn load_session(store: &dyn SessionStore, kind: GameKind) -> Option<GameSession> {
    let value = store.get(&session_key(kind))?;
    match GameSession::from_json(value) {
        Some(session) if session.kind == kind => Some(session),
        Some(session) => {
            tracing::warn!(%kind, found = %session.kind, "session stored under wrong key");
            None
        }
        None => {
            tracing::warn!(%kind, "malformed session data ignored");
            None
        }
    }
}

pub fn save_session(store: &mut dyn SessionStore, session: &GameSession) {
    store.set(&session_key(session.kind), session.to_json());
}

/// Read a saved preference, ignoring anything that does not parse as a setup for `kind`.
pub fn load_preference(
    store: &dyn PreferenceStore,
    user: UserId,
    kind: GameKind,
) -> Option<GameSetup> {
    let value = store.load(user, kind)?;
    match GameSetup::from_json(value, kind) {
        Ok(setup) => Some(setup),
        Err(err) => {
            tracing::warn!(user, %kind, error = %err, "ignoring saved preference");
            None
        }
    }
}

/// In-memory session storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: HashMap<String, serde_json::Value>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// A saved preference with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceRecord {
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory preference storage.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    records: HashMap<(UserId, GameKind), PreferenceRecord>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, user: UserId, kind: GameKind) -> Option<&PreferenceRecord> {
        self.records.get(&(user, kind))
    }

    /// Remove every preference of a user (an administrative action).
    pub fn remove_user(&mut self, user: UserId) -> usize {
        let before = self.records.len();
        self.records.retain(|(owner, _), _| *owner != user);
        before - self.records.len()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, user: UserId, kind: GameKind) -> Option<serde_json::Value> {
        self.records.get(&(user, kind)).map(|r| r.config.clone())
    }

    fn save(&mut self, user: UserId, kind: GameKind, config: serde_json::Value) {
        let now = Utc::now();
        self.records
            .entry((user, kind))
            .and_modify(|r| {
                r.config = config.clone();
                r.updated_at = now;
            })
            .or_insert_with(|| PreferenceRecord {
                config,
                created_at: now,
                updated_at: now,
            });
    }
}
