use assess_core::Clock;
use assess_core::model::{Question, SessionFlag};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Default lifetime of persisted session flags, in days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Default lifetime of persisted session flags.
#[must_use]
pub fn default_session_ttl() -> Duration {
    Duration::days(DEFAULT_SESSION_TTL_DAYS)
}

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Read-only source of authored questions, in authoring order.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// List every question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing content cannot be read or is invalid.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;
}

/// Persists session flags with an expiry horizon.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current value of `flag`; expired or missing flags read as `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be reached.
    async fn get(&self, flag: SessionFlag) -> Result<Option<bool>, StorageError>;

    /// Store `value` for `flag`, expiring `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be written.
    async fn set(&self, flag: SessionFlag, value: bool, ttl: Duration) -> Result<(), StorageError>;

    /// Remove `flag`. Clearing a missing flag is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be written.
    async fn clear(&self, flag: SessionFlag) -> Result<(), StorageError>;
}

/// A stored flag value and the instant it stops counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFlag {
    pub value: bool,
    pub expires_at: DateTime<Utc>,
}

impl StoredFlag {
    #[must_use]
    pub fn new(value: bool, clock: &Clock, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: clock.expiry_after(ttl),
        }
    }

    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// In-memory question repository for tests and embedded content.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<Question>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions)),
        }
    }

    /// Append a question at the end of the authoring order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the lock is poisoned.
    pub fn push(&self, question: Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.push(question);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }
}

/// Process-local session store.
///
/// Clones share entries; `with_clock` gives a view of the same entries at another time.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<Mutex<HashMap<SessionFlag, StoredFlag>>>,
    clock: Clock,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    #[must_use]
    pub fn with_clock(&self, clock: Clock) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, flag: SessionFlag) -> Result<Option<bool>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let now = self.clock.now();
        Ok(guard
            .get(&flag)
            .filter(|stored| stored.is_live(now))
            .map(|stored| stored.value))
    }

    async fn set(&self, flag: SessionFlag, value: bool, ttl: Duration) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.insert(flag, StoredFlag::new(value, &self.clock, ttl));
        Ok(())
    }

    async fn clear(&self, flag: SessionFlag) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.remove(&flag);
        Ok(())
    }
}

/// Question and session backends behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(clock: Clock, questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(InMemoryRepository::with_questions(questions)),
            sessions: Arc::new(InMemorySessionStore::new(clock)),
        }
    }
}
