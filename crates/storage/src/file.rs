//! File-backed adapters: a JSON flag jar and a JSON question bank.

use assess_core::Clock;
use assess_core::model::{Question, SessionFlag};
use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::repository::{QuestionRepository, SessionStore, StorageError, StoredFlag};

#[derive(Debug, Default, Serialize, Deserialize)]
struct FlagJar {
    #[serde(default)]
    flags: BTreeMap<SessionFlag, StoredFlag>,
}

/// Session store persisted as a small JSON document.
///
/// The whole jar is rewritten on every mutation; expired entries are dropped then.
/// A missing file reads as an empty jar. A corrupt jar fails reads and is
/// replaced by the next write.
pub struct FileSessionStore {
    path: PathBuf,
    clock: Clock,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, clock: Clock) -> Self {
        Self {
            path: path.into(),
            clock,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<FlagJar, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(FlagJar::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(FlagJar::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, jar: &FlagJar) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(jar)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mutate(&self, apply: impl FnOnce(&mut FlagJar)) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let mut jar = match self.load() {
            Ok(jar) => jar,
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(path = %self.path.display(), %reason, "discarding corrupt session jar");
                FlagJar::default()
            }
            Err(err) => return Err(err),
        };
        let now = self.clock.now();
        jar.flags.retain(|_, stored| stored.is_live(now));
        apply(&mut jar);
        self.save(&jar)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, flag: SessionFlag) -> Result<Option<bool>, StorageError> {
        let jar = self.load()?;
        let now = self.clock.now();
        Ok(jar
            .flags
            .get(&flag)
            .filter(|stored| stored.is_live(now))
            .map(|stored| stored.value))
    }

    async fn set(&self, flag: SessionFlag, value: bool, ttl: Duration) -> Result<(), StorageError> {
        let stored = StoredFlag::new(value, &self.clock, ttl);
        self.mutate(|jar| {
            jar.flags.insert(flag, stored);
        })?;
        tracing::debug!(flag = %flag, path = %self.path.display(), "session flag written");
        Ok(())
    }

    async fn clear(&self, flag: SessionFlag) -> Result<(), StorageError> {
        self.mutate(|jar| {
            jar.flags.remove(&flag);
        })?;
        tracing::debug!(flag = %flag, path = %self.path.display(), "session flag cleared");
        Ok(())
    }
}

/// Questions authored as a JSON array, in the same shape the seed content uses
/// (`id`, `category`, `topic`, `question`, `helptext`, `options`, `stepIndex`).
#[derive(Debug, Clone)]
pub struct JsonQuestionBank {
    path: PathBuf,
}

impl JsonQuestionBank {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl QuestionRepository for JsonQuestionBank {
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound);
            }
            Err(err) => return Err(err.into()),
        };
        let questions: Vec<Question> = serde_json::from_str(&raw)?;
        for question in &questions {
            question
                .validate()
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
        }
        tracing::debug!(
            count = questions.len(),
            path = %self.path.display(),
            "question bank loaded"
        );
        Ok(questions)
    }
}
