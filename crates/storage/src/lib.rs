#![forbid(unsafe_code)]

pub mod catalog;
pub mod file;
pub mod repository;

pub use catalog::{BuiltinCatalog, CIS_STEP_TITLES};
pub use file::{FileSessionStore, JsonQuestionBank};
pub use repository::{
    default_session_ttl, InMemoryRepository, InMemorySessionStore, QuestionRepository,
    SessionStore, Storage, StorageError, StoredFlag, DEFAULT_SESSION_TTL_DAYS,
};
