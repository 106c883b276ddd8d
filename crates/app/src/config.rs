//! Runtime configuration: TOML file plus environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use assess_core::model::QuestionBinding;
use chrono::Duration;
use serde::Deserialize;
use services::StaticCredentialValidator;
use storage::DEFAULT_SESSION_TTL_DAYS;
use thiserror::Error;

pub const ENV_CONFIG: &str = "ASSESS_CONFIG";
pub const ENV_SESSION_FILE: &str = "ASSESS_SESSION_FILE";
pub const ENV_LOGIN_DELAY_MS: &str = "ASSESS_LOGIN_DELAY_MS";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to parse config file at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value for {name}: {raw}")]
    InvalidEnv { name: &'static str, raw: String },

    #[error("configuration validation failed: {0}")]
    Invalid(String),
}

/// Account accepted by the built-in credential check.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub email: String,
    pub password: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email: StaticCredentialValidator::DEMO_EMAIL.to_owned(),
            password: StaticCredentialValidator::DEMO_PASSWORD.to_owned(),
        }
    }
}

/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Lifetime of the session flags, renewed on activity.
    pub session_ttl_days: i64,
    /// Simulated credential check latency.
    pub login_delay_ms: u64,
    pub binding: QuestionBinding,
    /// JSON flag jar; in-memory when unset.
    pub session_file: Option<PathBuf>,
    /// JSON question list; built-in CIS questions when unset.
    pub question_bank: Option<PathBuf>,
    pub credentials: CredentialsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            login_delay_ms: 500,
            binding: QuestionBinding::Reference,
            session_file: None,
            question_bank: None,
            credentials: CredentialsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (or `ASSESS_CONFIG`), then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, an override
    /// is malformed, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` or `ConfigError::Parse`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply `ASSESS_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnv` for unparsable values.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = lookup(ENV_SESSION_FILE).filter(|v| !v.trim().is_empty()) {
            self.session_file = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_LOGIN_DELAY_MS) {
            self.login_delay_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_LOGIN_DELAY_MS,
                raw,
            })?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a non-positive TTL or blank credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl_days < 1 {
            return Err(ConfigError::Invalid(
                "session_ttl_days must be at least 1".into(),
            ));
        }
        if self.credentials.email.trim().is_empty() || self.credentials.password.is_empty() {
            return Err(ConfigError::Invalid(
                "credentials.email and credentials.password must be set".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::days(self.session_ttl_days)
    }

    #[must_use]
    pub fn login_delay(&self) -> StdDuration {
        StdDuration::from_millis(self.login_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.session_ttl(), Duration::days(7));
        assert_eq!(config.login_delay(), StdDuration::from_millis(500));
        assert_eq!(config.binding, QuestionBinding::Reference);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
binding = "repeat-last"
login_delay_ms = 0

[credentials]
email = "auditor@example.com"
"#,
        )
        .unwrap();
        assert_eq!(config.binding, QuestionBinding::RepeatLast);
        assert_eq!(config.login_delay_ms, 0);
        assert_eq!(config.credentials.email, "auditor@example.com");
        assert_eq!(config.credentials.password, "Demo123!");
        assert_eq!(config.session_ttl_days, 7);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_toml("session_ttl = 3").is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(|name| match name {
                ENV_SESSION_FILE => Some("/tmp/jar.json".into()),
                ENV_LOGIN_DELAY_MS => Some("25".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.session_file, Some(PathBuf::from("/tmp/jar.json")));
        assert_eq!(config.login_delay_ms, 25);
    }

    #[test]
    fn malformed_delay_override_is_an_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|name| (name == ENV_LOGIN_DELAY_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn zero_ttl_fails_validation() {
        let config = AppConfig {
            session_ttl_days: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
