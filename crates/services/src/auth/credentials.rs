use async_trait::async_trait;
use std::fmt;

/// Login form input.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Decides whether credentials are acceptable.
///
/// The session gate only needs a yes/no answer.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, credentials: &Credentials) -> bool;
}

/// Accepts exactly one configured account.
#[derive(Clone)]
pub struct StaticCredentialValidator {
    email: String,
    password: String,
}

impl StaticCredentialValidator {
    pub const DEMO_EMAIL: &'static str = "demo@nis2.com";
    pub const DEMO_PASSWORD: &'static str = "Demo123!";

    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn demo() -> Self {
        Self::new(Self::DEMO_EMAIL, Self::DEMO_PASSWORD)
    }
}

impl Default for StaticCredentialValidator {
    fn default() -> Self {
        Self::demo()
    }
}

impl fmt::Debug for StaticCredentialValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentialValidator")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialValidator for StaticCredentialValidator {
    async fn validate(&self, credentials: &Credentials) -> bool {
        credentials.email.trim().eq_ignore_ascii_case(self.email.trim())
            && credentials.password == self.password
    }
}

/// Result of a login attempt. Rejection is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted {
        email: String,
        needs_onboarding: bool,
    },
    Rejected,
}

impl LoginOutcome {
    #[must_use]
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}
