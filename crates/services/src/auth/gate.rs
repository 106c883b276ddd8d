use chrono::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use assess_core::model::{resolve, Route, RouteDecision, SessionFlag, SessionStatus};
use storage::{default_session_ttl, SessionStore};

use super::credentials::{CredentialValidator, Credentials, LoginOutcome};
use crate::error::AuthError;

/// Simulated latency of the credential check.
pub const DEFAULT_LOGIN_DELAY: StdDuration = StdDuration::from_millis(500);

/// Owns the persisted session flags: login, logout, onboarding and route guarding.
///
/// Flags live in the injected `SessionStore`; this type keeps no session state
/// of its own besides the in-flight login marker.
pub struct SessionGate {
    store: Arc<dyn SessionStore>,
    validator: Arc<dyn CredentialValidator>,
    ttl: Duration,
    login_delay: StdDuration,
    login_pending: AtomicBool,
}

/// Clears the in-flight marker however the login attempt ends.
struct PendingLogin<'a>(&'a AtomicBool);

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionGate {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, validator: Arc<dyn CredentialValidator>) -> Self {
        Self {
            store,
            validator,
            ttl: default_session_ttl(),
            login_delay: DEFAULT_LOGIN_DELAY,
            login_pending: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_login_delay(mut self, delay: StdDuration) -> Self {
        self.login_delay = delay;
        self
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn is_login_pending(&self) -> bool {
        self.login_pending.load(Ordering::Acquire)
    }

    /// Check credentials and, on success, mark the session authenticated.
    ///
    /// A rejected login is `Ok(LoginOutcome::Rejected)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginInProgress` while another attempt is pending,
    /// or `AuthError::Storage` if the authenticated flag cannot be written.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, AuthError> {
        if self.login_pending.swap(true, Ordering::AcqRel) {
            tracing::debug!("login re-submitted while pending");
            return Err(AuthError::LoginInProgress);
        }
        let _pending = PendingLogin(&self.login_pending);

        let accepted = self.validator.validate(credentials).await;
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        if !accepted {
            tracing::info!(email = %credentials.email, "login rejected");
            return Ok(LoginOutcome::Rejected);
        }

        self.store
            .set(SessionFlag::Authenticated, true, self.ttl)
            .await?;
        let onboarded = self.read_flag(SessionFlag::OnboardingComplete).await;
        tracing::info!(email = %credentials.email, onboarded, "login accepted");

        Ok(LoginOutcome::Accepted {
            email: credentials.email.trim().to_owned(),
            needs_onboarding: !onboarded,
        })
    }

    /// End the authenticated session. Onboarding completion is kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the flag cannot be cleared.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.clear(SessionFlag::Authenticated).await?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Record that the authenticated user finished onboarding.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` without a live session, or
    /// `AuthError::Storage` if the flag cannot be written.
    pub async fn complete_onboarding(&self) -> Result<(), AuthError> {
        if !self.status().await.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        self.store
            .set(SessionFlag::OnboardingComplete, true, self.ttl)
            .await?;
        tracing::info!("onboarding completed");
        Ok(())
    }

    /// Current status derived from the stored flags.
    ///
    /// Live flags are re-written with a full TTL (sliding expiry). Store
    /// failures degrade to `Unauthenticated`.
    pub async fn status(&self) -> SessionStatus {
        let authenticated = match self.store.get(SessionFlag::Authenticated).await {
            Ok(value) => value.unwrap_or(false),
            Err(err) => {
                tracing::warn!(error = %err, "session store unavailable; treating as signed out");
                return SessionStatus::Unauthenticated;
            }
        };
        let onboarded = self.read_flag(SessionFlag::OnboardingComplete).await;

        if authenticated {
            self.renew(SessionFlag::Authenticated).await;
            if onboarded {
                self.renew(SessionFlag::OnboardingComplete).await;
            }
        }
        SessionStatus::from_flags(authenticated, onboarded)
    }

    /// Decide whether `route` can be shown or where to redirect.
    pub async fn resolve(&self, route: &Route) -> RouteDecision {
        let status = self.status().await;
        let decision = resolve(status, route);
        if let RouteDecision::Redirect(target) = &decision {
            tracing::debug!(from = %route, to = %target, ?status, "redirect");
        }
        decision
    }

    async fn read_flag(&self, flag: SessionFlag) -> bool {
        match self.store.get(flag).await {
            Ok(value) => value.unwrap_or(false),
            Err(err) => {
                tracing::warn!(flag = %flag, error = %err, "failed to read session flag");
                false
            }
        }
    }

    async fn renew(&self, flag: SessionFlag) {
        if let Err(err) = self.store.set(flag, true, self.ttl).await {
            tracing::warn!(flag = %flag, error = %err, "failed to renew session flag");
        }
    }
}
