//! Session status and the route guard decision table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//
// ─── FLAGS ─────────────────────────────────────────────────────────────────────
//

/// Persisted boolean flags the session store keeps per browser/user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFlag {
    Authenticated,
    OnboardingComplete,
}

impl SessionFlag {
    pub const ALL: [SessionFlag; 2] = [SessionFlag::Authenticated, SessionFlag::OnboardingComplete];

    /// Storage key used by session store backends.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::OnboardingComplete => "onboarding_complete",
        }
    }
}

impl fmt::Display for SessionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Derived session state; never stored directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Unauthenticated,
    PendingOnboarding,
    Active,
}

impl SessionStatus {
    #[must_use]
    pub fn from_flags(authenticated: bool, onboarding_complete: bool) -> Self {
        match (authenticated, onboarding_complete) {
            (false, _) => Self::Unauthenticated,
            (true, false) => Self::PendingOnboarding,
            (true, true) => Self::Active,
        }
    }

    #[must_use]
    pub fn is_authenticated(self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

//
// ─── ROUTES ────────────────────────────────────────────────────────────────────
//

/// Application locations the guard knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Onboarding,
    Home,
    Assessment,
    Results,
    Other(String),
}

impl Route {
    #[must_use]
    pub fn parse(path: &str) -> Self {
        match path.trim().trim_matches('/') {
            "" => Self::Home,
            "login" => Self::Login,
            "onboarding" => Self::Onboarding,
            "assessment" => Self::Assessment,
            "results" => Self::Results,
            other => Self::Other(format!("/{other}")),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Login => "/login",
            Self::Onboarding => "/onboarding",
            Self::Home => "/",
            Self::Assessment => "/assessment",
            Self::Results => "/results",
            Self::Other(path) => path,
        }
    }
}

impl FromStr for Route {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

//
// ─── DECISION TABLE ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Stay,
    Redirect(Route),
}

impl RouteDecision {
    /// Route the caller ends up on after following this decision.
    #[must_use]
    pub fn target<'a>(&'a self, current: &'a Route) -> &'a Route {
        match self {
            Self::Stay => current,
            Self::Redirect(route) => route,
        }
    }
}

/// Decides whether `route` may be shown for `status`.
///
/// A pending-onboarding user on the login page is sent to onboarding,
/// the same way an active user on the login page is sent home.
#[must_use]
pub fn resolve(status: SessionStatus, route: &Route) -> RouteDecision {
    match (status, route) {
        (SessionStatus::Unauthenticated, Route::Login) => RouteDecision::Stay,
        (SessionStatus::Unauthenticated, _) => RouteDecision::Redirect(Route::Login),
        (SessionStatus::PendingOnboarding, Route::Onboarding) => RouteDecision::Stay,
        (SessionStatus::PendingOnboarding, _) => RouteDecision::Redirect(Route::Onboarding),
        (SessionStatus::Active, Route::Onboarding | Route::Login) => {
            RouteDecision::Redirect(Route::Home)
        }
        (SessionStatus::Active, _) => RouteDecision::Stay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_derived_from_flags() {
        assert_eq!(SessionStatus::from_flags(false, true), SessionStatus::Unauthenticated);
        assert_eq!(SessionStatus::from_flags(true, false), SessionStatus::PendingOnboarding);
        assert_eq!(SessionStatus::from_flags(true, true), SessionStatus::Active);
    }

    #[test]
    fn route_parsing_ignores_trailing_slash() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse("/login/"), Route::Login);
        assert_eq!(Route::parse("results"), Route::Results);
        assert_eq!(Route::parse("/reports"), Route::Other("/reports".into()));
        assert_eq!(Route::Home.to_string(), "/");
    }

    #[test]
    fn anonymous_users_go_to_login() {
        let home = Route::Home;
        assert_eq!(
            resolve(SessionStatus::Unauthenticated, &home),
            RouteDecision::Redirect(Route::Login)
        );
        assert_eq!(
            resolve(SessionStatus::Unauthenticated, &Route::Onboarding),
            RouteDecision::Redirect(Route::Login)
        );
        assert_eq!(resolve(SessionStatus::Unauthenticated, &Route::Login), RouteDecision::Stay);
    }

    #[test]
    fn pending_onboarding_is_pinned_to_onboarding() {
        assert_eq!(
            resolve(SessionStatus::PendingOnboarding, &Route::Home),
            RouteDecision::Redirect(Route::Onboarding)
        );
        assert_eq!(
            resolve(SessionStatus::PendingOnboarding, &Route::Assessment),
            RouteDecision::Redirect(Route::Onboarding)
        );
        assert_eq!(
            resolve(SessionStatus::PendingOnboarding, &Route::Login),
            RouteDecision::Redirect(Route::Onboarding)
        );
        assert_eq!(
            resolve(SessionStatus::PendingOnboarding, &Route::Onboarding),
            RouteDecision::Stay
        );
    }

    #[test]
    fn active_users_leave_login_and_onboarding() {
        assert_eq!(
            resolve(SessionStatus::Active, &Route::Onboarding),
            RouteDecision::Redirect(Route::Home)
        );
        assert_eq!(
            resolve(SessionStatus::Active, &Route::Login),
            RouteDecision::Redirect(Route::Home)
        );
        assert_eq!(resolve(SessionStatus::Active, &Route::Home), RouteDecision::Stay);
        assert_eq!(resolve(SessionStatus::Active, &Route::Results), RouteDecision::Stay);
    }

    #[test]
    fn redirect_target_follows_decision() {
        let here = Route::Assessment;
        assert_eq!(RouteDecision::Stay.target(&here), &Route::Assessment);
        let redirect = RouteDecision::Redirect(Route::Login);
        assert_eq!(redirect.target(&here), &Route::Login);
    }
}
