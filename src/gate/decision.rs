//! The decision table.
//!
//! [`DecisionEngine::decide`] turns the classified route and the per-request
//! authentication state into exactly one [`Decision`]. It performs no I/O
//! besides logging and reads nothing but its arguments and the immutable
//! login configuration.
//!
//! Clause order matters:
//!
//! 1. `public` routes are allowed.
//! 2. `optional` routes are allowed, even when the session is dead. Forcing a
//!    logout here loops forever when the refresh token is permanently invalid.
//! 3. A dead session on a `required` route logs out browsers (SSR + GET) and
//!    answers everything else with a 401.
//! 4. Unauthenticated `required` requests are redirected to login (SSR + GET)
//!    or rejected with a 401; token-requiring routes without a token get a 401.
//! 5. Everything else is allowed.

use {
    super::{
        classifier::{AuthLevel, RouteKind, RouteRule},
        return_to::ReturnToPolicy,
    },
    crate::{ErrorKind, utils::encode_query_value},
    http::{Method, StatusCode},
};

/// Authentication facts gathered for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestAuthState {
    pub authenticated: bool,
    pub has_token: bool,
    pub needs_logout: bool,
}

/// What the gate does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Continue to the handler.
    Allow,
    /// Start the interactive login flow.
    Redirect {
        /// Login URL carrying the encoded `returnTo` parameter.
        url: String,
        /// Sanitized location the user returns to after login.
        return_to: String,
    },
    /// Terminate the dead session and land on the safe post-logout path.
    Logout,
    /// Hand a typed error to the error renderer.
    Error {
        kind: ErrorKind,
        status_code: StatusCode,
    },
}

impl Decision {
    pub fn unauthorized() -> Self {
        Decision::Error {
            kind: ErrorKind::Authentication,
            status_code: StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    login_path: String,
    return_to: ReturnToPolicy,
}

impl DecisionEngine {
    pub fn new(login_path: impl Into<String>, return_to: ReturnToPolicy) -> Self {
        Self {
            login_path: login_path.into(),
            return_to,
        }
    }

    /// Decides what happens to a request.
    ///
    /// `original_url` is the request path and query; it only matters when
    /// the decision is a login redirect.
    pub fn decide(
        &self,
        rule: &RouteRule,
        state: RequestAuthState,
        method: &Method,
        original_url: &str,
    ) -> Decision {
        let browser_navigation = rule.kind == RouteKind::Ssr && *method == Method::GET;

        match rule.auth_level {
            AuthLevel::Public => {
                tracing::debug!(
                    route = %rule.pattern,
                    path = %original_url,
                    auth_level = %rule.auth_level,
                    branch = "public",
                    "Allowing request"
                );
                return Decision::Allow;
            }
            AuthLevel::Optional => {
                tracing::debug!(
                    route = %rule.pattern,
                    path = %original_url,
                    auth_level = %rule.auth_level,
                    branch = "optional",
                    has_token = state.has_token,
                    needs_logout = state.needs_logout,
                    "Allowing request"
                );
                return Decision::Allow;
            }
            AuthLevel::Required => {}
        }

        if state.needs_logout {
            if browser_navigation {
                tracing::info!(
                    route = %rule.pattern,
                    path = %original_url,
                    auth_level = %rule.auth_level,
                    branch = "dead_session",
                    "Logging out"
                );
                return Decision::Logout;
            }
            tracing::warn!(
                route = %rule.pattern,
                path = %original_url,
                auth_level = %rule.auth_level,
                branch = "dead_session",
                kind = %rule.kind,
                method = %method,
                "Rejecting request with 401"
            );
            return Decision::unauthorized();
        }

        if !state.authenticated {
            if browser_navigation {
                let return_to = self.return_to.sanitize(original_url);
                let url = self.login_url(&return_to);
                tracing::info!(
                    route = %rule.pattern,
                    path = %original_url,
                    auth_level = %rule.auth_level,
                    branch = "unauthenticated",
                    login_url = %url,
                    "Redirecting to login"
                );
                return Decision::Redirect { url, return_to };
            }
            tracing::warn!(
                route = %rule.pattern,
                path = %original_url,
                auth_level = %rule.auth_level,
                branch = "unauthenticated",
                kind = %rule.kind,
                method = %method,
                "Rejecting request with 401"
            );
            return Decision::unauthorized();
        }

        if rule.token_required && !state.has_token {
            tracing::warn!(
                route = %rule.pattern,
                path = %original_url,
                auth_level = %rule.auth_level,
                branch = "token_missing",
                "Rejecting request with 401"
            );
            return Decision::unauthorized();
        }

        tracing::debug!(
            route = %rule.pattern,
            path = %original_url,
            auth_level = %rule.auth_level,
            branch = "authenticated",
            "Allowing request"
        );
        Decision::Allow
    }

    fn login_url(&self, return_to: &str) -> String {
        format!("{}?returnTo={}", self.login_path, encode_query_value(return_to))
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new("/login", ReturnToPolicy::default())
    }
}
