//! Bearer token lifecycle: read the session token, refresh it when expired.
//!
//! The outcome is returned as a [`TokenOutcome`] value instead of being
//! attached to the request behind the caller's back. A [`RequestTokens`]
//! scope caches that outcome, so however many times a request asks for its
//! token the identity provider sees at most one refresh call.
//!
//! The refresh runs on its own task. If the request future is dropped while
//! the refresh is in flight (client disconnect, timeout), the refresh still
//! completes and the provider persists the rotated token; only the outcome
//! is discarded.

use {
    super::provider::{AccessToken, SessionContext},
    std::{sync::Arc, time::Duration},
    tokio::sync::OnceCell,
};

/// Result of resolving the bearer token for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenOutcome {
    pub has_token: bool,
    /// The session is authenticated but its refresh token no longer works.
    pub needs_logout: bool,
    pub token: Option<AccessToken>,
}

impl TokenOutcome {
    fn absent() -> Self {
        Self::default()
    }

    fn present(token: AccessToken) -> Self {
        Self {
            has_token: true,
            needs_logout: false,
            token: Some(token),
        }
    }

    fn dead_session() -> Self {
        Self {
            has_token: false,
            needs_logout: true,
            token: None,
        }
    }
}

/// Resolves bearer tokens against a session.
#[derive(Debug, Clone, Copy)]
pub struct TokenManager {
    leeway: Duration,
}

impl TokenManager {
    /// `leeway` makes a token that expires within that window count as expired.
    pub fn new(leeway: Duration) -> Self {
        Self { leeway }
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// Opens a request-scoped resolver for `session`.
    pub fn scope(&self, session: Arc<dyn SessionContext>) -> RequestTokens {
        RequestTokens {
            manager: *self,
            session,
            outcome: OnceCell::new(),
        }
    }

    async fn evaluate(
        &self,
        session: &Arc<dyn SessionContext>,
        authenticated: bool,
        attempt_refresh: bool,
    ) -> TokenOutcome {
        if !authenticated {
            return TokenOutcome::absent();
        }

        // A session with no stored token is handled like one whose token expired.
        if let Some(stored) = session.access_token()
            && !stored.is_expired(self.leeway)
        {
            return TokenOutcome::present(stored.token);
        }

        if !attempt_refresh {
            tracing::debug!("Access token expired, refresh skipped for this route");
            return TokenOutcome::absent();
        }

        // Dropping the JoinHandle detaches the task instead of cancelling it.
        let session = Arc::clone(session);
        let refresh = tokio::spawn(async move { session.refresh().await });

        match refresh.await {
            Ok(Ok(token)) => {
                tracing::debug!("Access token refreshed");
                TokenOutcome::present(token)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, kind = ?err.kind(), "Access token refresh failed");
                TokenOutcome::dead_session()
            }
            Err(err) => {
                tracing::warn!(error = %err, "Access token refresh task failed");
                TokenOutcome::dead_session()
            }
        }
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

/// Token resolution bound to a single request.
pub struct RequestTokens {
    manager: TokenManager,
    session: Arc<dyn SessionContext>,
    outcome: OnceCell<TokenOutcome>,
}

impl RequestTokens {
    /// Resolves the token, refreshing it at most once per scope.
    ///
    /// The first call decides the outcome; later calls return it unchanged.
    pub async fn resolve(&self, authenticated: bool, attempt_refresh: bool) -> &TokenOutcome {
        self.outcome
            .get_or_init(|| self.manager.evaluate(&self.session, authenticated, attempt_refresh))
            .await
    }
}
