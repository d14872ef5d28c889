//! Capabilities the gate consumes from the identity/session layer.
//!
//! The gate never speaks the identity protocol itself. An application plugs
//! in an [`IdentityProvider`] that knows how to read the session attached to a
//! request (usually placed in the request extensions by an earlier session
//! layer), how to refresh an access token, and how to start the interactive
//! login and logout flows.

use {
    crate::{Error, Result, utils::Sensitive},
    async_trait::async_trait,
    axum::response::{IntoResponse, Response},
    chrono::{DateTime, TimeDelta, Utc},
    http::{HeaderValue, StatusCode, header::LOCATION, request::Parts},
    std::{sync::Arc, time::Duration},
};

/// A bearer credential presented to backend APIs.
///
/// The value is redacted in `Debug` output and zeroed on drop.
#[derive(Clone, PartialEq, Debug)]
pub struct AccessToken(Sensitive<String>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Sensitive(token.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0.0
    }

    /// Formats the token as an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if the token contains characters that
    /// are not allowed in a header.
    pub fn bearer_header(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.as_str()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// The access token currently held by a session, with its expiry.
#[derive(Clone, Debug)]
pub struct StoredToken {
    pub token: AccessToken,
    /// `None` means the provider did not report an expiry; such a token is
    /// treated as never expiring.
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    pub fn new(token: AccessToken, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Whether the token expires within `leeway` from now.
    pub fn is_expired(&self, leeway: Duration) -> bool {
        self.is_expired_at(Utc::now(), leeway)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        match TimeDelta::from_std(leeway)
            .ok()
            .and_then(|leeway| now.checked_add_signed(leeway))
        {
            Some(deadline) => expires_at <= deadline,
            None => true,
        }
    }
}

/// Per-request view of the caller's session.
///
/// Held behind an `Arc` so that a refresh can outlive the request that
/// started it.
#[async_trait]
pub trait SessionContext: Send + Sync + 'static {
    /// Whether the request belongs to an active session.
    fn is_authenticated(&self) -> bool;

    /// The access token stored in the session, if any.
    fn access_token(&self) -> Option<StoredToken>;

    /// Exchanges the session's refresh token for a new access token.
    ///
    /// Implementations should persist the new token in the session store.
    /// Any error is treated as a dead session. The call runs to completion
    /// even if the client disconnects while it is in flight.
    async fn refresh(&self) -> Result<AccessToken>;
}

/// Options handed to [`IdentityProvider::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptions {
    /// Local login URL including the encoded `returnTo` parameter.
    pub url: String,
    /// Sanitized location to come back to after login.
    pub return_to: String,
}

/// Options handed to [`IdentityProvider::logout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOptions {
    /// Local logout URL including the encoded `returnTo` parameter.
    pub url: String,
    /// Fixed safe path to land on after logout.
    pub return_to: String,
}

/// The identity layer the gate delegates to.
///
/// The default `login`/`logout` implementations answer with a `302 Found` to
/// the local login/logout endpoint, which is where most applications mount
/// their OIDC client routes.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Returns the session context for a request.
    fn session(&self, parts: &Parts) -> Arc<dyn SessionContext>;

    /// Starts the interactive login flow.
    fn login(&self, options: LoginOptions) -> Response {
        found(&options.url)
    }

    /// Starts the logout flow.
    fn logout(&self, options: LogoutOptions) -> Response {
        found(&options.url)
    }
}

/// Builds a `302 Found` response to `location`.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(err) => Error::from(err).into_response(),
    }
}
