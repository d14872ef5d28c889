//! Request-scoped authentication outcome, available to handlers behind the gate.

use {
    super::{
        classifier::{AuthLevel, RouteKind},
        provider::AccessToken,
    },
    crate::{Error, Result},
    axum::extract::FromRequestParts,
    http::request::Parts,
};

/// What the gate established about an allowed request.
///
/// Inserted into the request extensions before the handler runs.
///
/// ```rust,ignore
/// use axum_authgate::AuthContext;
///
/// async fn agenda(auth: AuthContext) -> String {
///     if auth.token.is_some() {
///         "agenda with private notes".into()
///     } else {
///         "public agenda".into()
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub route_kind: RouteKind,
    pub auth_level: AuthLevel,
    pub authenticated: bool,
    pub token: Option<AccessToken>,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| Error::internal("AuthContext missing: route is not behind AuthGate"))
    }
}

/// Extracts the bearer token, rejecting the request with a 401 when the
/// gate did not obtain one.
///
/// ```rust,ignore
/// use axum_authgate::BearerToken;
///
/// async fn list_members(BearerToken(token): BearerToken) -> String {
///     backend.members(token.bearer_header()?).await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BearerToken(pub AccessToken);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        AuthContext::from_request_parts(parts, state)
            .await?
            .token
            .map(BearerToken)
            .ok_or_else(|| Error::authentication("Bearer token not available"))
    }
}
