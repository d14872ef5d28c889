//! The authentication gate middleware.
//!
//! The gate is split across submodules, one per stage of a request:
//!
//! - [`classifier`] - Route rules and first-match classification
//! - [`status`] - Session authentication status
//! - [`token`] - Bearer token lifecycle and refresh
//! - [`decision`] - The pure decision table
//! - [`executor`] - Side effects of a decision
//! - [`return_to`] - Open-redirect defense for login redirects
//! - [`provider`] - Capabilities consumed from the identity layer
//! - [`render`] - Client-appropriate error rendering
//! - [`context`] - Request extensions and extractors for handlers
//!
//! Per request: classify → check status → resolve token (only for routes
//! that need one) → decide → execute. The only suspension point is the token
//! refresh.

mod classifier;
mod context;
mod decision;
mod executor;
mod provider;
mod render;
mod return_to;
mod status;
mod token;

pub use classifier::*;
pub use context::*;
pub use decision::*;
pub use provider::*;
pub use render::*;
pub use return_to::*;
pub use token::*;

use {
    crate::{AuthConfig, Result},
    axum::{
        Router,
        extract::{Request, State},
        middleware::{self, Next},
        response::Response,
    },
    executor::DecisionExecutor,
    std::sync::Arc,
};

/// Route-aware authentication middleware.
///
/// Built once at startup from an [`AuthConfig`] and an [`IdentityProvider`];
/// cloning is cheap and every clone shares the same immutable state.
///
/// ```rust,ignore
/// use axum::{Router, routing::get};
/// use axum_authgate::{AuthGate, Config};
///
/// let config = Config::default();
/// config.setup_tracing();
///
/// let gate = AuthGate::new(&config.auth, MyOidcProvider::new())?;
/// let app = gate.apply(
///     Router::new()
///         .route("/dashboard", get(dashboard))
///         .route("/api/meetings", get(list_meetings)),
/// );
/// ```
#[derive(Clone)]
pub struct AuthGate {
    routes: Arc<RouteTable>,
    engine: Arc<DecisionEngine>,
    tokens: TokenManager,
    provider: Arc<dyn IdentityProvider>,
    executor: Arc<DecisionExecutor>,
}

impl AuthGate {
    /// Creates a gate rendering errors with [`DefaultErrorRenderer`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration does not validate.
    pub fn new(config: &AuthConfig, provider: impl IdentityProvider) -> Result<Self> {
        Self::from_shared(config, Arc::new(provider))
    }

    /// Same as [`AuthGate::new`] for a provider that is already shared.
    pub fn from_shared(config: &AuthConfig, provider: Arc<dyn IdentityProvider>) -> Result<Self> {
        config.validate()?;

        let executor = DecisionExecutor::new(
            Arc::clone(&provider),
            Arc::new(DefaultErrorRenderer),
            &config.logout_path,
            config.post_logout_path.clone(),
        );

        Ok(Self {
            routes: Arc::new(config.route_table()?),
            engine: Arc::new(DecisionEngine::new(
                config.login_path.clone(),
                config.return_to_policy()?,
            )),
            tokens: TokenManager::new(config.token_expiry_leeway),
            provider,
            executor: Arc::new(executor),
        })
    }

    /// Replaces the error renderer.
    #[must_use]
    pub fn with_error_renderer(mut self, renderer: impl ErrorRenderer) -> Self {
        self.executor = Arc::new(self.executor.with_renderer(Arc::new(renderer)));
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Wraps every route of `router`, including its fallback, with the gate.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self, auth_gate_middleware))
    }

    /// Runs one request through the gate.
    pub async fn handle(&self, request: Request, next: Next) -> Response {
        let path = request.uri().path().to_owned();
        let original_url = request
            .uri()
            .path_and_query()
            .map_or_else(|| path.clone(), |pq| pq.as_str().to_owned());
        let method = request.method().clone();

        let rule = self.routes.classify(&path);
        tracing::debug!(
            path = %path,
            route = %rule.pattern,
            kind = %rule.kind,
            auth_level = %rule.auth_level,
            "Request classified"
        );

        let (parts, body) = request.into_parts();
        let (state, token) = if rule.auth_level == AuthLevel::Public {
            (RequestAuthState::default(), None)
        } else {
            let session = self.provider.session(&parts);
            let authenticated = status::is_authenticated(session.as_ref());
            let outcome = match rule.token_policy() {
                Some(policy) => self
                    .tokens
                    .scope(Arc::clone(&session))
                    .resolve(authenticated, policy.attempt_refresh())
                    .await
                    .clone(),
                None => TokenOutcome::default(),
            };
            let state = RequestAuthState {
                authenticated,
                has_token: outcome.has_token,
                needs_logout: outcome.needs_logout,
            };
            (state, outcome.token)
        };

        let decision = self.engine.decide(rule, state, &method, &original_url);
        let context = AuthContext {
            route_kind: rule.kind,
            auth_level: rule.auth_level,
            authenticated: state.authenticated,
            token,
        };

        self.executor
            .execute(decision, rule, context, Request::from_parts(parts, body), next)
            .await
    }
}

/// Middleware function form of [`AuthGate::handle`], for use with
/// `axum::middleware::from_fn_with_state`.
pub async fn auth_gate_middleware(
    State(gate): State<AuthGate>,
    request: Request,
    next: Next,
) -> Response {
    gate.handle(request, next).await
}
