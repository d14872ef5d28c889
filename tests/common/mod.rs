//! Shared test infrastructure: a header-driven identity provider and router builders.
//!
//! The mock session is described by request headers so every test can state
//! its scenario inline:
//!
//! - `x-test-session: active` marks the request as authenticated
//! - `x-test-token: valid | expired` selects the stored access token (absent: no token)

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, routing::get};
use axum_authgate::{
    AccessToken, AuthContext, AuthGate, BearerToken, Config, Error, IdentityProvider, Result,
    SessionContext, StoredToken,
};
use chrono::{TimeDelta, Utc};
use http::request::Parts;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

pub const SESSION_HEADER: &str = "x-test-session";
pub const TOKEN_HEADER: &str = "x-test-token";

/// Counters shared between the provider and the test body.
#[derive(Debug, Default)]
pub struct Calls {
    pub sessions: AtomicUsize,
    pub refreshes: AtomicUsize,
}

impl Calls {
    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

pub struct MockProvider {
    pub refresh_succeeds: bool,
    pub calls: Arc<Calls>,
}

impl MockProvider {
    pub fn new(refresh_succeeds: bool) -> (Self, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        (
            Self {
                refresh_succeeds,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

struct MockSession {
    authenticated: bool,
    stored: Option<StoredToken>,
    refresh_succeeds: bool,
    calls: Arc<Calls>,
}

#[async_trait]
impl SessionContext for MockSession {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn access_token(&self) -> Option<StoredToken> {
        self.stored.clone()
    }

    async fn refresh(&self) -> Result<AccessToken> {
        self.calls.refreshes.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.refresh_succeeds {
            Ok(AccessToken::new("refreshed-token"))
        } else {
            Err(Error::identity("refresh token is no longer valid"))
        }
    }
}

impl IdentityProvider for MockProvider {
    fn session(&self, parts: &Parts) -> Arc<dyn SessionContext> {
        self.calls.sessions.fetch_add(1, Ordering::SeqCst);
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };

        let stored = match header(TOKEN_HEADER).as_deref() {
            Some("valid") => Some(StoredToken::new(
                AccessToken::new("stored-token"),
                Some(Utc::now() + TimeDelta::minutes(5)),
            )),
            Some("expired") => Some(StoredToken::new(
                AccessToken::new("stale-token"),
                Some(Utc::now() - TimeDelta::minutes(5)),
            )),
            _ => None,
        };

        Arc::new(MockSession {
            authenticated: header(SESSION_HEADER).as_deref() == Some("active"),
            stored,
            refresh_succeeds: self.refresh_succeeds,
            calls: Arc::clone(&self.calls),
        })
    }
}

/// Route table of a meeting/committee admin app.
const GATE_CONFIG_TOML: &str = r#"
[auth]
login_path = "/login"
logout_path = "/logout"
post_logout_path = "/"
allowed_return_urls = ["https://admin.example.org"]

[auth.default_route]
kind = "ssr"
auth_level = "required"

[[auth.routes]]
prefix = "/api/health"
kind = "api"
auth_level = "public"

[[auth.routes]]
regex = "^/meetings/[0-9]+/agenda$"
kind = "ssr"
auth_level = "optional"

[[auth.routes]]
prefix = "/api"
kind = "api"
auth_level = "required"
token_required = true

[[auth.routes]]
prefix = "/dashboard"
kind = "ssr"
auth_level = "required"

[[auth.routes]]
prefix = "/committees"
kind = "ssr"
auth_level = "required"
token_required = true

[logging]
format = "json"
"#;

pub fn create_test_config() -> Config {
    GATE_CONFIG_TOML
        .parse()
        .expect("Failed to parse test config TOML")
}

async fn whoami(auth: AuthContext) -> String {
    auth.token
        .map(|token| token.as_str().to_owned())
        .unwrap_or_else(|| "anonymous".into())
}

async fn members(BearerToken(token): BearerToken) -> String {
    format!("members via {}", token.as_str())
}

pub fn app_routes() -> Router {
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/meetings", get(whoami).post(whoami))
        .route("/api/lists/members", get(members))
        .route("/meetings/{id}/agenda", get(whoami))
        .route("/dashboard", get(whoami).post(whoami))
        .route("/committees", get(whoami))
}

pub fn create_test_router(refresh_succeeds: bool) -> (Router, Arc<Calls>) {
    let (provider, calls) = MockProvider::new(refresh_succeeds);
    let gate = AuthGate::new(&create_test_config().auth, provider).expect("Failed to build gate");
    (gate.apply(app_routes()), calls)
}
