//! # axum-authgate
//!
//! A route-aware authentication gate for Axum services that mix server-rendered
//! pages and JSON APIs behind one session.
//!
//! Every request is classified against an ordered list of route rules, its
//! session and bearer token are checked (refreshing an expired token at most
//! once), and the gate then does exactly one of:
//!
//! - continue to the handler, with an [`AuthContext`] in the request extensions,
//! - redirect a browser to the login page (`302`, open-redirect safe `returnTo`),
//! - log a dead session out and land on a fixed safe page (`302`),
//! - answer with a typed error rendered for the client (JSON 401 for APIs).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use axum_authgate::{AuthGate, Config, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();  // Loads from config/{RUST_ENV}.toml
//!     config.setup_tracing();
//!
//!     let gate = AuthGate::new(&config.auth, MySessionProvider::default())?;
//!     let app = gate.apply(
//!         Router::new()
//!             .route("/api/health", get(|| async { "OK" }))
//!             .route("/dashboard", get(dashboard)),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! With `config/dev.toml`:
//! ```toml
//! [auth]
//! allowed_return_urls = ["https://admin.example.org"]
//!
//! [[auth.routes]]
//! prefix = "/api/health"
//! kind = "api"
//! auth_level = "public"
//!
//! [[auth.routes]]
//! prefix = "/api"
//! kind = "api"
//! auth_level = "required"
//! token_required = true
//! ```
//!
//! # Decision Table
//!
//! | Route | Session | Method | Outcome |
//! |-------|---------|--------|---------|
//! | `public` | any | any | continue |
//! | `optional` | any (even dead) | any | continue |
//! | `required` | dead (refresh failed) | SSR GET | logout, `302` to safe path |
//! | `required` | dead (refresh failed) | API or non-GET | `401` |
//! | `required` | none | SSR GET | `302` to `/login?returnTo=...` |
//! | `required` | none | API or non-GET | `401` |
//! | `required` + `token_required` | active, no token | any | `401` |
//! | `required` | active | any | continue |
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Configuration loading and validation ([`Config`]) |
//! | [`gate`] | Classification, token lifecycle, decisions ([`AuthGate`]) |
//! | [`error`] | Error types and handling ([`Error`]) |
//! | [`utils`] | Utilities ([`Sensitive`], env substitution) |
mod config;
mod error;
mod gate;
mod utils;

pub use config::*;
pub use error::*;
pub use gate::*;
pub use utils::*;

pub type Result<T> = std::result::Result<T, Error>;
