//!
//! Configuration structures for wiring up the authentication gate.
//!
//! A configuration can be created in many ways:
//! - From an environment-specific TOML file via `Config::from_rust_env` or `Config::from_toml_file`
//! - From a TOML string via `Config::from_toml` or `str::parse`
//! - Constructed programmatically via the builder methods on `Config`
//!
//! In the TOML-based methods, environment variables can be referenced using
//! the {{ VAR_NAME }} syntax and are substituted with the corresponding
//! environment variable value (see `replace_handlebars_with_env`).
//!
//! Configuration is split into logical sections:
//!
//! - `AuthConfig` for route rules, login/logout endpoints and token handling
//! - `LoggingConfig` for logging and tracing settings
//!
//! The configuration is read once at startup and never mutated afterwards.
//!
mod auth;
mod logging;

pub use auth::*;
pub use logging::*;

use {
    crate::{AuthLevel, Error, Result, RouteKind, utils::replace_handlebars_with_env},
    serde::Deserialize,
    std::{env, fs, str::FromStr, time::Duration},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    ///
    /// Creates a default configuration.
    /// This will attempt to load configuration from the file based on the RUST_ENV
    /// environment variable falling back to a default configuration if the environment
    /// variable is not set. Configuration files should be located in the "config/"
    /// directory of your project.
    ///
    fn default() -> Self {
        match Self::from_rust_env() {
            Ok(config) => config,
            Err(_) => Config {
                auth: AuthConfig::default(),
                logging: LoggingConfig::default(),
            },
        }
    }
}

impl Config {
    ///
    /// Loads the configuration from "config/{RUST_ENV}.toml".
    /// Fails if RUST_ENV is not set.
    ///
    pub fn from_rust_env() -> Result<Config> {
        Self::from_toml_file(env::var("RUST_ENV")?)
    }

    ///
    /// Given an environment name, loads "config/{env}.toml", substitutes any
    /// environment variables, and parses the result.
    ///
    pub fn from_toml_file(env: impl AsRef<str>) -> Result<Config> {
        let path = format!("config/{}.toml", env.as_ref());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    ///
    /// Parses a configuration string in TOML format into a Config struct.
    ///
    pub fn from_toml(toml_str: &str) -> Result<Config> {
        toml_str.parse()
    }

    /// Appends a route rule. Rules are matched in insertion order.
    pub fn with_route(mut self, rule: RouteRuleConfig) -> Self {
        self.auth.routes.push(rule);
        self
    }

    /// Sets the classification used for paths that match no rule.
    pub fn with_default_route(mut self, kind: RouteKind, auth_level: AuthLevel) -> Self {
        self.auth.default_route.kind = kind;
        self.auth.default_route.auth_level = auth_level;
        self
    }

    /// Sets the login endpoint of the AuthConfig.
    pub fn with_login_path(mut self, path: &str) -> Self {
        self.auth.login_path = path.into();
        self
    }

    /// Sets the logout endpoint of the AuthConfig.
    pub fn with_logout_path(mut self, path: &str) -> Self {
        self.auth.logout_path = path.into();
        self
    }

    /// Sets the fixed landing path after a forced logout.
    pub fn with_post_logout_path(mut self, path: &str) -> Self {
        self.auth.post_logout_path = path.into();
        self
    }

    /// Sets the fallback for rejected return-to URLs.
    pub fn with_default_return_path(mut self, path: &str) -> Self {
        self.auth.default_return_path = path.into();
        self
    }

    /// Adds an absolute base URL that login redirects may return to.
    pub fn with_allowed_return_url(mut self, url: &str) -> Self {
        self.auth.allowed_return_urls.push(url.into());
        self
    }

    /// Sets the token expiry leeway of the AuthConfig.
    pub fn with_token_expiry_leeway(mut self, leeway: Duration) -> Self {
        self.auth.token_expiry_leeway = leeway;
        self
    }

    /// Sets the log format of the LoggingConfig.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.logging.format = format;
        self
    }

    /// Ensures that the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        self.auth.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    ///
    /// Sets up the tracing subscriber for logging based on the LoggingConfig.
    ///
    /// NOTE: This should be called early during startup to ensure logging is configured
    ///       before any log messages are emitted.
    ///
    pub fn setup_tracing(&self) {
        use tracing_subscriber::{EnvFilter, prelude::*};
        let env_filter = EnvFilter::from_default_env();
        match self.logging.format {
            LogFormat::Json => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().json())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Default => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Compact => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().compact())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Pretty => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .with(env_filter)
                    .try_init();
            }
        }
    }
}

///
/// Parses a configuration string with references to environment variables
/// into a Config struct by substituting the environment variables and then
/// parsing the resulting TOML.
///
impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let config = toml::from_str::<Config>(&config_file)?;
        Ok(config)
    }
}
