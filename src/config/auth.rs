//! Authentication gate configuration.
//!
//! # Example
//!
//! ```toml
//! [auth]
//! login_path = "/login"
//! logout_path = "/logout"
//! post_logout_path = "/"
//! allowed_return_urls = ["https://admin.example.org"]
//! token_expiry_leeway = "30s"
//!
//! [auth.default_route]
//! kind = "ssr"
//! auth_level = "required"
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
//! # Important
//!
//! Rules are matched in the order they are listed. Put the most specific
//! rules first.

use {
    crate::{
        AuthLevel, DefaultRoute, Error, Result, ReturnToPolicy, RouteKind, RoutePattern,
        RouteRule, RouteTable,
    },
    serde::Deserialize,
    std::time::Duration,
};

/// A single route rule as written in TOML.
///
/// Exactly one of `prefix` and `regex` must be set.
///
/// ```toml
/// [[auth.routes]]
/// regex = "^/meetings/[0-9]+/agenda$"
/// kind = "ssr"
/// auth_level = "optional"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouteRuleConfig {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    pub kind: RouteKind,
    pub auth_level: AuthLevel,
    #[serde(default)]
    pub token_required: bool,
}

impl RouteRuleConfig {
    /// Creates a prefix rule.
    pub fn prefix(prefix: &str, kind: RouteKind, auth_level: AuthLevel) -> Self {
        Self {
            prefix: Some(prefix.into()),
            regex: None,
            kind,
            auth_level,
            token_required: false,
        }
    }

    /// Creates a regex rule.
    pub fn regex(regex: &str, kind: RouteKind, auth_level: AuthLevel) -> Self {
        Self {
            prefix: None,
            regex: Some(regex.into()),
            kind,
            auth_level,
            token_required: false,
        }
    }

    #[must_use]
    pub fn token_required(mut self, token_required: bool) -> Self {
        self.token_required = token_required;
        self
    }

    /// Compiles the rule.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if both or neither pattern is set, the
    /// regex does not compile, or the prefix is not an absolute path.
    pub fn to_rule(&self) -> Result<RouteRule> {
        let pattern = match (&self.prefix, &self.regex) {
            (Some(prefix), None) => RoutePattern::prefix(prefix.clone()),
            (None, Some(regex)) => RoutePattern::regex(regex)?,
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "Route rule sets both 'prefix' and 'regex'. Use exactly one per [[auth.routes]] entry.",
                ));
            }
            (None, None) => {
                return Err(Error::config(
                    "Route rule needs a pattern. Set prefix = \"/path\" or regex = \"^/path\" in [[auth.routes]].",
                ));
            }
        };

        let rule = RouteRule::new(pattern, self.kind, self.auth_level)
            .with_token_required(self.token_required);
        RouteTable::validate_rule(&rule)?;
        Ok(rule)
    }
}

///
/// Configuration of the authentication gate.
///
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Local endpoint that starts the interactive login flow.
    /// By default `login_path` is "/login".
    #[serde(default = "AuthConfig::default_login_path")]
    pub login_path: String,

    /// Local endpoint that terminates the session.
    /// By default `logout_path` is "/logout".
    #[serde(default = "AuthConfig::default_logout_path")]
    pub logout_path: String,

    /// Where users land after a forced logout. Never taken from the request.
    /// By default `post_logout_path` is "/".
    #[serde(default = "AuthConfig::default_local_path")]
    pub post_logout_path: String,

    /// Fallback for return-to URLs that fail validation.
    /// By default `default_return_path` is "/".
    #[serde(default = "AuthConfig::default_local_path")]
    pub default_return_path: String,

    /// Absolute base URLs that login redirects may return to.
    /// Local paths are always accepted.
    #[serde(default)]
    pub allowed_return_urls: Vec<String>,

    /// Tokens expiring within this window are treated as expired.
    /// By default `token_expiry_leeway` is 30 seconds.
    #[serde(
        default = "AuthConfig::default_token_expiry_leeway",
        with = "humantime_serde"
    )]
    pub token_expiry_leeway: Duration,

    /// Classification of paths that match no rule.
    /// By default unmatched paths are `ssr` + `required`.
    #[serde(default)]
    pub default_route: DefaultRoute,

    /// Ordered route rules; the first match wins.
    #[serde(default)]
    pub routes: Vec<RouteRuleConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: Self::default_login_path(),
            logout_path: Self::default_logout_path(),
            post_logout_path: Self::default_local_path(),
            default_return_path: Self::default_local_path(),
            allowed_return_urls: Vec::new(),
            token_expiry_leeway: Self::default_token_expiry_leeway(),
            default_route: DefaultRoute::default(),
            routes: Vec::new(),
        }
    }
}

impl AuthConfig {
    fn default_login_path() -> String {
        "/login".into()
    }

    fn default_logout_path() -> String {
        "/logout".into()
    }

    fn default_local_path() -> String {
        "/".into()
    }

    fn default_token_expiry_leeway() -> Duration {
        Duration::from_secs(30)
    }

    /// Compiles the ordered route table.
    pub fn route_table(&self) -> Result<RouteTable> {
        let rules = self
            .routes
            .iter()
            .map(RouteRuleConfig::to_rule)
            .collect::<Result<Vec<_>>>()?;
        Ok(RouteTable::new(rules, self.default_route))
    }

    /// Builds the return-to policy used by login redirects.
    pub fn return_to_policy(&self) -> Result<ReturnToPolicy> {
        ReturnToPolicy::new(self.allowed_return_urls.as_slice(), self.default_return_path.clone())
    }

    /// Validates the authentication configuration.
    ///
    /// Ensures that:
    /// - Login, logout and post-logout paths are local paths
    /// - Every route rule has exactly one valid pattern
    /// - Allow-listed return URLs are absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("login_path", &self.login_path),
            ("logout_path", &self.logout_path),
            ("post_logout_path", &self.post_logout_path),
        ] {
            if !path.starts_with('/') || path.starts_with("//") {
                return Err(Error::config(format!(
                    "[auth] {name} must be a local path starting with '/', got \"{path}\"",
                )));
            }
        }

        self.route_table()?;
        self.return_to_policy()?;

        tracing::debug!(
            routes = self.routes.len(),
            leeway = %humantime::format_duration(self.token_expiry_leeway),
            "Authentication gate configuration validated"
        );
        Ok(())
    }
}
