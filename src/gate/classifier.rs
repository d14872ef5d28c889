//! Ordered route rules and first-match classification.
//!
//! A [`RouteTable`] is built once at startup and shared immutably by every
//! request. Rules are tested in declaration order and the first match wins,
//! so the table performs no specificity ranking: `/api/health` must be
//! declared before `/api` for the health check to be reachable.

use {
    crate::{Error, Result},
    regex::Regex,
    serde::Deserialize,
    std::fmt,
};

/// How a route responds, which decides the shape of an authentication failure.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// JSON API. Failures are always a JSON 401, never a redirect.
    Api,
    /// Server-rendered HTML page. Unauthenticated GETs are redirected to login.
    #[default]
    Ssr,
}

/// Authentication strength a route demands.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthLevel {
    /// No authentication work is performed.
    Public,
    /// Always served. A session and a fresh token are used when present.
    Optional,
    /// An active session is mandatory.
    #[default]
    Required,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Api => write!(f, "api"),
            RouteKind::Ssr => write!(f, "ssr"),
        }
    }
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthLevel::Public => write!(f, "public"),
            AuthLevel::Optional => write!(f, "optional"),
            AuthLevel::Required => write!(f, "required"),
        }
    }
}

/// Path matcher of a [`RouteRule`].
#[derive(Debug, Clone)]
pub enum RoutePattern {
    /// Matches when the path starts with the prefix.
    Prefix(String),
    /// Matches when the regex finds a match in the path.
    Regex(Regex),
}

impl RoutePattern {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        RoutePattern::Prefix(prefix.into())
    }

    /// Compiles a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the expression does not compile.
    pub fn regex(expr: &str) -> Result<Self> {
        Ok(RoutePattern::Regex(Regex::new(expr)?))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
            RoutePattern::Regex(regex) => regex.is_match(path),
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePattern::Prefix(prefix) => write!(f, "prefix:{prefix}"),
            RoutePattern::Regex(regex) => write!(f, "regex:{}", regex.as_str()),
        }
    }
}

/// A path pattern paired with the authentication it requires.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub pattern: RoutePattern,
    pub kind: RouteKind,
    pub auth_level: AuthLevel,
    /// Whether a bearer token must be available to serve the route.
    /// Only meaningful for `required` routes.
    pub token_required: bool,
}

impl RouteRule {
    pub fn new(pattern: RoutePattern, kind: RouteKind, auth_level: AuthLevel) -> Self {
        Self {
            pattern,
            kind,
            auth_level,
            token_required: false,
        }
    }

    #[must_use]
    pub fn with_token_required(mut self, token_required: bool) -> Self {
        self.token_required = token_required;
        self
    }

    /// Whether the token lifecycle manager runs for this route, and if so
    /// whether it may call the identity provider to refresh.
    ///
    /// Optional routes read the token but never refresh it: a permanently
    /// invalid refresh token would otherwise be retried on every page view.
    pub fn token_policy(&self) -> Option<RefreshPolicy> {
        match self.auth_level {
            AuthLevel::Required if self.token_required => Some(RefreshPolicy::Attempt),
            AuthLevel::Optional => Some(RefreshPolicy::Skip),
            _ => None,
        }
    }
}

/// Whether an expired token may be refreshed during this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    Attempt,
    Skip,
}

impl RefreshPolicy {
    pub fn attempt_refresh(self) -> bool {
        matches!(self, RefreshPolicy::Attempt)
    }
}

/// Classification used when no rule matches.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub struct DefaultRoute {
    #[serde(default)]
    pub kind: RouteKind,
    #[serde(default)]
    pub auth_level: AuthLevel,
}

/// Ordered, immutable rule table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    fallback: RouteRule,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>, default: DefaultRoute) -> Self {
        Self {
            rules,
            fallback: RouteRule::new(RoutePattern::prefix(""), default.kind, default.auth_level),
        }
    }

    /// Returns the first rule matching `path`, or the default rule.
    pub fn classify(&self, path: &str) -> &RouteRule {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .unwrap_or(&self.fallback)
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &RouteRule {
        &self.fallback
    }

    /// Rejects rules that can never match anything sensible.
    pub(crate) fn validate_rule(rule: &RouteRule) -> Result<()> {
        if let RoutePattern::Prefix(prefix) = &rule.pattern
            && !prefix.starts_with('/')
        {
            return Err(Error::config(format!(
                "Route prefix '{prefix}' must start with '/'. Example: prefix = \"/api\"",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> RouteTable {
        RouteTable::new(
            vec![
                RouteRule::new(RoutePattern::prefix("/api/health"), RouteKind::Api, AuthLevel::Public),
                RouteRule::new(
                    RoutePattern::regex(r"^/meetings/\d+/agenda$").unwrap(),
                    RouteKind::Ssr,
                    AuthLevel::Optional,
                ),
                RouteRule::new(RoutePattern::prefix("/api"), RouteKind::Api, AuthLevel::Required)
                    .with_token_required(true),
            ],
            DefaultRoute {
                kind: RouteKind::Ssr,
                auth_level: AuthLevel::Required,
            },
        )
    }

    #[test]
    fn test_prefix_match_more_specific_first() {
        let table = table();
        let rule = table.classify("/api/health");
        assert_eq!(rule.auth_level, AuthLevel::Public);
        assert_eq!(rule.kind, RouteKind::Api);

        let rule = table.classify("/api/meetings");
        assert_eq!(rule.auth_level, AuthLevel::Required);
        assert!(rule.token_required);
    }

    #[test]
    fn test_regex_match() {
        let table = table();
        assert_eq!(table.classify("/meetings/42/agenda").auth_level, AuthLevel::Optional);
        assert_eq!(table.classify("/meetings/42/minutes").auth_level, AuthLevel::Required);
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let table = table();
        let rule = table.classify("/committees");
        assert_eq!(rule.kind, RouteKind::Ssr);
        assert_eq!(rule.auth_level, AuthLevel::Required);
        assert!(!rule.token_required);
    }

    #[test]
    fn test_empty_table_always_falls_back() {
        let table = RouteTable::new(
            vec![],
            DefaultRoute {
                kind: RouteKind::Api,
                auth_level: AuthLevel::Public,
            },
        );
        assert_eq!(table.classify("/anything").auth_level, AuthLevel::Public);
    }

    #[test]
    fn test_token_policy() {
        let required = RouteRule::new(RoutePattern::prefix("/a"), RouteKind::Api, AuthLevel::Required);
        assert_eq!(required.token_policy(), None);
        assert_eq!(
            required.with_token_required(true).token_policy(),
            Some(RefreshPolicy::Attempt)
        );

        let optional = RouteRule::new(RoutePattern::prefix("/b"), RouteKind::Ssr, AuthLevel::Optional);
        assert_eq!(optional.token_policy(), Some(RefreshPolicy::Skip));

        let public = RouteRule::new(RoutePattern::prefix("/c"), RouteKind::Ssr, AuthLevel::Public)
            .with_token_required(true);
        assert_eq!(public.token_policy(), None);
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let err = RoutePattern::regex("(").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_validate_rule_rejects_relative_prefix() {
        let rule = RouteRule::new(RoutePattern::prefix("api"), RouteKind::Api, AuthLevel::Public);
        assert!(RouteTable::validate_rule(&rule).is_err());
    }

    proptest! {
        /// The first matching rule wins, so swapping two rules that both
        /// match a path changes the classification.
        #[test]
        fn order_sensitive_when_both_match(suffix in "[a-z/]{0,12}") {
            let path = format!("/api/{suffix}");
            let public = RouteRule::new(RoutePattern::prefix("/api"), RouteKind::Api, AuthLevel::Public);
            let required = RouteRule::new(RoutePattern::regex("^/api").unwrap(), RouteKind::Api, AuthLevel::Required);

            let forward = RouteTable::new(vec![public.clone(), required.clone()], DefaultRoute::default());
            let reversed = RouteTable::new(vec![required, public], DefaultRoute::default());

            prop_assert_eq!(forward.classify(&path).auth_level, AuthLevel::Public);
            prop_assert_eq!(reversed.classify(&path).auth_level, AuthLevel::Required);
        }

        /// Paths that match no rule always get the default classification.
        #[test]
        fn unmatched_paths_get_default(segment in "[a-z]{1,10}") {
            let path = format!("/{segment}");
            let table = RouteTable::new(
                vec![RouteRule::new(RoutePattern::prefix("/API"), RouteKind::Api, AuthLevel::Public)],
                DefaultRoute { kind: RouteKind::Api, auth_level: AuthLevel::Optional },
            );
            let rule = table.classify(&path);
            prop_assert_eq!(rule.kind, RouteKind::Api);
            prop_assert_eq!(rule.auth_level, AuthLevel::Optional);
        }
    }
}
