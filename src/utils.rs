//!
//! Utility types and functions shared by the configuration and the gate.
//!
//! This module provides:
//! - [`Sensitive`] - A wrapper type for secrets that hides values in debug output
//! - [`replace_handlebars_with_env`] - Template substitution for environment variables
//! - [`encode_query_value`] - Percent-encoding of a single query string value
//!

use {
    regex::{Captures, Regex},
    serde::Deserialize,
    std::{env, sync::LazyLock},
    zeroize::{Zeroize, ZeroizeOnDrop},
};

/// Matches `{{ VAR_NAME }}` with optional whitespace around the variable name.
/// Variable names must be uppercase letters, digits, or underscores.
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// A wrapper type for sensitive data that obscures the value in debug output
/// and securely zeros memory when dropped.
///
/// Bearer tokens travel through the gate wrapped in this type so that a stray
/// `{:?}` in a log statement never prints a credential.
///
/// ```
/// use axum_authgate::Sensitive;
///
/// let token = Sensitive::from("eyJhbGciOi...");
/// assert_eq!(format!("{:?}", token), "Sensitive(****)");
///
/// let raw: &str = &token.0;
/// ```
///
/// This type does NOT encrypt the value in memory while in use, nor does it
/// prevent the value from being read by code holding the `Sensitive` instance.
#[derive(Clone, Deserialize, Default, Zeroize, ZeroizeOnDrop)]
pub struct Sensitive<T: Default + Zeroize>(pub T);

impl Sensitive<String> {
    /// Creates a new `Sensitive<String>` from a string slice.
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<T: Default + Zeroize + PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Default + Zeroize> std::fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sensitive(****)")
    }
}

/// Replaces handlebars-style placeholders with environment variable values.
///
/// `{{VAR}}`, `{{ VAR }}`, and `{{  VAR  }}` are equivalent. Missing variables
/// are replaced with an empty string and a warning is logged.
///
/// ```
/// use axum_authgate::replace_handlebars_with_env;
///
/// let result = replace_handlebars_with_env("Value: {{ MISSING_AUTHGATE_VAR }}");
/// assert_eq!(result, "Value: ");
/// ```
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}

/// Percent-encodes a value for use inside a query string.
///
/// Uses `application/x-www-form-urlencoded` rules, so `/` becomes `%2F`
/// and `?`, `&`, `=` can never leak into the surrounding query.
///
/// ```
/// use axum_authgate::encode_query_value;
///
/// assert_eq!(encode_query_value("/dashboard"), "%2Fdashboard");
/// ```
pub fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
