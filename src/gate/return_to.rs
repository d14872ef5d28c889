//! Return-to URL sanitizing for login redirects.
//!
//! A return-to value is honored only when it is a local path or an absolute
//! URL under one of the allow-listed base URLs. Everything else collapses to
//! the configured default path.

use {
    crate::{Error, Result},
    url::Url,
};

#[derive(Debug, Clone)]
pub struct ReturnToPolicy {
    allowed: Vec<Url>,
    default_path: String,
}

impl ReturnToPolicy {
    /// Builds a policy from absolute base URLs and a local fallback path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a base URL is not an absolute
    /// http(s) URL or if the fallback is not a local path.
    pub fn new<S: AsRef<str>>(allowed_base_urls: &[S], default_path: impl Into<String>) -> Result<Self> {
        let default_path = default_path.into();
        if !is_local_path(&default_path) {
            return Err(Error::config(format!(
                "default_return_path '{default_path}' must be a local path such as \"/\"",
            )));
        }

        let allowed = allowed_base_urls
            .iter()
            .map(|base| {
                let mut url = Url::parse(base.as_ref())
                    .map_err(|e| Error::config(format!("Invalid allowed_return_urls entry '{}': {e}", base.as_ref())))?;
                if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
                    return Err(Error::config(format!(
                        "allowed_return_urls entry '{}' must be an absolute http(s) URL",
                        base.as_ref()
                    )));
                }
                // A base path only covers whole segments: "/board" must not admit "/boardroom".
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                Ok(url)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { allowed, default_path })
    }

    pub fn default_path(&self) -> &str {
        &self.default_path
    }

    /// Returns `candidate` when it is safe to redirect to, else the default path.
    pub fn sanitize(&self, candidate: &str) -> String {
        if is_local_path(candidate) {
            return candidate.to_string();
        }

        match Url::parse(candidate) {
            Ok(url) if self.is_allowed(&url) => url.to_string(),
            _ => {
                tracing::warn!(return_to = %candidate, fallback = %self.default_path, "Rejected return-to URL");
                self.default_path.clone()
            }
        }
    }

    fn is_allowed(&self, url: &Url) -> bool {
        if !url.username().is_empty() || url.password().is_some() {
            return false;
        }
        self.allowed.iter().any(|base| {
            base.scheme() == url.scheme()
                && base.host_str() == url.host_str()
                && base.port_or_known_default() == url.port_or_known_default()
                && (url.path().starts_with(base.path())
                    || url.path() == base.path().trim_end_matches('/'))
        })
    }
}

impl Default for ReturnToPolicy {
    fn default() -> Self {
        Self {
            allowed: Vec::new(),
            default_path: "/".into(),
        }
    }
}

/// A path that browsers resolve against the current origin.
///
/// `//host` is scheme-relative and `/\host` is normalized to it by some
/// browsers, so both are rejected.
fn is_local_path(candidate: &str) -> bool {
    candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.contains('\\')
        && !candidate.chars().any(char::is_control)
}
