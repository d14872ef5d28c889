//! Error types and handling for the authentication gate.
//!
//! This module provides structured errors with stable error codes and
//! automatic HTTP status code mapping. All errors implement `IntoResponse` and
//! serialize to the JSON envelope `{ "error", "code", "path" }`.
//!
//! # Design
//!
//! This module uses an opaque `Error` struct paired with an `ErrorKind` enum,
//! following the `std::io::Error` pattern. Internal error sources can change
//! without breaking consumers.
//!
//! # Example
//!
//! ```rust
//! use axum_authgate::{Error, ErrorKind};
//! use axum::http::StatusCode;
//!
//! let error = Error::authentication("session expired");
//!
//! match error.kind() {
//!     ErrorKind::Authentication => println!("login required: {}", error),
//!     ErrorKind::Authorization => println!("forbidden: {}", error),
//!     _ => println!("other error: {}", error),
//! }
//!
//! assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
///
/// This enum is marked `#[non_exhaustive]`, so new variants may be added
/// without breaking existing code. Always include a wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Missing, invalid, or expired credential.
    #[error("authentication error")]
    Authentication,

    /// Valid credential but insufficient permission.
    ///
    /// The gate never produces this kind itself; it exists so that handlers
    /// behind the gate can report permission failures through the same
    /// renderer.
    #[error("authorization error")]
    Authorization,

    /// The identity provider failed (network error, rejected refresh token).
    #[error("identity provider error")]
    Identity,

    /// Configuration error (invalid TOML, bad route rule, bad allow-list).
    #[error("configuration error")]
    Configuration,

    /// I/O error (reading configuration files).
    #[error("I/O error")]
    Io,

    /// Invalid input (bad URL, header, request data).
    #[error("invalid input")]
    InvalidInput,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

/// An error that can occur in the authentication gate.
///
/// Use [`Error::kind()`] to determine the category of error for matching,
/// and the `Display` implementation to get a human-readable message.
///
/// ```rust
/// use axum_authgate::Error;
///
/// let err = Error::authentication("bearer token missing");
/// let err = Error::identity("refresh token rejected");
/// let err = Error::config("route rule has no pattern");
/// ```
pub struct Error {
    kind: ErrorKind,
    status: Option<StatusCode>,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new error with the given kind and source.
    ///
    /// ```rust
    /// use axum_authgate::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::Internal, "something went wrong");
    /// assert_eq!(err.kind(), ErrorKind::Internal);
    /// ```
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            kind,
            status: None,
            source: error.into(),
        }
    }

    /// Pins the HTTP status instead of deriving it from the kind.
    ///
    /// ```rust
    /// use axum_authgate::Error;
    /// use axum::http::StatusCode;
    ///
    /// let err = Error::authentication("session expired").with_status(StatusCode::FORBIDDEN);
    /// assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    /// ```
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error code string for this error.
    ///
    /// This is a stable identifier suitable for client-side error handling.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Authentication => "AUTH_ERROR",
            ErrorKind::Authorization => "FORBIDDEN",
            ErrorKind::Identity => "IDENTITY_ERROR",
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        if let Some(status) = self.status {
            return status;
        }
        match self.kind {
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Identity => StatusCode::BAD_GATEWAY,
            ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into a structured error response.
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.error_code(), self.status_code())
    }

    /// Consumes the error and returns the inner error source.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.source
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Error {
    /// Creates an authentication error.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, msg.into())
    }

    /// Creates an authorization error.
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, msg.into())
    }

    /// Creates an identity provider error.
    pub fn identity(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Identity, msg.into())
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    /// Creates an I/O error from a message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg.into())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg.into())
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = self.to_error_response();

        tracing::error!(
            error_code = %error_response.error,
            message = %self,
            status = %status.as_u16(),
            "Error occurred"
        );

        (status, Json(error_response)).into_response()
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

// ============================================================================
// ErrorResponse
// ============================================================================

/// JSON error envelope returned to API clients.
///
/// ```json
/// { "error": "AUTH_ERROR", "code": 401, "path": "/api/meetings" }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable error code for client-side error handling.
    pub error: String,
    /// HTTP status code, repeated in the body for clients that lose it.
    pub code: u16,
    /// Request path that produced the error, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(error: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error: error.into(),
            code: status.as_u16(),
            path: None,
        }
    }

    /// Adds the request path to the error response.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(format!("{}", ErrorKind::Authentication), "authentication error");
        assert_eq!(format!("{}", ErrorKind::Identity), "identity provider error");
        assert_eq!(format!("{}", ErrorKind::InvalidInput), "invalid input");
    }

    #[test]
    fn test_error_new() {
        let err = Error::new(ErrorKind::Internal, "test error");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(format!("{}", err), "test error");
    }

    #[test]
    fn test_error_constructors_set_kind() {
        assert_eq!(Error::authentication("x").kind(), ErrorKind::Authentication);
        assert_eq!(Error::authorization("x").kind(), ErrorKind::Authorization);
        assert_eq!(Error::identity("x").kind(), ErrorKind::Identity);
        assert_eq!(Error::config("x").kind(), ErrorKind::Configuration);
        assert_eq!(Error::io("x").kind(), ErrorKind::Io);
        assert_eq!(Error::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::authentication("t").error_code(), "AUTH_ERROR");
        assert_eq!(Error::authorization("t").error_code(), "FORBIDDEN");
        assert_eq!(Error::identity("t").error_code(), "IDENTITY_ERROR");
        assert_eq!(Error::config("t").error_code(), "CONFIG_ERROR");
        assert_eq!(Error::internal("t").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_status_code_authentication() {
        let err = Error::authentication("test");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_status_code_authorization() {
        let err = Error::authorization("test");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_status_code_identity() {
        let err = Error::identity("test");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_with_status_overrides_kind_status() {
        let err = Error::authentication("test").with_status(StatusCode::PROXY_AUTHENTICATION_REQUIRED);
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.status_code(), StatusCode::PROXY_AUTHENTICATION_REQUIRED);
        assert_eq!(err.to_error_response().code, 407);
        assert_eq!(err.error_code(), "AUTH_ERROR");
    }

    #[test]
    fn test_status_code_invalid_input() {
        let err = Error::invalid_input("test");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_from_toml_error() {
        let toml_err = "invalid".parse::<toml::Value>().unwrap_err();
        let err: Error = toml_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_regex_error() {
        let regex_err = regex::Regex::new("(unclosed").unwrap_err();
        let err: Error = regex_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_url_parse_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_error_response_envelope() {
        let response = Error::authentication("no session")
            .to_error_response()
            .with_path("/api/meetings");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "AUTH_ERROR");
        assert_eq!(json["code"], 401);
        assert_eq!(json["path"], "/api/meetings");
    }

    #[test]
    fn test_error_response_without_path_omits_field() {
        let response = ErrorResponse::new("AUTH_ERROR", StatusCode::UNAUTHORIZED);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("path").is_none());
    }

    #[test]
    fn test_into_response_status() {
        let response = Error::authentication("no session").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_error_debug() {
        let err = Error::internal("test");
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Error"));
        assert!(debug_str.contains("Internal"));
    }

    #[test]
    fn test_error_into_inner() {
        let err = Error::internal("test message");
        let inner = err.into_inner();
        assert_eq!(format!("{}", inner), "test message");
    }

    #[test]
    fn test_error_source_trait() {
        let err = Error::internal("test");
        assert!(StdError::source(&err).is_some());
    }
}
