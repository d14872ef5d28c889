//! Client-appropriate rendering of gate errors.

use {
    super::classifier::RouteKind,
    crate::Error,
    axum::{
        Json,
        response::{Html, IntoResponse, Response},
    },
};

/// Where an error happened, as far as rendering is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub route_kind: RouteKind,
    pub path: String,
}

/// Turns a typed error into the response a client can process.
pub trait ErrorRenderer: Send + Sync + 'static {
    fn render(&self, error: &Error, context: &ErrorContext) -> Response;
}

/// JSON envelope for API routes, a plain HTML page for SSR routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorRenderer;

impl ErrorRenderer for DefaultErrorRenderer {
    fn render(&self, error: &Error, context: &ErrorContext) -> Response {
        let status = error.status_code();
        tracing::debug!(
            error_code = error.error_code(),
            status = status.as_u16(),
            path = %context.path,
            route_kind = %context.route_kind,
            "Rendering gate error"
        );

        match context.route_kind {
            RouteKind::Api => (
                status,
                Json(error.to_error_response().with_path(context.path.clone())),
            )
                .into_response(),
            RouteKind::Ssr => {
                let reason = status.canonical_reason().unwrap_or("Error");
                let page = format!(
                    "<!DOCTYPE html>\n<html><head><title>{code} {reason}</title></head>\
                     <body><h1>{code} {reason}</h1><p>Please <a href=\"/\">return to the home page</a> and sign in again.</p></body></html>",
                    code = status.as_u16(),
                );
                (status, Html(page)).into_response()
            }
        }
    }
}
