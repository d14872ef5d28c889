//! Carries out a [`Decision`].

use {
    super::{
        classifier::RouteRule,
        context::AuthContext,
        decision::Decision,
        provider::{IdentityProvider, LoginOptions, LogoutOptions},
        render::{ErrorContext, ErrorRenderer},
    },
    crate::{Error, ErrorKind, utils::encode_query_value},
    axum::{extract::Request, middleware::Next, response::Response},
    http::StatusCode,
    std::sync::Arc,
};

pub(crate) struct DecisionExecutor {
    provider: Arc<dyn IdentityProvider>,
    renderer: Arc<dyn ErrorRenderer>,
    logout_url: String,
    post_logout_path: String,
}

impl DecisionExecutor {
    pub(crate) fn new(
        provider: Arc<dyn IdentityProvider>,
        renderer: Arc<dyn ErrorRenderer>,
        logout_path: &str,
        post_logout_path: impl Into<String>,
    ) -> Self {
        let post_logout_path = post_logout_path.into();
        Self {
            provider,
            renderer,
            logout_url: format!("{logout_path}?returnTo={}", encode_query_value(&post_logout_path)),
            post_logout_path,
        }
    }

    pub(crate) fn with_renderer(&self, renderer: Arc<dyn ErrorRenderer>) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            renderer,
            logout_url: self.logout_url.clone(),
            post_logout_path: self.post_logout_path.clone(),
        }
    }

    pub(crate) async fn execute(
        &self,
        decision: Decision,
        rule: &RouteRule,
        context: AuthContext,
        mut request: Request,
        next: Next,
    ) -> Response {
        match decision {
            Decision::Allow => {
                request.extensions_mut().insert(context);
                next.run(request).await
            }
            Decision::Redirect { url, return_to } => self.provider.login(LoginOptions { url, return_to }),
            // The landing page is fixed: sending a dead session back to the
            // page it came from would log it out again.
            Decision::Logout => self.provider.logout(LogoutOptions {
                url: self.logout_url.clone(),
                return_to: self.post_logout_path.clone(),
            }),
            Decision::Error { kind, status_code } => {
                let error = decision_error(kind, status_code);
                let context = ErrorContext {
                    route_kind: rule.kind,
                    path: request.uri().path().to_owned(),
                };
                self.renderer.render(&error, &context)
            }
        }
    }
}

/// The error handed to the renderer keeps the status the decision chose.
fn decision_error(kind: ErrorKind, status_code: StatusCode) -> Error {
    let reason = status_code
        .canonical_reason()
        .unwrap_or("Authentication required");
    Error::new(kind, reason).with_status(status_code)
}
