//! Session authentication status.

use super::provider::SessionContext;

/// Reads whether the request belongs to an active session.
///
/// This never refreshes anything and says nothing about token freshness.
pub fn is_authenticated(session: &dyn SessionContext) -> bool {
    let authenticated = session.is_authenticated();
    tracing::trace!(authenticated, "Session status checked");
    authenticated
}
