// src/services/executor_support.rs
//
// Behavior shared by the three step executors: structured error extraction
// from upstream response bodies, and the single refresh-then-surface pattern
// for authentication-expired responses. The mutation itself is never
// retried here.

use log::warn;
use std::sync::Arc;

use crate::error::AppError;
use crate::integrations::session::SessionProvider;

/// Pull a human-readable message out of an upstream failure. The platform
/// answers mutations with JSON like {"details": "..."} or
/// {"non_field_errors": ["..."]} when it bothers to explain itself.
pub(crate) fn upstream_error_message(err: &AppError) -> String {
    let AppError::Upstream { status, body } = err else {
        return err.to_string();
    };

    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["details", "detail", "error"] {
            if let Some(message) = parsed.get(key).and_then(|v| v.as_str()) {
                return format!("HTTP {}: {}", status, message);
            }
        }
        if let Some(message) = parsed
            .get("non_field_errors")
            .and_then(|v| v.get(0))
            .and_then(|v| v.as_str())
        {
            return format!("HTTP {}: {}", status, message);
        }
    }

    format!("HTTP {}: {}", status, body)
}

/// On an authentication-expired response, attempt exactly one session
/// refresh so the *next* explicit attempt can succeed. The current failure
/// is still surfaced to the caller.
pub(crate) async fn refresh_session_if_expired(
    session: &Arc<dyn SessionProvider>,
    user_id: &str,
    err: &AppError,
) {
    if !err.is_auth_expired() {
        return;
    }

    warn!("Session expired for user {}; attempting refresh", user_id);
    if let Err(refresh_err) = session.refresh(user_id).await {
        warn!("Session refresh failed for user {}: {}", user_id, refresh_err);
    }
}
