// src/integrations/session.rs
//
// Session Provider capability. Credential acquisition and storage live
// outside this subsystem; the engine only consumes the headers needed to
// authenticate mutating requests, and can ask for one re-authentication
// from stored credentials.

use async_trait::async_trait;

use crate::error::AppResult;

/// Everything a mutating request needs to pass the platform's session checks.
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    /// Session cookies, already serialized for the Cookie header.
    pub cookies: String,

    /// CSRF-style token expected in X-CSRFToken.
    pub csrf_token: String,

    /// The manager entry this session belongs to.
    pub entry_id: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current auth headers for the user. Fails with an Authentication error
    /// if no session is stored.
    async fn get_auth_headers(&self, user_id: &str) -> AppResult<AuthHeaders>;

    /// Re-authenticate using stored credentials. Fails if none are stored.
    async fn refresh(&self, user_id: &str) -> AppResult<()>;
}
