// src/error/types.rs
use crate::domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Plan references data absent from the snapshot. Raised before any
    /// mutation is attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No session, or an expired session with no stored credentials left to
    /// refresh from. Surfaced to callers as "please re-authenticate".
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Non-success response from the external platform. The raw body is kept
    /// so the audit ledger can record exactly what came back.
    #[error("Upstream error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    /// Upstream data (e.g. roster-for-gameweek) not yet published.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A reconciled lineup that does not hold exactly 15 entries.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    /// True when the upstream response signals an expired or missing session.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, AppError::Upstream { status, .. } if *status == 401 || *status == 403)
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Other(format!("UUID error: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Other(format!("Date parse error: {}", err))
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
