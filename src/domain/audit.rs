// src/domain/audit.rs
//
// Append-only record of every mutation attempt against the external
// platform, including failed attempts. Never edited or deleted; used to
// reconstruct "what did we actually send" independent of Plan state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of remote change a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Transfer,
    Captain,
    Chip,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Transfer => write!(f, "transfer"),
            ChangeType::Captain => write!(f, "captain"),
            ChangeType::Chip => write!(f, "chip"),
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(ChangeType::Transfer),
            "captain" => Ok(ChangeType::Captain),
            "chip" => Ok(ChangeType::Chip),
            other => Err(format!("Unknown change type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: String,
    pub gameweek: i32,
    pub change_type: ChangeType,

    /// What was sent and, on success, the raw response body.
    pub change_data: serde_json::Value,

    pub applied_successfully: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn success(
        user_id: &str,
        gameweek: i32,
        change_type: ChangeType,
        change_data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            gameweek,
            change_type,
            change_data,
            applied_successfully: true,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn failure(
        user_id: &str,
        gameweek: i32,
        change_type: ChangeType,
        change_data: serde_json::Value,
        error_message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            gameweek,
            change_type,
            change_data,
            applied_successfully: false,
            error_message: Some(error_message),
            created_at: Utc::now(),
        }
    }
}
