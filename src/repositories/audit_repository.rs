// src/repositories/audit_repository.rs
//
// The audit ledger. Append-only by construction: the trait exposes no update
// or delete operation, and every step attempt against the external platform
// lands here whether or not it succeeded.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::audit::{AuditRecord, ChangeType};
use crate::error::{AppError, AppResult};

pub trait AuditRepository: Send + Sync {
    fn append(&self, record: &AuditRecord) -> AppResult<()>;
    fn list_for_gameweek(&self, user_id: &str, gameweek: i32) -> AppResult<Vec<AuditRecord>>;

    /// Most recent successful record for one change category, if any. Used
    /// by the engine to keep re-applies of a partially applied plan
    /// idempotent per category.
    fn last_successful(
        &self,
        user_id: &str,
        gameweek: i32,
        change_type: ChangeType,
    ) -> AppResult<Option<AuditRecord>>;
}

pub struct SqliteAuditRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteAuditRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &Row) -> Result<AuditRecord, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let change_type_str: String = row.get("change_type")?;
        let change_type: ChangeType = change_type_str
            .parse()
            .map_err(|_| rusqlite::Error::InvalidQuery)?;

        let change_data_json: String = row.get("change_data")?;
        let change_data = serde_json::from_str(&change_data_json)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let created_at = DateTime::parse_from_rfc3339(&row.get::<_, String>("created_at")?)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(AuditRecord {
            id,
            user_id: row.get("user_id")?,
            gameweek: row.get("gameweek")?,
            change_type,
            change_data,
            applied_successfully: row.get("applied_successfully")?,
            error_message: row.get("error_message")?,
            created_at,
        })
    }
}

impl AuditRepository for SqliteAuditRepository {
    fn append(&self, record: &AuditRecord) -> AppResult<()> {
        let conn = self.pool.get()?;
        let change_data_json = serde_json::to_string(&record.change_data)?;

        conn.execute(
            "INSERT INTO audit_records
             (id, user_id, gameweek, change_type, change_data,
              applied_successfully, error_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.to_string(),
                record.user_id,
                record.gameweek,
                record.change_type.to_string(),
                change_data_json,
                record.applied_successfully,
                record.error_message,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn list_for_gameweek(&self, user_id: &str, gameweek: i32) -> AppResult<Vec<AuditRecord>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT * FROM audit_records
             WHERE user_id = ?1 AND gameweek = ?2
             ORDER BY created_at ASC",
        )?;

        let records: Vec<AuditRecord> = stmt
            .query_map(params![user_id, gameweek], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn last_successful(
        &self,
        user_id: &str,
        gameweek: i32,
        change_type: ChangeType,
    ) -> AppResult<Option<AuditRecord>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT * FROM audit_records
             WHERE user_id = ?1 AND gameweek = ?2 AND change_type = ?3
               AND applied_successfully = 1
             ORDER BY created_at DESC LIMIT 1",
        )?;

        match stmt.query_row(
            params![user_id, gameweek, change_type.to_string()],
            Self::row_to_record,
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, initialize_database};

    fn make_repo() -> SqliteAuditRepository {
        let pool = Arc::new(create_test_pool().unwrap());
        let conn = pool.get().unwrap();
        initialize_database(&conn).unwrap();
        drop(conn);
        SqliteAuditRepository::new(pool)
    }

    #[test]
    fn test_append_and_list() {
        let repo = make_repo();

        repo.append(&AuditRecord::success(
            "user-1",
            10,
            ChangeType::Transfer,
            serde_json::json!({"transfers": [{"element_in": 205, "element_out": 101}]}),
        ))
        .unwrap();
        repo.append(&AuditRecord::failure(
            "user-1",
            10,
            ChangeType::Captain,
            serde_json::json!({"captain_id": 205}),
            "HTTP 500".to_string(),
        ))
        .unwrap();

        let records = repo.list_for_gameweek("user-1", 10).unwrap();
        assert_eq!(records.len(), 2);
        assert!(repo.list_for_gameweek("user-1", 11).unwrap().is_empty());
    }

    #[test]
    fn test_failed_attempts_are_recorded() {
        let repo = make_repo();

        repo.append(&AuditRecord::failure(
            "user-1",
            10,
            ChangeType::Transfer,
            serde_json::json!({}),
            "HTTP 401".to_string(),
        ))
        .unwrap();

        let records = repo.list_for_gameweek("user-1", 10).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].applied_successfully);
        assert_eq!(records[0].error_message.as_deref(), Some("HTTP 401"));
    }

    #[test]
    fn test_last_successful_ignores_failures_and_other_types() {
        let repo = make_repo();

        repo.append(&AuditRecord::failure(
            "user-1",
            10,
            ChangeType::Transfer,
            serde_json::json!({}),
            "HTTP 500".to_string(),
        ))
        .unwrap();
        repo.append(&AuditRecord::success(
            "user-1",
            10,
            ChangeType::Captain,
            serde_json::json!({}),
        ))
        .unwrap();

        assert!(repo
            .last_successful("user-1", 10, ChangeType::Transfer)
            .unwrap()
            .is_none());

        repo.append(&AuditRecord::success(
            "user-1",
            10,
            ChangeType::Transfer,
            serde_json::json!({}),
        ))
        .unwrap();

        let last = repo
            .last_successful("user-1", 10, ChangeType::Transfer)
            .unwrap()
            .unwrap();
        assert!(last.applied_successfully);
        assert_eq!(last.change_type, ChangeType::Transfer);
    }
}
