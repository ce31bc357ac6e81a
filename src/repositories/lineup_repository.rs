// src/repositories/lineup_repository.rs

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::roster::AppliedLineup;
use crate::error::{AppError, AppResult};

pub trait LineupRepository: Send + Sync {
    fn save(&self, lineup: &AppliedLineup) -> AppResult<()>;
    fn find_by_plan(&self, plan_id: Uuid) -> AppResult<Option<AppliedLineup>>;
    fn find_latest(&self, user_id: &str, gameweek: i32) -> AppResult<Option<AppliedLineup>>;
}

pub struct SqliteLineupRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteLineupRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_lineup(row: &Row) -> Result<AppliedLineup, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let plan_id_str: String = row.get("plan_id")?;
        let plan_id = Uuid::parse_str(&plan_id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let entries_json: String = row.get("entries")?;
        let entries = serde_json::from_str(&entries_json)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let created_at = DateTime::parse_from_rfc3339(&row.get::<_, String>("created_at")?)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(AppliedLineup {
            id,
            plan_id,
            user_id: row.get("user_id")?,
            gameweek: row.get("gameweek")?,
            entries,
            formation: row.get("formation")?,
            captain_id: row.get("captain_id")?,
            vice_captain_id: row.get("vice_captain_id")?,
            created_at,
        })
    }
}

impl LineupRepository for SqliteLineupRepository {
    fn save(&self, lineup: &AppliedLineup) -> AppResult<()> {
        let conn = self.pool.get()?;
        let entries_json = serde_json::to_string(&lineup.entries)?;

        conn.execute(
            "INSERT OR REPLACE INTO applied_lineups
             (id, plan_id, user_id, gameweek, entries, formation,
              captain_id, vice_captain_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                lineup.id.to_string(),
                lineup.plan_id.to_string(),
                lineup.user_id,
                lineup.gameweek,
                entries_json,
                lineup.formation,
                lineup.captain_id,
                lineup.vice_captain_id,
                lineup.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn find_by_plan(&self, plan_id: Uuid) -> AppResult<Option<AppliedLineup>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT * FROM applied_lineups WHERE plan_id = ?1
             ORDER BY created_at DESC LIMIT 1",
        )?;

        match stmt.query_row(params![plan_id.to_string()], Self::row_to_lineup) {
            Ok(lineup) => Ok(Some(lineup)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn find_latest(&self, user_id: &str, gameweek: i32) -> AppResult<Option<AppliedLineup>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT * FROM applied_lineups WHERE user_id = ?1 AND gameweek = ?2
             ORDER BY created_at DESC LIMIT 1",
        )?;

        match stmt.query_row(params![user_id, gameweek], Self::row_to_lineup) {
            Ok(lineup) => Ok(Some(lineup)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}
