// src/repositories/plan_repository.rs

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::plan::{Plan, PlanStatus};
use crate::error::{AppError, AppResult};

pub trait PlanRepository: Send + Sync {
    fn save(&self, plan: &Plan) -> AppResult<()>;
    fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>>;
    fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Plan>>;
    fn list_by_user_and_gameweek(&self, user_id: &str, gameweek: i32) -> AppResult<Vec<Plan>>;
}

pub struct SqlitePlanRepository {
    pool: Arc<ConnectionPool>,
}

impl SqlitePlanRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_plan(row: &Row) -> Result<Plan, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let status_str: String = row.get("status")?;
        let status: PlanStatus = status_str
            .parse()
            .map_err(|_| rusqlite::Error::InvalidQuery)?;

        let transfers_json: String = row.get("transfers")?;
        let transfers = serde_json::from_str(&transfers_json)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let swaps_json: String = row.get("lineup_swaps")?;
        let lineup_swaps = serde_json::from_str(&swaps_json)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let chip_to_play = match row.get::<_, Option<String>>("chip_to_play")? {
            Some(raw) => Some(raw.parse().map_err(|_| rusqlite::Error::InvalidQuery)?),
            None => None,
        };

        let original_roster = match row.get::<_, Option<String>>("original_roster")? {
            Some(raw) => Some(
                serde_json::from_str(&raw)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
            ),
            None => None,
        };

        let created_at = parse_timestamp(&row.get::<_, String>("created_at")?)?;
        let applied_at = match row.get::<_, Option<String>>("applied_at")? {
            Some(raw) => Some(parse_timestamp(&raw)?),
            None => None,
        };

        Ok(Plan {
            id,
            user_id: row.get("user_id")?,
            gameweek: row.get("gameweek")?,
            status,
            transfers,
            lineup_swaps,
            captain_id: row.get("captain_id")?,
            vice_captain_id: row.get("vice_captain_id")?,
            chip_to_play,
            original_roster,
            created_at,
            applied_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

impl PlanRepository for SqlitePlanRepository {
    fn save(&self, plan: &Plan) -> AppResult<()> {
        let conn = self.pool.get()?;
        let transfers_json = serde_json::to_string(&plan.transfers)?;
        let swaps_json = serde_json::to_string(&plan.lineup_swaps)?;
        let chip = plan.chip_to_play.map(|c| c.platform_code().to_string());
        let original_roster = plan
            .original_roster
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "INSERT OR REPLACE INTO plans
             (id, user_id, gameweek, status, transfers, lineup_swaps, captain_id,
              vice_captain_id, chip_to_play, original_roster, created_at, applied_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                plan.id.to_string(),
                plan.user_id,
                plan.gameweek,
                plan.status.to_string(),
                transfers_json,
                swaps_json,
                plan.captain_id,
                plan.vice_captain_id,
                chip,
                original_roster,
                plan.created_at.to_rfc3339(),
                plan.applied_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT * FROM plans WHERE id = ?1")?;

        match stmt.query_row(params![id.to_string()], Self::row_to_plan) {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Plan>> {
        let conn = self.pool.get()?;

        let mut stmt =
            conn.prepare("SELECT * FROM plans WHERE user_id = ?1 ORDER BY created_at DESC")?;

        let plans: Vec<Plan> = stmt
            .query_map(params![user_id], Self::row_to_plan)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }

    fn list_by_user_and_gameweek(&self, user_id: &str, gameweek: i32) -> AppResult<Vec<Plan>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT * FROM plans WHERE user_id = ?1 AND gameweek = ?2 ORDER BY created_at DESC",
        )?;

        let plans: Vec<Plan> = stmt
            .query_map(params![user_id, gameweek], Self::row_to_plan)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }
}
