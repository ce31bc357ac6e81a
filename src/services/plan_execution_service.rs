// src/services/plan_execution_service.rs
//
// Orchestrates applying a plan end to end: guard checks, validation against
// a fresh snapshot, the three remote steps, local lineup reconciliation.
// Steps run independently; one failing never blocks the others, and the
// audit ledger keeps re-applies of a partially applied plan idempotent per
// category.

use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::audit::ChangeType;
use crate::domain::plan::{validate_plan, Plan, PlanStatus};
use crate::domain::roster::validate_roster;
use crate::error::{AppError, AppResult};
use crate::integrations::fpl::FplApi;
use crate::integrations::session::SessionProvider;
use crate::repositories::{AuditRepository, PlanRepository};

use super::captaincy_executor::CaptaincyExecutor;
use super::chip_executor::ChipExecutor;
use super::lineup_reconciler::LineupReconciler;
use super::plan_validator::PlanValidator;
use super::snapshot_service::SnapshotCache;
use super::transfer_executor::TransferExecutor;

/// Per-step outcome of one apply attempt. A step reported false was either
/// not requested by the plan, or failed; `details` says which.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub plan_id: Uuid,
    pub transfers_applied: bool,
    pub captain_set: bool,
    pub chip_played: bool,
    pub errors: Vec<String>,
    pub details: serde_json::Value,
}

pub struct PlanExecutionService {
    plans: Arc<dyn PlanRepository>,
    snapshots: Arc<SnapshotCache>,
    validator: PlanValidator,
    transfer_executor: Arc<TransferExecutor>,
    captaincy_executor: Arc<CaptaincyExecutor>,
    chip_executor: Arc<ChipExecutor>,
    reconciler: Arc<LineupReconciler>,
    audit: Arc<dyn AuditRepository>,
    session: Arc<dyn SessionProvider>,
    api: Arc<dyn FplApi>,
}

impl PlanExecutionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        snapshots: Arc<SnapshotCache>,
        transfer_executor: Arc<TransferExecutor>,
        captaincy_executor: Arc<CaptaincyExecutor>,
        chip_executor: Arc<ChipExecutor>,
        reconciler: Arc<LineupReconciler>,
        audit: Arc<dyn AuditRepository>,
        session: Arc<dyn SessionProvider>,
        api: Arc<dyn FplApi>,
    ) -> Self {
        Self {
            plans,
            snapshots,
            validator: PlanValidator::new(),
            transfer_executor,
            captaincy_executor,
            chip_executor,
            reconciler,
            audit,
            session,
            api,
        }
    }

    /// Apply a plan's accepted edits to the platform.
    ///
    /// Guard failures (missing plan, wrong owner, terminal status, no
    /// session, validation) return Err before any mutation. Once steps
    /// start, their failures land in the returned `errors` instead; the
    /// plan transitions to Applied only when every applicable step
    /// succeeded.
    ///
    /// Idempotent retries are keyed on the audit ledger by user, gameweek,
    /// and change type, not by plan id. Applying a second plan for a
    /// gameweek that already has successful records would skip the matching
    /// categories, so callers should apply at most one plan per gameweek.
    pub async fn apply(&self, user_id: &str, plan_id: Uuid) -> AppResult<ExecutionResult> {
        let mut plan = self
            .plans
            .find_by_id(plan_id)?
            .ok_or(AppError::NotFound)?;

        if plan.user_id != user_id {
            return Err(AppError::Validation(
                "Plan belongs to a different user".to_string(),
            ));
        }

        if plan.status == PlanStatus::Applied {
            return Err(AppError::Validation(
                "Plan has already been applied".to_string(),
            ));
        }

        if plan.status.is_terminal() {
            return Err(AppError::Validation(format!(
                "Plan in status {} cannot be applied",
                plan.status
            )));
        }

        validate_plan(&plan)?;

        // Session must exist before anything is attempted.
        let auth = self.session.get_auth_headers(user_id).await?;

        let snapshot = self.snapshots.get(plan.gameweek, false).await?;

        self.validator
            .validate(&plan, &snapshot)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.freeze_roster_baseline(&mut plan, auth.entry_id).await?;

        info!(
            "Applying plan {} for user {} gameweek {}",
            plan.id, user_id, plan.gameweek
        );

        let mut errors = Vec::new();
        let mut details = serde_json::Map::new();

        let transfers_applied = self
            .run_transfer_step(&plan, &snapshot, &mut errors, &mut details)
            .await?;
        let captain_set = self
            .run_captaincy_step(&plan, &mut errors, &mut details)
            .await?;
        let chip_played = self.run_chip_step(&plan, &mut errors, &mut details).await?;

        if errors.is_empty() {
            plan.mark_applied(Utc::now());
            self.plans.save(&plan)?;

            // The plan stays Applied even if local reconciliation fails;
            // the remote mutations already happened.
            match self.reconciler.reconcile(&plan, &snapshot).await {
                Ok(lineup) => {
                    details.insert(
                        "formation".to_string(),
                        serde_json::Value::String(lineup.formation),
                    );
                }
                Err(e) => {
                    error!("Lineup reconciliation failed for plan {}: {}", plan.id, e);
                    errors.push(format!("Lineup reconciliation failed: {}", e));
                }
            }
        } else {
            warn!(
                "Plan {} left in status {} after {} step failure(s)",
                plan.id,
                plan.status,
                errors.len()
            );
        }

        Ok(ExecutionResult {
            plan_id: plan.id,
            transfers_applied,
            captain_set,
            chip_played,
            errors,
            details: serde_json::Value::Object(details),
        })
    }

    /// Capture the pre-plan roster once, from the previous gameweek's
    /// picks. Best-effort when picks are not yet published.
    async fn freeze_roster_baseline(&self, plan: &mut Plan, entry_id: i64) -> AppResult<()> {
        if plan.original_roster.is_some() {
            return Ok(());
        }

        match self.api.picks(entry_id, plan.gameweek - 1).await {
            Ok(picks) => {
                let entries = picks.to_roster_entries();
                // A baseline the platform itself reports should always be a
                // well-formed squad; a malformed one is not worth freezing.
                if let Err(e) = validate_roster(&entries) {
                    warn!("Baseline roster for plan {} is malformed: {}", plan.id, e);
                    return Ok(());
                }
                plan.freeze_original_roster(entries);
                self.plans.save(plan)?;
            }
            Err(e) => {
                warn!(
                    "Could not freeze baseline roster for plan {}: {}",
                    plan.id, e
                );
            }
        }
        Ok(())
    }

    async fn run_transfer_step(
        &self,
        plan: &Plan,
        snapshot: &crate::domain::league::Snapshot,
        errors: &mut Vec<String>,
        details: &mut serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<bool> {
        let accepted = plan.accepted_transfers();
        let riding_chip = plan.chip_to_play.filter(|c| c.rides_transfer_call());

        if accepted.is_empty() && riding_chip.is_none() {
            details.insert(
                "transfers".to_string(),
                serde_json::Value::String("no accepted transfers in plan".to_string()),
            );
            return Ok(false);
        }

        if self.already_applied(plan, ChangeType::Transfer, details)? {
            return Ok(true);
        }

        match self
            .transfer_executor
            .apply(&plan.user_id, &accepted, plan.gameweek, snapshot, riding_chip)
            .await
        {
            Ok(()) => Ok(true),
            Err(e) => {
                errors.push(format!("Transfers failed: {}", e));
                Ok(false)
            }
        }
    }

    async fn run_captaincy_step(
        &self,
        plan: &Plan,
        errors: &mut Vec<String>,
        details: &mut serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<bool> {
        // A captaincy change needs both armbands; a plan carrying only one
        // of the two ids is incomplete and the step is skipped, not guessed.
        let (Some(captain_id), Some(vice_id)) = (plan.captain_id, plan.vice_captain_id) else {
            let note = if plan.captain_id.is_some() || plan.vice_captain_id.is_some() {
                "skipped: captaincy change requires both captain and vice-captain"
            } else {
                "no captaincy change in plan"
            };
            details.insert(
                "captain".to_string(),
                serde_json::Value::String(note.to_string()),
            );
            return Ok(false);
        };

        if self.already_applied(plan, ChangeType::Captain, details)? {
            return Ok(true);
        }

        match self
            .captaincy_executor
            .apply(&plan.user_id, captain_id, vice_id, plan.gameweek)
            .await
        {
            Ok(()) => Ok(true),
            Err(e) => {
                errors.push(format!("Captaincy failed: {}", e));
                Ok(false)
            }
        }
    }

    async fn run_chip_step(
        &self,
        plan: &Plan,
        errors: &mut Vec<String>,
        details: &mut serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<bool> {
        let standalone_chip = plan.chip_to_play.filter(|c| !c.rides_transfer_call());
        let Some(chip) = standalone_chip else {
            let note = match plan.chip_to_play {
                Some(chip) => format!("chip {} submitted with the transfer call", chip),
                None => "no chip in plan".to_string(),
            };
            details.insert("chip".to_string(), serde_json::Value::String(note));
            return Ok(false);
        };

        if self.already_applied(plan, ChangeType::Chip, details)? {
            return Ok(true);
        }

        match self
            .chip_executor
            .apply(&plan.user_id, chip, plan.gameweek)
            .await
        {
            Ok(()) => Ok(true),
            Err(e) => {
                errors.push(format!("Chip failed: {}", e));
                Ok(false)
            }
        }
    }

    /// A step category with a successful ledger entry for this gameweek is
    /// not resubmitted; re-applying a partially applied plan only runs what
    /// is still missing.
    fn already_applied(
        &self,
        plan: &Plan,
        change_type: ChangeType,
        details: &mut serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<bool> {
        let applied = self
            .audit
            .last_successful(&plan.user_id, plan.gameweek, change_type)?
            .is_some();

        if applied {
            info!(
                "Skipping {} step for plan {}; already applied this gameweek",
                change_type, plan.id
            );
            details.insert(
                change_type.to_string(),
                serde_json::Value::String("already applied in a previous attempt".to_string()),
            );
        }

        Ok(applied)
    }
}
