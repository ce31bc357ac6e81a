// src/services/chip_executor.rs
//
// Plays a standalone chip (bench boost or triple captain) through the same
// whole-roster resubmission the platform requires for captaincy. Wildcard
// and free hit never come through here; they ride the transfer call.

use log::{error, info};
use std::sync::Arc;

use crate::domain::audit::{AuditRecord, ChangeType};
use crate::domain::plan::Chip;
use crate::domain::roster::RosterMutation;
use crate::error::{AppError, AppResult};
use crate::integrations::fpl::{FplApi, RosterSubmission};
use crate::integrations::session::SessionProvider;
use crate::repositories::AuditRepository;

use super::executor_support::{refresh_session_if_expired, upstream_error_message};

pub struct ChipExecutor {
    api: Arc<dyn FplApi>,
    session: Arc<dyn SessionProvider>,
    audit: Arc<dyn AuditRepository>,
}

impl ChipExecutor {
    pub fn new(
        api: Arc<dyn FplApi>,
        session: Arc<dyn SessionProvider>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            api,
            session,
            audit,
        }
    }

    /// Play a standalone chip for one gameweek. Every attempt is audited.
    pub async fn apply(&self, user_id: &str, chip: Chip, gameweek: i32) -> AppResult<()> {
        if chip.rides_transfer_call() {
            return Err(AppError::Validation(format!(
                "Chip {} is submitted with the transfer call, not standalone",
                chip
            )));
        }

        let change_data = serde_json::json!({ "chip": chip.platform_code() });

        let auth = match self.session.get_auth_headers(user_id).await {
            Ok(auth) => auth,
            Err(e) => {
                self.record_failure(user_id, gameweek, change_data, e.to_string())?;
                return Err(e);
            }
        };

        let picks = match self.api.picks(auth.entry_id, gameweek).await {
            Ok(picks) => picks,
            Err(e) => {
                let message = upstream_error_message(&e);
                refresh_session_if_expired(&self.session, user_id, &e).await;
                self.record_failure(user_id, gameweek, change_data, message)?;
                return Err(e);
            }
        };

        let mutation =
            RosterMutation::new(picks.to_roster_entries()).with_chip(chip.platform_code());
        let submission = RosterSubmission::from_mutation(&mutation);

        info!(
            "Playing chip {} for user {} gameweek {}",
            chip, user_id, gameweek
        );

        match self.api.submit_roster(&auth, auth.entry_id, &submission).await {
            Ok(response) => {
                self.audit.append(&AuditRecord::success(
                    user_id,
                    gameweek,
                    ChangeType::Chip,
                    serde_json::json!({
                        "request": change_data,
                        "response": response,
                    }),
                ))?;
                Ok(())
            }
            Err(e) => {
                let message = upstream_error_message(&e);
                error!(
                    "Chip submission failed for user {} gameweek {}: {}",
                    user_id, gameweek, message
                );
                refresh_session_if_expired(&self.session, user_id, &e).await;
                self.record_failure(user_id, gameweek, change_data, message)?;
                Err(e)
            }
        }
    }

    fn record_failure(
        &self,
        user_id: &str,
        gameweek: i32,
        change_data: serde_json::Value,
        message: String,
    ) -> AppResult<()> {
        self.audit.append(&AuditRecord::failure(
            user_id,
            gameweek,
            ChangeType::Chip,
            change_data,
            message,
        ))
    }
}
