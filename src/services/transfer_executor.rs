// src/services/transfer_executor.rs
//
// Sends the accepted transfers of a plan to the platform as one batched
// mutation, with prices resolved from the snapshot (falling back to a fresh
// picks fetch when a selling price is missing there).
//
// Deliberately never retried automatically: a transfer mutation is
// financially consequential, and the platform offers no idempotency key, so
// a failed attempt is surfaced for an explicit re-attempt decision.

use log::{error, info};
use std::sync::Arc;

use crate::domain::audit::{AuditRecord, ChangeType};
use crate::domain::league::Snapshot;
use crate::domain::plan::{Chip, Transfer};
use crate::error::{AppError, AppResult};
use crate::integrations::fpl::{FplApi, TransferItem, TransferPayload};
use crate::integrations::session::SessionProvider;
use crate::repositories::AuditRepository;

use super::executor_support::{refresh_session_if_expired, upstream_error_message};

pub struct TransferExecutor {
    api: Arc<dyn FplApi>,
    session: Arc<dyn SessionProvider>,
    audit: Arc<dyn AuditRepository>,
}

impl TransferExecutor {
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

    /// Apply the accepted transfers (plus an optional inline wildcard or
    /// free-hit chip) for one gameweek. Every attempt is audited.
    pub async fn apply(
        &self,
        user_id: &str,
        transfers: &[&Transfer],
        gameweek: i32,
        snapshot: &Snapshot,
        chip: Option<Chip>,
    ) -> AppResult<()> {
        let auth = match self.session.get_auth_headers(user_id).await {
            Ok(auth) => auth,
            Err(e) => {
                self.record_failure(user_id, gameweek, serde_json::Value::Null, e.to_string())?;
                return Err(e);
            }
        };

        let items = self
            .resolve_items(transfers, auth.entry_id, gameweek, snapshot)
            .await?;

        let payload = TransferPayload {
            entry: auth.entry_id,
            event: gameweek,
            transfers: items,
            chip: chip.filter(|c| c.rides_transfer_call()).map(|c| c.platform_code().to_string()),
        };

        let change_data = serde_json::to_value(&payload)?;

        info!(
            "Submitting {} transfer(s) for user {} gameweek {}",
            payload.transfers.len(),
            user_id,
            gameweek
        );

        match self.api.submit_transfers(&auth, &payload).await {
            Ok(response) => {
                self.audit.append(&AuditRecord::success(
                    user_id,
                    gameweek,
                    ChangeType::Transfer,
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
                    "Transfer submission failed for user {} gameweek {}: {}",
                    user_id, gameweek, message
                );
                refresh_session_if_expired(&self.session, user_id, &e).await;
                self.record_failure(user_id, gameweek, change_data, message)?;
                Err(e)
            }
        }
    }

    /// Resolve purchase/selling prices. The snapshot's current price covers
    /// the purchase side; the selling side prefers the platform's own
    /// selling_price from a picks fetch, since price rises split profit.
    async fn resolve_items(
        &self,
        transfers: &[&Transfer],
        entry_id: i64,
        gameweek: i32,
        snapshot: &Snapshot,
    ) -> AppResult<Vec<TransferItem>> {
        let mut picks = None;
        let mut picks_fetched = false;
        let mut items = Vec::with_capacity(transfers.len());

        for transfer in transfers {
            let purchase_price = snapshot
                .player(transfer.player_in_id)
                .map(|p| p.now_cost)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "Incoming player {} missing from snapshot",
                        transfer.player_in_id
                    ))
                })?;

            let selling_price = match snapshot.player(transfer.player_out_id) {
                Some(player) => {
                    // Lazy single picks fetch shared by all transfers
                    if !picks_fetched {
                        picks = self.api.picks(entry_id, gameweek).await.ok();
                        picks_fetched = true;
                    }
                    picks
                        .as_ref()
                        .and_then(|p| p.selling_price(transfer.player_out_id))
                        .unwrap_or(player.now_cost)
                }
                None => {
                    return Err(AppError::Validation(format!(
                        "Outgoing player {} missing from snapshot",
                        transfer.player_out_id
                    )))
                }
            };

            items.push(TransferItem {
                element_in: transfer.player_in_id,
                element_out: transfer.player_out_id,
                purchase_price,
                selling_price,
            });
        }

        Ok(items)
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
            ChangeType::Transfer,
            change_data,
            message,
        ))
    }
}
