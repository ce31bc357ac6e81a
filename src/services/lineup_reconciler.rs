// src/services/lineup_reconciler.rs
//
// Rebuilds the user's lineup locally after a plan is applied. The platform
// reports picks with a delay after mutations, so the post-apply roster is
// reconstructed from the frozen pre-plan roster plus the plan's accepted
// edits, then persisted as the authoritative local record.

use log::{info, warn};
use std::sync::Arc;

use crate::domain::league::{FieldPosition, Snapshot};
use crate::domain::plan::{Chip, Plan};
use crate::domain::roster::{AppliedLineup, RosterEntry, SQUAD_SIZE, STARTING_ELEVEN};
use crate::error::{AppError, AppResult};
use crate::integrations::fpl::{FplApi, RosterPicks};
use crate::integrations::session::SessionProvider;
use crate::repositories::LineupRepository;

pub struct LineupReconciler {
    api: Arc<dyn FplApi>,
    session: Arc<dyn SessionProvider>,
    lineups: Arc<dyn LineupRepository>,
}

impl LineupReconciler {
    pub fn new(
        api: Arc<dyn FplApi>,
        session: Arc<dyn SessionProvider>,
        lineups: Arc<dyn LineupRepository>,
    ) -> Self {
        Self {
            api,
            session,
            lineups,
        }
    }

    /// Rebuild the lineup implied by the plan's accepted edits and persist
    /// it. Fails with an integrity error, persisting nothing, if the result
    /// is not a complete squad.
    pub async fn reconcile(&self, plan: &Plan, snapshot: &Snapshot) -> AppResult<AppliedLineup> {
        let mut entries = self.base_roster(plan).await?;

        self.apply_transfers(plan, &mut entries).await?;
        apply_swaps(plan, &mut entries);
        apply_captaincy(plan, &mut entries);

        entries.sort_by_key(|e| e.position);
        verify_squad(&entries)?;

        let formation = formation_string(&entries, snapshot);

        let lineup = AppliedLineup::new(
            plan.id,
            plan.user_id.clone(),
            plan.gameweek,
            entries,
            formation,
            plan.captain_id,
            plan.vice_captain_id,
        );

        self.lineups.save(&lineup)?;

        info!(
            "Reconciled lineup for user {} gameweek {} ({})",
            plan.user_id, plan.gameweek, lineup.formation
        );

        Ok(lineup)
    }

    /// The roster the plan's edits apply on top of: the frozen pre-plan
    /// copy when present, otherwise the previous gameweek's picks.
    async fn base_roster(&self, plan: &Plan) -> AppResult<Vec<RosterEntry>> {
        if let Some(original) = &plan.original_roster {
            return Ok(original.clone());
        }

        warn!(
            "Plan {} has no frozen roster; falling back to gameweek {} picks",
            plan.id,
            plan.gameweek - 1
        );

        let auth = self.session.get_auth_headers(&plan.user_id).await?;
        let picks = self.api.picks(auth.entry_id, plan.gameweek - 1).await?;
        Ok(picks.to_roster_entries())
    }

    /// Replace each transferred-out player with the incoming one in place,
    /// keeping the vacated slot and multiplier. An outgoing player absent
    /// from the base roster is looked up in the live picks once; an incoming
    /// player with no slot to inherit lands on the first open bench spot.
    async fn apply_transfers(&self, plan: &Plan, entries: &mut Vec<RosterEntry>) -> AppResult<()> {
        let mut live_picks: Option<RosterPicks> = None;
        let mut live_fetched = false;

        for transfer in plan.accepted_transfers() {
            if let Some(entry) = entries
                .iter_mut()
                .find(|e| e.player_id == transfer.player_out_id)
            {
                entry.player_id = transfer.player_in_id;
                continue;
            }

            if !live_fetched {
                live_fetched = true;
                live_picks = match self.session.get_auth_headers(&plan.user_id).await {
                    Ok(auth) => self.api.picks(auth.entry_id, plan.gameweek).await.ok(),
                    Err(_) => None,
                };
            }

            let live_entry = live_picks.as_ref().and_then(|picks| {
                picks
                    .to_roster_entries()
                    .into_iter()
                    .find(|e| e.player_id == transfer.player_out_id)
            });

            match live_entry {
                Some(live) => {
                    let mut entry = live;
                    entry.player_id = transfer.player_in_id;
                    entries.push(entry);
                }
                None => {
                    let Some(position) = first_open_bench_slot(entries) else {
                        return Err(AppError::Integrity(format!(
                            "No slot available for incoming player {}",
                            transfer.player_in_id
                        )));
                    };
                    warn!(
                        "Outgoing player {} not found in any roster; placing {} on bench slot {}",
                        transfer.player_out_id, transfer.player_in_id, position
                    );
                    entries.push(RosterEntry::new(transfer.player_in_id, position));
                }
            }
        }

        Ok(())
    }
}

fn first_open_bench_slot(entries: &[RosterEntry]) -> Option<u8> {
    (STARTING_ELEVEN + 1..=SQUAD_SIZE as u8).find(|pos| !entries.iter().any(|e| e.position == *pos))
}

/// Exchange position and multiplier between each accepted swap's starter
/// and bench player. Captaincy flags travel with the player, not the slot.
fn apply_swaps(plan: &Plan, entries: &mut [RosterEntry]) {
    for swap in plan.accepted_swaps() {
        let starter_idx = entries
            .iter()
            .position(|e| e.player_id == swap.starter_out_id);
        let bench_idx = entries.iter().position(|e| e.player_id == swap.bench_in_id);

        let (Some(a), Some(b)) = (starter_idx, bench_idx) else {
            warn!(
                "Swap {} <-> {} skipped; one side missing from roster",
                swap.starter_out_id, swap.bench_in_id
            );
            continue;
        };

        let (pos_a, mult_a) = (entries[a].position, entries[a].multiplier);
        entries[a].position = entries[b].position;
        entries[a].multiplier = entries[b].multiplier;
        entries[b].position = pos_a;
        entries[b].multiplier = mult_a;
    }
}

fn apply_captaincy(plan: &Plan, entries: &mut [RosterEntry]) {
    let Some(captain_id) = plan.captain_id else {
        return;
    };

    let captain_multiplier = match plan.chip_to_play {
        Some(Chip::TripleCaptain) => 3,
        _ => 2,
    };

    for entry in entries.iter_mut() {
        let was_captain = entry.is_captain;
        entry.is_captain = entry.player_id == captain_id;
        entry.is_vice_captain = plan.vice_captain_id == Some(entry.player_id);

        if entry.is_captain && entry.is_starter() {
            entry.multiplier = captain_multiplier;
        } else if was_captain && entry.is_starter() {
            entry.multiplier = 1;
        }
    }
}

fn verify_squad(entries: &[RosterEntry]) -> AppResult<()> {
    if entries.len() != SQUAD_SIZE {
        return Err(AppError::Integrity(format!(
            "Reconciled lineup has {} entries, expected {}",
            entries.len(),
            SQUAD_SIZE
        )));
    }

    for pos in 1..=SQUAD_SIZE as u8 {
        if !entries.iter().any(|e| e.position == pos) {
            return Err(AppError::Integrity(format!(
                "Reconciled lineup is missing position {}",
                pos
            )));
        }
    }

    Ok(())
}

/// Outfield shape of the starting eleven, e.g. "4-4-2". Players the
/// snapshot does not know are left out of the count.
fn formation_string(entries: &[RosterEntry], snapshot: &Snapshot) -> String {
    let mut defenders = 0;
    let mut midfielders = 0;
    let mut forwards = 0;

    for entry in entries.iter().filter(|e| e.is_starter()) {
        match snapshot.player(entry.player_id).map(|p| p.position) {
            Some(FieldPosition::Defender) => defenders += 1,
            Some(FieldPosition::Midfielder) => midfielders += 1,
            Some(FieldPosition::Forward) => forwards += 1,
            _ => {}
        }
    }

    format!("{}-{}-{}", defenders, midfielders, forwards)
}
