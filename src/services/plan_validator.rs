// src/services/plan_validator.rs
//
// Pure pre-flight validation: every player a plan references must exist in
// the snapshot before any remote mutation is attempted. No I/O, no mutation.

use thiserror::Error;

use crate::domain::league::Snapshot;
use crate::domain::plan::Plan;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Plan references unknown player {player_id} as {role}")]
    UnknownPlayer { player_id: i64, role: &'static str },
}

pub struct PlanValidator;

impl PlanValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check every player reference in the plan against the snapshot.
    /// Returns the first violation found.
    pub fn validate(&self, plan: &Plan, snapshot: &Snapshot) -> Result<(), ValidationError> {
        for transfer in &plan.transfers {
            check(snapshot, transfer.player_out_id, "transfer-out")?;
            check(snapshot, transfer.player_in_id, "transfer-in")?;
        }

        for swap in &plan.lineup_swaps {
            check(snapshot, swap.starter_out_id, "swap-starter")?;
            check(snapshot, swap.bench_in_id, "swap-bench")?;
        }

        if let Some(captain_id) = plan.captain_id {
            check(snapshot, captain_id, "captain")?;
        }
        if let Some(vice_id) = plan.vice_captain_id {
            check(snapshot, vice_id, "vice-captain")?;
        }

        Ok(())
    }
}

impl Default for PlanValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check(snapshot: &Snapshot, player_id: i64, role: &'static str) -> Result<(), ValidationError> {
    if snapshot.has_player(player_id) {
        Ok(())
    } else {
        Err(ValidationError::UnknownPlayer { player_id, role })
    }
}
