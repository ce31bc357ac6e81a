use super::entity::Plan;
use crate::domain::{DomainError, DomainResult};

/// Validates all Plan invariants
/// These are the absolute rules that must hold for a Plan to be storable
pub fn validate_plan(plan: &Plan) -> DomainResult<()> {
    validate_gameweek(plan.gameweek)?;
    validate_transfers(plan)?;
    validate_captaincy(plan)?;
    Ok(())
}

/// Gameweek must fall inside the season calendar
fn validate_gameweek(gameweek: i32) -> DomainResult<()> {
    if !(1..=38).contains(&gameweek) {
        return Err(DomainError::InvariantViolation(format!(
            "Gameweek {} outside valid range 1..=38",
            gameweek
        )));
    }
    Ok(())
}

/// A transfer must actually exchange two different players, and no player
/// may be moved out twice in the same plan
fn validate_transfers(plan: &Plan) -> DomainResult<()> {
    for transfer in &plan.transfers {
        if transfer.player_out_id == transfer.player_in_id {
            return Err(DomainError::InvariantViolation(format!(
                "Transfer moves player {} out and in again",
                transfer.player_out_id
            )));
        }
    }

    let mut seen_out = Vec::new();
    for transfer in &plan.transfers {
        if seen_out.contains(&transfer.player_out_id) {
            return Err(DomainError::InvariantViolation(format!(
                "Player {} is moved out more than once",
                transfer.player_out_id
            )));
        }
        seen_out.push(transfer.player_out_id);
    }
    Ok(())
}

/// Captain and vice-captain must be distinct when both are set
fn validate_captaincy(plan: &Plan) -> DomainResult<()> {
    if let (Some(captain), Some(vice)) = (plan.captain_id, plan.vice_captain_id) {
        if captain == vice {
            return Err(DomainError::InvariantViolation(format!(
                "Captain and vice-captain are both player {}",
                captain
            )));
        }
    }
    Ok(())
}
