use super::entity::{RosterEntry, SQUAD_SIZE, STARTING_ELEVEN};
use crate::domain::{DomainError, DomainResult};

/// Validates all roster invariants
/// A valid roster has exactly 15 entries, unique positions 1..=15, unique
/// players, exactly one captain and one vice-captain among the starting
/// eleven, and multiplier 0 on every bench slot
pub fn validate_roster(entries: &[RosterEntry]) -> DomainResult<()> {
    validate_size(entries)?;
    validate_positions(entries)?;
    validate_unique_players(entries)?;
    validate_captaincy(entries)?;
    validate_bench_multipliers(entries)?;
    Ok(())
}

fn validate_size(entries: &[RosterEntry]) -> DomainResult<()> {
    if entries.len() != SQUAD_SIZE {
        return Err(DomainError::InvariantViolation(format!(
            "Roster has {} entries, expected {}",
            entries.len(),
            SQUAD_SIZE
        )));
    }
    Ok(())
}

fn validate_positions(entries: &[RosterEntry]) -> DomainResult<()> {
    let mut seen = [false; SQUAD_SIZE + 1];
    for entry in entries {
        if !(1..=SQUAD_SIZE as u8).contains(&entry.position) {
            return Err(DomainError::InvariantViolation(format!(
                "Position {} outside 1..=15",
                entry.position
            )));
        }
        if seen[entry.position as usize] {
            return Err(DomainError::InvariantViolation(format!(
                "Duplicate roster position {}",
                entry.position
            )));
        }
        seen[entry.position as usize] = true;
    }
    Ok(())
}

fn validate_unique_players(entries: &[RosterEntry]) -> DomainResult<()> {
    for (i, entry) in entries.iter().enumerate() {
        if entries[i + 1..].iter().any(|e| e.player_id == entry.player_id) {
            return Err(DomainError::InvariantViolation(format!(
                "Player {} appears more than once",
                entry.player_id
            )));
        }
    }
    Ok(())
}

fn validate_captaincy(entries: &[RosterEntry]) -> DomainResult<()> {
    let captains: Vec<_> = entries.iter().filter(|e| e.is_captain).collect();
    let vices: Vec<_> = entries.iter().filter(|e| e.is_vice_captain).collect();

    if captains.len() != 1 {
        return Err(DomainError::InvariantViolation(format!(
            "Roster has {} captains, expected exactly 1",
            captains.len()
        )));
    }
    if vices.len() != 1 {
        return Err(DomainError::InvariantViolation(format!(
            "Roster has {} vice-captains, expected exactly 1",
            vices.len()
        )));
    }
    if captains[0].position > STARTING_ELEVEN || vices[0].position > STARTING_ELEVEN {
        return Err(DomainError::InvariantViolation(
            "Captain and vice-captain must be in the starting eleven".to_string(),
        ));
    }
    Ok(())
}

fn validate_bench_multipliers(entries: &[RosterEntry]) -> DomainResult<()> {
    for entry in entries.iter().filter(|e| !e.is_starter()) {
        if entry.multiplier != 0 {
            return Err(DomainError::InvariantViolation(format!(
                "Bench player {} at position {} has multiplier {}",
                entry.player_id, entry.position, entry.multiplier
            )));
        }
    }
    Ok(())
}
