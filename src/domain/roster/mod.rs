// src/domain/roster/mod.rs

pub mod entity;
pub mod invariants;

pub use entity::{AppliedLineup, RosterEntry, RosterMutation, SQUAD_SIZE, STARTING_ELEVEN};
pub use invariants::validate_roster;
