use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Positions 1..=11 are the starting eleven, 12..=15 the bench.
pub const SQUAD_SIZE: usize = 15;
pub const STARTING_ELEVEN: u8 = 11;

/// One slot of the 15-member roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: i64,

    /// 1..=15; 1..=11 start, 12..=15 bench.
    pub position: u8,

    pub is_captain: bool,
    pub is_vice_captain: bool,

    /// Scoring weight: 0 bench, 1 starting, 2 captain, 3 triple captain.
    pub multiplier: u8,
}

impl RosterEntry {
    /// Plain entry with the default multiplier for its position.
    pub fn new(player_id: i64, position: u8) -> Self {
        Self {
            player_id,
            position,
            is_captain: false,
            is_vice_captain: false,
            multiplier: if position <= STARTING_ELEVEN { 1 } else { 0 },
        }
    }

    pub fn is_starter(&self) -> bool {
        self.position <= STARTING_ELEVEN
    }
}

/// A full-roster rewrite staged for submission. The platform only accepts
/// whole-roster resubmissions for captaincy and chip changes, so both
/// executors stage their edit here and submit the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterMutation {
    pub entries: Vec<RosterEntry>,
    pub chip: Option<String>,
}

impl RosterMutation {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self {
            entries,
            chip: None,
        }
    }

    /// Rewrite captain/vice flags to the requested players, leaving every
    /// other field (including bench positions) untouched.
    pub fn with_captaincy(mut self, captain_id: i64, vice_captain_id: i64) -> Self {
        for entry in &mut self.entries {
            let was_captain = entry.is_captain;
            entry.is_captain = entry.player_id == captain_id;
            entry.is_vice_captain = entry.player_id == vice_captain_id;

            if entry.is_captain && entry.is_starter() {
                entry.multiplier = entry.multiplier.max(2);
            } else if was_captain && entry.is_starter() {
                entry.multiplier = 1;
            }
        }
        self
    }

    /// Attach a chip code to the submission.
    pub fn with_chip(mut self, chip_code: &str) -> Self {
        self.chip = Some(chip_code.to_string());
        self
    }
}

/// The locally reconstructed lineup persisted after a successful apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedLineup {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub user_id: String,
    pub gameweek: i32,
    pub entries: Vec<RosterEntry>,
    pub formation: String,
    pub captain_id: Option<i64>,
    pub vice_captain_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl AppliedLineup {
    pub fn new(
        plan_id: Uuid,
        user_id: String,
        gameweek: i32,
        entries: Vec<RosterEntry>,
        formation: String,
        captain_id: Option<i64>,
        vice_captain_id: Option<i64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan_id,
            user_id,
            gameweek,
            entries,
            formation,
            captain_id,
            vice_captain_id,
            created_at: Utc::now(),
        }
    }
}
