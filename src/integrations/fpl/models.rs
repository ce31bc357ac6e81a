// src/integrations/fpl/models.rs
//
// Wire-level types for the fantasy league API. These mirror the upstream
// JSON shapes and are mapped to domain types at this boundary; nothing
// outside integrations/ sees the raw field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::league::{FieldPosition, Fixture, Gameweek, Player, Team};
use crate::domain::roster::{RosterEntry, RosterMutation};

// ============================================================================
// Read side: bootstrap / fixtures / picks
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BootstrapResponse {
    pub elements: Vec<ElementData>,
    pub teams: Vec<TeamData>,
    pub events: Vec<EventData>,
}

#[derive(Debug, Deserialize)]
pub struct ElementData {
    pub id: i64,
    pub web_name: String,
    pub team: i64,
    pub element_type: i64,
    pub now_cost: i64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamData {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub strength: i64,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub id: i32,
    pub name: String,
    pub deadline_time: DateTime<Utc>,
    pub is_current: bool,
    pub is_next: bool,
    pub finished: bool,
}

#[derive(Debug, Deserialize)]
pub struct FixtureData {
    pub id: i64,
    pub event: Option<i32>,
    pub team_h: i64,
    pub team_a: i64,
    pub team_h_difficulty: i64,
    pub team_a_difficulty: i64,
    pub kickoff_time: Option<DateTime<Utc>>,
    pub finished: bool,
}

#[derive(Debug, Deserialize)]
pub struct PicksResponse {
    pub picks: Vec<PickData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickData {
    pub element: i64,
    pub position: u8,
    pub multiplier: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub selling_price: Option<i64>,
    pub purchase_price: Option<i64>,
}

/// League-wide static data, already mapped to domain types.
#[derive(Debug, Clone)]
pub struct BootstrapData {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub gameweeks: Vec<Gameweek>,
}

/// One manager's roster for one gameweek, as the platform reports it.
#[derive(Debug, Clone)]
pub struct RosterPicks {
    pub entry_id: i64,
    pub gameweek: i32,
    pub picks: Vec<PickData>,
}

impl RosterPicks {
    pub fn to_roster_entries(&self) -> Vec<RosterEntry> {
        self.picks
            .iter()
            .map(|p| RosterEntry {
                player_id: p.element,
                position: p.position,
                is_captain: p.is_captain,
                is_vice_captain: p.is_vice_captain,
                multiplier: p.multiplier,
            })
            .collect()
    }

    pub fn selling_price(&self, player_id: i64) -> Option<i64> {
        self.picks
            .iter()
            .find(|p| p.element == player_id)
            .and_then(|p| p.selling_price)
    }
}

// ============================================================================
// Write side: transfer and whole-roster submissions
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransferItem {
    pub element_in: i64,
    pub element_out: i64,
    pub purchase_price: i64,
    pub selling_price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferPayload {
    pub entry: i64,
    pub event: i32,
    pub transfers: Vec<TransferItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickPayload {
    pub element: i64,
    pub position: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

/// The whole-roster resubmission body required for captaincy and chip
/// changes. The platform accepts no delta here.
#[derive(Debug, Clone, Serialize)]
pub struct RosterSubmission {
    pub picks: Vec<PickPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip: Option<String>,
}

impl RosterSubmission {
    pub fn from_mutation(mutation: &RosterMutation) -> Self {
        Self {
            picks: mutation
                .entries
                .iter()
                .map(|e| PickPayload {
                    element: e.player_id,
                    position: e.position,
                    is_captain: e.is_captain,
                    is_vice_captain: e.is_vice_captain,
                })
                .collect(),
            chip: mutation.chip.clone(),
        }
    }
}

// ============================================================================
// Wire -> domain mapping
// ============================================================================

pub fn map_bootstrap(response: BootstrapResponse) -> BootstrapData {
    let players = response
        .elements
        .into_iter()
        .filter_map(|e| {
            let position = FieldPosition::from_element_type(e.element_type)?;
            Some(Player {
                id: e.id,
                web_name: e.web_name,
                team_id: e.team,
                position,
                now_cost: e.now_cost,
                status: e.status,
                metrics: None,
            })
        })
        .collect();

    let teams = response
        .teams
        .into_iter()
        .map(|t| Team {
            id: t.id,
            name: t.name,
            short_name: t.short_name,
            strength: t.strength,
        })
        .collect();

    let gameweeks = response
        .events
        .into_iter()
        .map(|e| Gameweek {
            id: e.id,
            name: e.name,
            deadline_time: e.deadline_time,
            is_current: e.is_current,
            is_next: e.is_next,
            finished: e.finished,
        })
        .collect();

    BootstrapData {
        players,
        teams,
        gameweeks,
    }
}

pub fn map_fixture(data: FixtureData) -> Fixture {
    Fixture {
        id: data.id,
        gameweek: data.event,
        home_team_id: data.team_h,
        away_team_id: data.team_a,
        home_difficulty: data.team_h_difficulty,
        away_difficulty: data.team_a_difficulty,
        kickoff_time: data.kickoff_time,
        finished: data.finished,
    }
}
