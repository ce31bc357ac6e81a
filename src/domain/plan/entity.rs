use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::roster::RosterEntry;

/// A proposed set of roster edits (transfers, captaincy, special card) for
/// one gameweek. Produced by the recommendation generator in Pending state
/// and submitted to the execution engine exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,

    pub user_id: String,

    pub gameweek: i32,

    pub status: PlanStatus,

    pub transfers: Vec<Transfer>,

    /// Accepted starting/bench exchanges to apply during reconciliation.
    pub lineup_swaps: Vec<LineupSwap>,

    pub captain_id: Option<i64>,
    pub vice_captain_id: Option<i64>,

    pub chip_to_play: Option<Chip>,

    /// Frozen copy of the roster as it stood before any edits. Captured once
    /// and never overwritten; baseline for impact analysis and lineup
    /// reconciliation.
    pub original_roster: Option<Vec<RosterEntry>>,

    pub created_at: DateTime<Utc>,
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Previewed,
    Applied,
    Rejected,
}

impl PlanStatus {
    /// Applied and Rejected admit no further edits.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Applied | PlanStatus::Rejected)
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanStatus::Pending => write!(f, "pending"),
            PlanStatus::Previewed => write!(f, "previewed"),
            PlanStatus::Applied => write!(f, "applied"),
            PlanStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PlanStatus::Pending),
            "previewed" => Ok(PlanStatus::Previewed),
            "applied" => Ok(PlanStatus::Applied),
            "rejected" => Ok(PlanStatus::Rejected),
            other => Err(format!("Unknown plan status: {}", other)),
        }
    }
}

/// One recommended player exchange. accepted=false means the user opted out;
/// only accepted transfers are ever sent to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub player_out_id: i64,
    pub player_in_id: i64,
    pub accepted: bool,
}

/// A starter/bench exchange. Applied locally during reconciliation, not sent
/// as its own remote mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupSwap {
    pub starter_out_id: i64,
    pub bench_in_id: i64,
    pub accepted: bool,
}

/// One-time strategic modifier. Wildcard and FreeHit are tied to the transfer
/// call by the platform; BenchBoost and TripleCaptain require a standalone
/// whole-roster resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chip {
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
}

impl Chip {
    /// The platform's wire code for this chip.
    pub fn platform_code(&self) -> &'static str {
        match self {
            Chip::Wildcard => "wildcard",
            Chip::FreeHit => "freehit",
            Chip::BenchBoost => "bboost",
            Chip::TripleCaptain => "3xc",
        }
    }

    /// Chips the platform accepts inline on the transfer endpoint.
    pub fn rides_transfer_call(&self) -> bool {
        matches!(self, Chip::Wildcard | Chip::FreeHit)
    }
}

impl std::fmt::Display for Chip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.platform_code())
    }
}

impl std::str::FromStr for Chip {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wildcard" => Ok(Chip::Wildcard),
            "freehit" => Ok(Chip::FreeHit),
            "bboost" => Ok(Chip::BenchBoost),
            "3xc" => Ok(Chip::TripleCaptain),
            other => Err(format!("Unknown chip code: {}", other)),
        }
    }
}

impl Plan {
    /// Create a new plan in Pending state.
    pub fn new(user_id: String, gameweek: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            gameweek,
            status: PlanStatus::Pending,
            transfers: Vec::new(),
            lineup_swaps: Vec::new(),
            captain_id: None,
            vice_captain_id: None,
            chip_to_play: None,
            original_roster: None,
            created_at: Utc::now(),
            applied_at: None,
        }
    }

    /// Transfers the user accepted, the only ones that reach the platform.
    pub fn accepted_transfers(&self) -> Vec<&Transfer> {
        self.transfers.iter().filter(|t| t.accepted).collect()
    }

    pub fn accepted_swaps(&self) -> Vec<&LineupSwap> {
        self.lineup_swaps.iter().filter(|s| s.accepted).collect()
    }

    /// Capture the pre-edit roster. A no-op if it was already frozen; the
    /// original is never overwritten.
    pub fn freeze_original_roster(&mut self, entries: Vec<RosterEntry>) {
        if self.original_roster.is_none() {
            self.original_roster = Some(entries);
        }
    }

    pub fn mark_applied(&mut self, at: DateTime<Utc>) {
        self.status = PlanStatus::Applied;
        self.applied_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plan_is_pending() {
        let plan = Plan::new("user-1".to_string(), 10);
        assert_eq!(plan.status, PlanStatus::Pending);
        assert!(plan.applied_at.is_none());
        assert!(plan.original_roster.is_none());
    }

    #[test]
    fn test_accepted_transfers_filters_opt_outs() {
        let mut plan = Plan::new("user-1".to_string(), 10);
        plan.transfers = vec![
            Transfer {
                player_out_id: 101,
                player_in_id: 205,
                accepted: true,
            },
            Transfer {
                player_out_id: 102,
                player_in_id: 300,
                accepted: false,
            },
        ];

        let accepted = plan.accepted_transfers();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].player_in_id, 205);
    }

    #[test]
    fn test_freeze_original_roster_is_write_once() {
        let mut plan = Plan::new("user-1".to_string(), 10);
        let first = vec![RosterEntry::new(101, 1)];
        let second = vec![RosterEntry::new(999, 1)];

        plan.freeze_original_roster(first);
        plan.freeze_original_roster(second);

        let frozen = plan.original_roster.as_ref().unwrap();
        assert_eq!(frozen[0].player_id, 101);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(PlanStatus::Applied.is_terminal());
        assert!(PlanStatus::Rejected.is_terminal());
        assert!(!PlanStatus::Pending.is_terminal());
        assert!(!PlanStatus::Previewed.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            PlanStatus::Pending,
            PlanStatus::Previewed,
            PlanStatus::Applied,
            PlanStatus::Rejected,
        ] {
            let parsed: PlanStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<PlanStatus>().is_err());
    }

    #[test]
    fn test_chip_routing() {
        assert!(Chip::Wildcard.rides_transfer_call());
        assert!(Chip::FreeHit.rides_transfer_call());
        assert!(!Chip::BenchBoost.rides_transfer_call());
        assert!(!Chip::TripleCaptain.rides_transfer_call());
        assert_eq!(Chip::TripleCaptain.platform_code(), "3xc");
        assert_eq!(Chip::BenchBoost.platform_code(), "bboost");
    }
}
