use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// On-pitch role of a player. The upstream platform encodes this as
/// element_type 1..4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPosition {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl FieldPosition {
    /// Map the platform's element_type code. Unknown codes are rejected at
    /// the integration boundary, not here.
    pub fn from_element_type(code: i64) -> Option<Self> {
        match code {
            1 => Some(FieldPosition::Goalkeeper),
            2 => Some(FieldPosition::Defender),
            3 => Some(FieldPosition::Midfielder),
            4 => Some(FieldPosition::Forward),
            _ => None,
        }
    }
}

/// Secondary-source performance metrics, attached only to premium-priced
/// players to bound enrichment call volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    pub expected_goals: f64,
    pub expected_assists: f64,
}

/// A player as known to the league for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,

    /// Display name used by the platform.
    pub web_name: String,

    pub team_id: i64,

    pub position: FieldPosition,

    /// Current price in tenths of a million.
    pub now_cost: i64,

    /// Availability flag as reported upstream ("a" available, "i" injured...).
    pub status: String,

    /// Present only for enriched (premium) players.
    pub metrics: Option<PlayerMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub strength: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub id: i64,

    /// None while the fixture is unscheduled.
    pub gameweek: Option<i32>,

    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_difficulty: i64,
    pub away_difficulty: i64,
    pub kickoff_time: Option<DateTime<Utc>>,
    pub finished: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gameweek {
    pub id: i32,
    pub name: String,
    pub deadline_time: DateTime<Utc>,
    pub is_current: bool,
    pub is_next: bool,
    pub finished: bool,
}

/// A cached, point-in-time, read-only view of league-wide data for one
/// gameweek. Immutable once constructed: a new gameweek number or a forced
/// refresh produces a new Snapshot instance. Owned by the SnapshotCache;
/// everything else borrows it for the duration of one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub gameweek: i32,
    pub captured_at: DateTime<Utc>,
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub fixtures: Vec<Fixture>,
    pub current_gameweek: Option<i32>,
    pub next_gameweek: Option<i32>,
}

impl Snapshot {
    pub fn player(&self, id: i64) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn has_player(&self, id: i64) -> bool {
        self.player(id).is_some()
    }

    pub fn team(&self, id: i64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_player(id: i64) -> Player {
        Player {
            id,
            web_name: format!("Player {}", id),
            team_id: 1,
            position: FieldPosition::Midfielder,
            now_cost: 55,
            status: "a".to_string(),
            metrics: None,
        }
    }

    #[test]
    fn test_field_position_mapping() {
        assert_eq!(
            FieldPosition::from_element_type(1),
            Some(FieldPosition::Goalkeeper)
        );
        assert_eq!(
            FieldPosition::from_element_type(4),
            Some(FieldPosition::Forward)
        );
        assert_eq!(FieldPosition::from_element_type(5), None);
        assert_eq!(FieldPosition::from_element_type(0), None);
    }

    #[test]
    fn test_snapshot_player_lookup() {
        let snapshot = Snapshot {
            gameweek: 10,
            captured_at: Utc::now(),
            players: vec![make_player(101), make_player(205)],
            teams: Vec::new(),
            fixtures: Vec::new(),
            current_gameweek: Some(10),
            next_gameweek: Some(11),
        };

        assert!(snapshot.has_player(101));
        assert!(snapshot.has_player(205));
        assert!(!snapshot.has_player(9999));
        assert_eq!(snapshot.player(205).unwrap().web_name, "Player 205");
    }
}
