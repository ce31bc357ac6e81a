// src/services/plan_execution_tests.rs
//
// End-to-end tests for the plan execution flow: real SQLite repositories,
// mocked platform API and session.

use std::sync::Arc;

use crate::db::{create_test_pool, initialize_database};
use crate::domain::audit::{AuditRecord, ChangeType};
use crate::domain::plan::{Chip, Plan, PlanStatus, Transfer};
use crate::domain::roster::RosterEntry;
use crate::error::AppError;
use crate::integrations::fpl::client::MockFplApi;
use crate::integrations::fpl::models::{PickData, RosterPicks};
use crate::integrations::fpl::BootstrapData;
use crate::integrations::session::{AuthHeaders, MockSessionProvider};
use crate::repositories::{
    AuditRepository, LineupRepository, PlanRepository, SqliteAuditRepository,
    SqliteLineupRepository, SqlitePlanRepository,
};
use crate::services::captaincy_executor::CaptaincyExecutor;
use crate::services::chip_executor::ChipExecutor;
use crate::services::lineup_reconciler::LineupReconciler;
use crate::services::plan_execution_service::PlanExecutionService;
use crate::services::snapshot_service::SnapshotCache;
use crate::services::transfer_executor::TransferExecutor;

use crate::domain::league::{FieldPosition, Gameweek, Player, Team};
use chrono::Utc;

struct Harness {
    service: PlanExecutionService,
    plans: Arc<SqlitePlanRepository>,
    audit: Arc<SqliteAuditRepository>,
    lineups: Arc<SqliteLineupRepository>,
}

fn position_for(offset: u8) -> FieldPosition {
    match offset {
        1 | 12 => FieldPosition::Goalkeeper,
        2..=5 | 13 => FieldPosition::Defender,
        6..=9 | 14 => FieldPosition::Midfielder,
        _ => FieldPosition::Forward,
    }
}

fn make_bootstrap() -> BootstrapData {
    let mut players: Vec<Player> = (1..=15u8)
        .map(|offset| Player {
            id: 100 + offset as i64,
            web_name: format!("Player {}", 100 + offset as i64),
            team_id: 1,
            position: position_for(offset),
            now_cost: 55,
            status: "a".to_string(),
            metrics: None,
        })
        .collect();
    players.push(Player {
        id: 205,
        web_name: "Player 205".to_string(),
        team_id: 2,
        position: FieldPosition::Midfielder,
        now_cost: 80,
        status: "a".to_string(),
        metrics: None,
    });

    BootstrapData {
        players,
        teams: vec![Team {
            id: 1,
            name: "Team One".to_string(),
            short_name: "ONE".to_string(),
            strength: 3,
        }],
        gameweeks: vec![Gameweek {
            id: 10,
            name: "Gameweek 10".to_string(),
            deadline_time: Utc::now(),
            is_current: true,
            is_next: false,
            finished: false,
        }],
    }
}

fn make_picks() -> RosterPicks {
    RosterPicks {
        entry_id: 42,
        gameweek: 10,
        picks: (1..=15u8)
            .map(|pos| PickData {
                element: 100 + pos as i64,
                position: pos,
                multiplier: if pos == 1 {
                    2
                } else if pos <= 11 {
                    1
                } else {
                    0
                },
                is_captain: pos == 1,
                is_vice_captain: pos == 2,
                selling_price: Some(50),
                purchase_price: Some(48),
            })
            .collect(),
    }
}

fn frozen_roster() -> Vec<RosterEntry> {
    make_picks().to_roster_entries()
}

/// API mock primed for the snapshot fetch; submission expectations are
/// layered on per test.
fn make_api() -> MockFplApi {
    let mut api = MockFplApi::new();
    api.expect_bootstrap().returning(|| Ok(make_bootstrap()));
    api.expect_fixtures().returning(|_| Ok(Vec::new()));
    api
}

fn make_session() -> MockSessionProvider {
    let mut session = MockSessionProvider::new();
    session.expect_get_auth_headers().returning(|_| {
        Ok(AuthHeaders {
            cookies: "sessionid=abc".to_string(),
            csrf_token: "csrf".to_string(),
            entry_id: 42,
        })
    });
    session
}

fn build(api: MockFplApi, session: MockSessionProvider) -> Harness {
    let pool = Arc::new(create_test_pool().unwrap());
    let conn = pool.get().unwrap();
    initialize_database(&conn).unwrap();
    drop(conn);

    let plans = Arc::new(SqlitePlanRepository::new(Arc::clone(&pool)));
    let audit = Arc::new(SqliteAuditRepository::new(Arc::clone(&pool)));
    let lineups = Arc::new(SqliteLineupRepository::new(pool));

    let api: Arc<MockFplApi> = Arc::new(api);
    let session: Arc<MockSessionProvider> = Arc::new(session);

    let snapshots = Arc::new(SnapshotCache::new(api.clone(), None));

    let transfer_executor = Arc::new(TransferExecutor::new(
        api.clone(),
        session.clone(),
        audit.clone(),
    ));
    let captaincy_executor = Arc::new(CaptaincyExecutor::new(
        api.clone(),
        session.clone(),
        audit.clone(),
    ));
    let chip_executor = Arc::new(ChipExecutor::new(
        api.clone(),
        session.clone(),
        audit.clone(),
    ));
    let reconciler = Arc::new(LineupReconciler::new(
        api.clone(),
        session.clone(),
        lineups.clone(),
    ));

    let service = PlanExecutionService::new(
        plans.clone(),
        snapshots,
        transfer_executor,
        captaincy_executor,
        chip_executor,
        reconciler,
        audit.clone(),
        session,
        api,
    );

    Harness {
        service,
        plans,
        audit,
        lineups,
    }
}

fn make_plan() -> Plan {
    let mut plan = Plan::new("user-1".to_string(), 10);
    plan.freeze_original_roster(frozen_roster());
    plan
}

#[tokio::test]
async fn test_full_plan_applies_all_steps_and_reconciles() {
    let mut api = make_api();
    api.expect_picks().returning(|_, _| Ok(make_picks()));
    api.expect_submit_transfers()
        .times(1)
        .returning(|_, _| Ok(serde_json::Value::Null));
    // Captaincy and bench boost each resubmit the whole roster
    api.expect_submit_roster()
        .times(2)
        .returning(|_, _, _| Ok(serde_json::Value::Null));

    let harness = build(api, make_session());

    let mut plan = make_plan();
    plan.transfers = vec![Transfer {
        player_out_id: 106,
        player_in_id: 205,
        accepted: true,
    }];
    plan.captain_id = Some(102);
    plan.vice_captain_id = Some(103);
    plan.chip_to_play = Some(Chip::BenchBoost);
    harness.plans.save(&plan).unwrap();

    let result = harness.service.apply("user-1", plan.id).await.unwrap();

    assert!(result.transfers_applied);
    assert!(result.captain_set);
    assert!(result.chip_played);
    assert!(result.errors.is_empty());

    let stored = harness.plans.find_by_id(plan.id).unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Applied);
    assert!(stored.applied_at.is_some());

    let records = harness.audit.list_for_gameweek("user-1", 10).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.applied_successfully));

    let lineup = harness.lineups.find_by_plan(plan.id).unwrap().unwrap();
    assert!(lineup.entries.iter().any(|e| e.player_id == 205));
    assert_eq!(lineup.captain_id, Some(102));
}

#[tokio::test]
async fn test_transfer_failure_does_not_block_captaincy() {
    let mut api = make_api();
    api.expect_picks().returning(|_, _| Ok(make_picks()));
    api.expect_submit_transfers().times(1).returning(|_, _| {
        Err(AppError::Upstream {
            status: 400,
            body: "{\"details\": \"Not enough money\"}".to_string(),
        })
    });
    api.expect_submit_roster()
        .times(1)
        .returning(|_, _, _| Ok(serde_json::Value::Null));

    let harness = build(api, make_session());

    let mut plan = make_plan();
    plan.transfers = vec![Transfer {
        player_out_id: 106,
        player_in_id: 205,
        accepted: true,
    }];
    plan.captain_id = Some(102);
    plan.vice_captain_id = Some(103);
    harness.plans.save(&plan).unwrap();

    let result = harness.service.apply("user-1", plan.id).await.unwrap();

    assert!(!result.transfers_applied);
    assert!(result.captain_set);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("Not enough money"));

    // Not fully applied, so the plan stays re-appliable and no lineup is
    // reconstructed.
    let stored = harness.plans.find_by_id(plan.id).unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Pending);
    assert!(harness.lineups.find_by_plan(plan.id).unwrap().is_none());

    // Both attempts are on the ledger, one failed and one successful
    let records = harness.audit.list_for_gameweek("user-1", 10).unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_reapply_skips_already_successful_categories() {
    let mut api = make_api();
    api.expect_picks().returning(|_, _| Ok(make_picks()));
    api.expect_submit_transfers()
        .times(1)
        .returning(|_, _| Ok(serde_json::Value::Null));
    // The captaincy step must not resubmit
    api.expect_submit_roster().times(0);

    let harness = build(api, make_session());

    let mut plan = make_plan();
    plan.transfers = vec![Transfer {
        player_out_id: 106,
        player_in_id: 205,
        accepted: true,
    }];
    plan.captain_id = Some(102);
    plan.vice_captain_id = Some(103);
    harness.plans.save(&plan).unwrap();

    // A previous attempt already set the captain
    harness
        .audit
        .append(&AuditRecord::success(
            "user-1",
            10,
            ChangeType::Captain,
            serde_json::json!({"captain_id": 102}),
        ))
        .unwrap();

    let result = harness.service.apply("user-1", plan.id).await.unwrap();

    assert!(result.transfers_applied);
    assert!(result.captain_set);
    assert!(result.errors.is_empty());
    assert_eq!(
        result.details.get("captain").and_then(|v| v.as_str()),
        Some("already applied in a previous attempt")
    );

    let stored = harness.plans.find_by_id(plan.id).unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Applied);
}

#[tokio::test]
async fn test_applied_plan_fast_fails_without_network() {
    // No API expectations: any call would panic the mock
    let api = MockFplApi::new();
    let mut session = MockSessionProvider::new();
    session.expect_get_auth_headers().times(0);

    let harness = build(api, session);

    let mut plan = make_plan();
    plan.mark_applied(Utc::now());
    harness.plans.save(&plan).unwrap();

    let err = harness.service.apply("user-1", plan.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.to_string().contains("already been applied"));

    assert!(harness.audit.list_for_gameweek("user-1", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_failure_aborts_before_any_mutation() {
    let api = make_api();
    let harness = build(api, make_session());

    let mut plan = make_plan();
    plan.transfers = vec![Transfer {
        player_out_id: 106,
        player_in_id: 9999,
        accepted: true,
    }];
    harness.plans.save(&plan).unwrap();

    let err = harness.service.apply("user-1", plan.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.to_string().contains("9999"));

    assert!(harness.audit.list_for_gameweek("user-1", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_wildcard_rides_the_transfer_call() {
    let mut api = make_api();
    api.expect_picks().returning(|_, _| Ok(make_picks()));
    api.expect_submit_transfers()
        .times(1)
        .withf(|_, payload| payload.chip.as_deref() == Some("wildcard"))
        .returning(|_, _| Ok(serde_json::Value::Null));
    // No standalone roster resubmission for a transfer-bound chip
    api.expect_submit_roster().times(0);

    let harness = build(api, make_session());

    let mut plan = make_plan();
    plan.transfers = vec![Transfer {
        player_out_id: 106,
        player_in_id: 205,
        accepted: true,
    }];
    plan.chip_to_play = Some(Chip::Wildcard);
    harness.plans.save(&plan).unwrap();

    let result = harness.service.apply("user-1", plan.id).await.unwrap();

    assert!(result.transfers_applied);
    assert!(!result.chip_played);
    assert!(result.errors.is_empty());
    assert_eq!(
        result.details.get("chip").and_then(|v| v.as_str()),
        Some("chip wildcard submitted with the transfer call")
    );

    let stored = harness.plans.find_by_id(plan.id).unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Applied);
}

#[tokio::test]
async fn test_missing_baseline_is_frozen_from_previous_gameweek() {
    let mut api = make_api();
    api.expect_picks().returning(|_, _| Ok(make_picks()));
    api.expect_submit_transfers()
        .returning(|_, _| Ok(serde_json::Value::Null));

    let harness = build(api, make_session());

    let mut plan = Plan::new("user-1".to_string(), 10);
    plan.transfers = vec![Transfer {
        player_out_id: 106,
        player_in_id: 205,
        accepted: true,
    }];
    harness.plans.save(&plan).unwrap();

    harness.service.apply("user-1", plan.id).await.unwrap();

    let stored = harness.plans.find_by_id(plan.id).unwrap().unwrap();
    let frozen = stored.original_roster.unwrap();
    assert_eq!(frozen.len(), 15);
    // The frozen copy predates the plan's edits
    assert!(frozen.iter().any(|e| e.player_id == 106));
}

#[tokio::test]
async fn test_captaincy_without_vice_is_skipped_not_defaulted() {
    let mut api = make_api();
    api.expect_picks().returning(|_, _| Ok(make_picks()));
    api.expect_submit_transfers()
        .times(1)
        .returning(|_, _| Ok(serde_json::Value::Null));
    // A half-specified captaincy change must never reach the platform
    api.expect_submit_roster().times(0);

    let harness = build(api, make_session());

    let mut plan = make_plan();
    plan.transfers = vec![Transfer {
        player_out_id: 106,
        player_in_id: 205,
        accepted: true,
    }];
    plan.captain_id = Some(102);
    plan.vice_captain_id = None;
    harness.plans.save(&plan).unwrap();

    let result = harness.service.apply("user-1", plan.id).await.unwrap();

    assert!(result.transfers_applied);
    assert!(!result.captain_set);
    assert!(result.errors.is_empty());
    assert_eq!(
        result.details.get("captain").and_then(|v| v.as_str()),
        Some("skipped: captaincy change requires both captain and vice-captain")
    );

    // The skipped step is not applicable, so the plan still completes
    let stored = harness.plans.find_by_id(plan.id).unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Applied);
}

#[tokio::test]
async fn test_reconciliation_failure_leaves_plan_applied() {
    let mut api = make_api();
    api.expect_picks().returning(|_, _| Ok(make_picks()));
    api.expect_submit_transfers()
        .times(1)
        .returning(|_, _| Ok(serde_json::Value::Null));

    let harness = build(api, make_session());

    let mut plan = make_plan();
    plan.transfers = vec![Transfer {
        player_out_id: 106,
        player_in_id: 205,
        accepted: true,
    }];
    // A short baseline makes the reconciled squad fail its 15-entry check
    // after the remote mutation already landed.
    plan.original_roster.as_mut().unwrap().truncate(14);
    harness.plans.save(&plan).unwrap();

    let result = harness.service.apply("user-1", plan.id).await.unwrap();

    assert!(result.transfers_applied);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("reconciliation failed"));

    // The remote state changed, so the plan stays Applied; only the local
    // lineup record is missing.
    let stored = harness.plans.find_by_id(plan.id).unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Applied);
    assert!(harness.lineups.find_by_plan(plan.id).unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_plan_is_not_found() {
    let harness = build(MockFplApi::new(), MockSessionProvider::new());
    let err = harness
        .service
        .apply("user-1", uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn test_foreign_plan_is_rejected() {
    let harness = build(MockFplApi::new(), MockSessionProvider::new());

    let plan = make_plan();
    harness.plans.save(&plan).unwrap();

    let err = harness.service.apply("user-2", plan.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_missing_session_surfaces_before_validation() {
    let api = make_api();
    let mut session = MockSessionProvider::new();
    session
        .expect_get_auth_headers()
        .returning(|_| Err(AppError::Authentication("no stored session".to_string())));

    let harness = build(api, session);

    let plan = make_plan();
    harness.plans.save(&plan).unwrap();

    let err = harness.service.apply("user-1", plan.id).await.unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
}
