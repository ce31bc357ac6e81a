// src/services/captaincy_executor.rs
//
// Applies a plan's captain and vice-captain choice. The platform has no
// captain-only endpoint, so the current picks are fetched, the flags are
// rewritten locally, and the whole roster is resubmitted.

use log::{error, info};
use std::sync::Arc;

use crate::domain::audit::{AuditRecord, ChangeType};
use crate::domain::roster::RosterMutation;
use crate::error::AppResult;
use crate::integrations::fpl::{FplApi, RosterSubmission};
use crate::integrations::session::SessionProvider;
use crate::repositories::AuditRepository;

use super::executor_support::{refresh_session_if_expired, upstream_error_message};

pub struct CaptaincyExecutor {
    api: Arc<dyn FplApi>,
    session: Arc<dyn SessionProvider>,
    audit: Arc<dyn AuditRepository>,
}

impl CaptaincyExecutor {
    pub fn new(
        api: Arc<dyn FplApi>,
        session: Arc<dyn SessionProvider>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            api,
            session,
            audit,
        }
    }

    /// Set the captain and vice-captain for one gameweek. Every attempt,
    /// including ones that never reach the platform, is audited.
    pub async fn apply(
        &self,
        user_id: &str,
        captain_id: i64,
        vice_captain_id: i64,
        gameweek: i32,
    ) -> AppResult<()> {
        let change_data = serde_json::json!({
            "captain_id": captain_id,
            "vice_captain_id": vice_captain_id,
        });

        let auth = match self.session.get_auth_headers(user_id).await {
            Ok(auth) => auth,
            Err(e) => {
                self.record_failure(user_id, gameweek, change_data, e.to_string())?;
                return Err(e);
            }
        };

        let picks = match self.api.picks(auth.entry_id, gameweek).await {
            Ok(picks) => picks,
            Err(e) => {
                let message = upstream_error_message(&e);
                refresh_session_if_expired(&self.session, user_id, &e).await;
                self.record_failure(user_id, gameweek, change_data, message)?;
                return Err(e);
            }
        };

        let mutation = RosterMutation::new(picks.to_roster_entries())
            .with_captaincy(captain_id, vice_captain_id);
        let submission = RosterSubmission::from_mutation(&mutation);

        info!(
            "Setting captain {} (vice {}) for user {} gameweek {}",
            captain_id, vice_captain_id, user_id, gameweek
        );

        match self.api.submit_roster(&auth, auth.entry_id, &submission).await {
            Ok(response) => {
                self.audit.append(&AuditRecord::success(
                    user_id,
                    gameweek,
                    ChangeType::Captain,
                    serde_json::json!({
                        "request": change_data,
                        "response": response,
                    }),
                ))?;
                Ok(())
            }
            Err(e) => {
                let message = upstream_error_message(&e);
                error!(
                    "Captaincy submission failed for user {} gameweek {}: {}",
                    user_id, gameweek, message
                );
                refresh_session_if_expired(&self.session, user_id, &e).await;
                self.record_failure(user_id, gameweek, change_data, message)?;
                Err(e)
            }
        }
    }

    fn record_failure(
        &self,
        user_id: &str,
        gameweek: i32,
        change_data: serde_json::Value,
        message: String,
    ) -> AppResult<()> {
        self.audit.append(&AuditRecord::failure(
            user_id,
            gameweek,
            ChangeType::Captain,
            change_data,
            message,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, initialize_database};
    use crate::error::AppError;
    use crate::integrations::fpl::client::MockFplApi;
    use crate::integrations::fpl::models::{PickData, RosterPicks};
    use crate::integrations::session::{AuthHeaders, MockSessionProvider};
    use crate::repositories::SqliteAuditRepository;

    fn make_audit_repo() -> Arc<SqliteAuditRepository> {
        let pool = Arc::new(create_test_pool().unwrap());
        let conn = pool.get().unwrap();
        initialize_database(&conn).unwrap();
        drop(conn);
        Arc::new(SqliteAuditRepository::new(pool))
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
                    selling_price: None,
                    purchase_price: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_resubmits_whole_roster_with_new_captain() {
        let mut api = MockFplApi::new();
        api.expect_picks().times(1).returning(|_, _| Ok(make_picks()));
        api.expect_submit_roster()
            .times(1)
            .withf(|_, entry_id, submission| {
                *entry_id == 42
                    && submission.picks.len() == 15
                    && submission
                        .picks
                        .iter()
                        .any(|p| p.element == 105 && p.is_captain)
                    && submission
                        .picks
                        .iter()
                        .any(|p| p.element == 103 && p.is_vice_captain)
                    && !submission.picks.iter().any(|p| p.element == 101 && p.is_captain)
                    && submission.chip.is_none()
            })
            .returning(|_, _, _| Ok(serde_json::Value::Null));

        let audit = make_audit_repo();
        let executor =
            CaptaincyExecutor::new(Arc::new(api), Arc::new(make_session()), audit.clone());

        executor.apply("user-1", 105, 103, 10).await.unwrap();

        let records = audit.list_for_gameweek("user-1", 10).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].applied_successfully);
        assert_eq!(records[0].change_type, ChangeType::Captain);
    }

    #[tokio::test]
    async fn test_picks_failure_is_audited_without_submission() {
        let mut api = MockFplApi::new();
        api.expect_picks()
            .returning(|_, _| Err(AppError::DataUnavailable("not published".to_string())));
        api.expect_submit_roster().times(0);

        let audit = make_audit_repo();
        let executor =
            CaptaincyExecutor::new(Arc::new(api), Arc::new(make_session()), audit.clone());

        let err = executor.apply("user-1", 105, 103, 10).await.unwrap_err();
        assert!(matches!(err, AppError::DataUnavailable(_)));

        let records = audit.list_for_gameweek("user-1", 10).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].applied_successfully);
    }

    #[tokio::test]
    async fn test_expired_session_refreshes_once_and_surfaces() {
        let mut api = MockFplApi::new();
        api.expect_picks().returning(|_, _| Ok(make_picks()));
        api.expect_submit_roster().times(1).returning(|_, _, _| {
            Err(AppError::Upstream {
                status: 403,
                body: "{\"detail\": \"CSRF verification failed\"}".to_string(),
            })
        });

        let mut session = make_session();
        session.expect_refresh().times(1).returning(|_| Ok(()));

        let audit = make_audit_repo();
        let executor =
            CaptaincyExecutor::new(Arc::new(api), Arc::new(session), audit.clone());

        let err = executor.apply("user-1", 105, 103, 10).await.unwrap_err();
        assert!(err.is_auth_expired());

        let records = audit.list_for_gameweek("user-1", 10).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].applied_successfully);
        assert!(records[0]
            .error_message
            .as_deref()
            .unwrap()
            .contains("CSRF"));
    }
}
