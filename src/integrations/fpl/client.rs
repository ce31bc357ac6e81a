// src/integrations/fpl/client.rs
//
// Fantasy league API client.
//
// ARCHITECTURE:
// - Thin HTTP client over the platform's public and authenticated endpoints
// - Maps external data -> domain types (NO domain mutation)
// - All requests carry a browser-like User-Agent and Referer; the platform
//   rejects obviously server-to-server traffic
// - Mutating requests additionally carry session cookies and a CSRF token
//   obtained from the SessionProvider

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::Serialize;
use std::time::Duration;

use crate::domain::league::Fixture;
use crate::error::{AppError, AppResult};
use crate::integrations::session::AuthHeaders;

use super::models::{
    map_bootstrap, map_fixture, BootstrapData, BootstrapResponse, FixtureData, PicksResponse,
    RosterPicks, RosterSubmission, TransferPayload,
};

const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Remote operations the engine needs from the league platform. Behind a
/// trait so services can be exercised against a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FplApi: Send + Sync {
    /// Bootstrap/static data: players, teams, gameweek calendar.
    async fn bootstrap(&self) -> AppResult<BootstrapData>;

    /// Fixture list, optionally filtered to one gameweek.
    async fn fixtures(&self, gameweek: Option<i32>) -> AppResult<Vec<Fixture>>;

    /// One manager's roster for one gameweek.
    async fn picks(&self, entry_id: i64, gameweek: i32) -> AppResult<RosterPicks>;

    /// Batched transfer mutation. Returns the raw response body for the
    /// audit ledger.
    async fn submit_transfers(
        &self,
        auth: &AuthHeaders,
        payload: &TransferPayload,
    ) -> AppResult<serde_json::Value>;

    /// Whole-roster resubmission (captaincy and standalone chips).
    async fn submit_roster(
        &self,
        auth: &AuthHeaders,
        entry_id: i64,
        submission: &RosterSubmission,
    ) -> AppResult<serde_json::Value>;
}

pub struct FplClient {
    base_url: String,
    http_client: Client,
}

impl FplClient {
    pub fn new() -> AppResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Point the client at a different host. Used by integration tests.
    pub fn with_base_url(base_url: String) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(AppError::Http)?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(format!("{}{}", self.base_url, path))
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::REFERER, format!("{}/", self.base_url))
    }

    fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        auth: &AuthHeaders,
        body: &T,
    ) -> reqwest::RequestBuilder {
        self.http_client
            .post(format!("{}{}", self.base_url, path))
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::REFERER, format!("{}/my-team", self.base_url))
            .header(header::COOKIE, auth.cookies.clone())
            .header("X-CSRFToken", auth.csrf_token.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
    }

    /// Turn a non-success response into an Upstream error carrying the raw
    /// body, so audit records can capture exactly what came back.
    async fn check_status(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl FplApi for FplClient {
    async fn bootstrap(&self) -> AppResult<BootstrapData> {
        let response = self.get("/api/bootstrap-static/").send().await?;
        let response = Self::check_status(response).await?;
        let parsed: BootstrapResponse = response.json().await?;
        Ok(map_bootstrap(parsed))
    }

    async fn fixtures(&self, gameweek: Option<i32>) -> AppResult<Vec<Fixture>> {
        let path = match gameweek {
            Some(gw) => format!("/api/fixtures/?event={}", gw),
            None => "/api/fixtures/".to_string(),
        };

        let response = self.get(&path).send().await?;
        let response = Self::check_status(response).await?;
        let parsed: Vec<FixtureData> = response.json().await?;
        Ok(parsed.into_iter().map(map_fixture).collect())
    }

    async fn picks(&self, entry_id: i64, gameweek: i32) -> AppResult<RosterPicks> {
        let path = format!("/api/entry/{}/event/{}/picks/", entry_id, gameweek);

        let response = self.get(&path).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(AppError::DataUnavailable(format!(
                "Roster for entry {} gameweek {} not yet published",
                entry_id, gameweek
            )));
        }
        let response = Self::check_status(response).await?;
        let parsed: PicksResponse = response.json().await?;

        Ok(RosterPicks {
            entry_id,
            gameweek,
            picks: parsed.picks,
        })
    }

    async fn submit_transfers(
        &self,
        auth: &AuthHeaders,
        payload: &TransferPayload,
    ) -> AppResult<serde_json::Value> {
        let response = self.post("/api/transfers/", auth, payload).send().await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        Ok(parse_body(&body))
    }

    async fn submit_roster(
        &self,
        auth: &AuthHeaders,
        entry_id: i64,
        submission: &RosterSubmission,
    ) -> AppResult<serde_json::Value> {
        let path = format!("/api/my-team/{}/", entry_id);
        let response = self.post(&path, auth, submission).send().await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        Ok(parse_body(&body))
    }
}

/// Mutation endpoints sometimes answer with an empty body on success.
fn parse_body(body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}
