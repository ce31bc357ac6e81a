// src/services/snapshot_service.rs
//
// SnapshotCache: the single cached, enriched view of league-wide data that
// every other component reads through. Nothing else talks to the upstream
// league API for read data.
//
// Concurrency notes: reads are cheap Arc clones; the map lock is never held
// across a network call, so concurrent cache misses for the same gameweek
// may each trigger a fetch. Accepted for a single-user, low-frequency loop.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::league::Snapshot;
use crate::error::AppResult;
use crate::integrations::fpl::FplApi;
use crate::integrations::metrics::MetricsProvider;

/// How long a cached snapshot stays fresh.
const FRESHNESS_WINDOW_SECS: i64 = 5 * 60;

/// Players at or above this price (tenths of a million) get secondary-source
/// enrichment. Bounds enrichment call volume.
const PREMIUM_PRICE_TENTHS: i64 = 90;

/// Injected time source so staleness is deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct SnapshotCache {
    api: Arc<dyn FplApi>,
    metrics: Option<Arc<dyn MetricsProvider>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<i32, Arc<Snapshot>>>,
}

impl SnapshotCache {
    pub fn new(api: Arc<dyn FplApi>, metrics: Option<Arc<dyn MetricsProvider>>) -> Self {
        Self::with_clock(api, metrics, Arc::new(SystemClock))
    }

    pub fn with_clock(
        api: Arc<dyn FplApi>,
        metrics: Option<Arc<dyn MetricsProvider>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            metrics,
            clock,
            ttl: Duration::seconds(FRESHNESS_WINDOW_SECS),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached snapshot for the gameweek, fetching a new one when the cached
    /// entry is missing, stale, or bypassed via force_refresh.
    pub async fn get(&self, gameweek: i32, force_refresh: bool) -> AppResult<Arc<Snapshot>> {
        if !force_refresh {
            if let Some(snapshot) = self.fresh_entry(gameweek) {
                return Ok(snapshot);
            }
        }

        let snapshot = Arc::new(self.fetch(gameweek).await?);

        let mut entries = self.entries.lock().unwrap();
        entries.insert(gameweek, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop one cached gameweek, or everything.
    pub fn invalidate(&self, gameweek: Option<i32>) {
        let mut entries = self.entries.lock().unwrap();
        match gameweek {
            Some(gw) => {
                entries.remove(&gw);
            }
            None => entries.clear(),
        }
    }

    /// Age of the cached entry for observability; None when nothing cached.
    pub fn age(&self, gameweek: i32) -> Option<Duration> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(&gameweek)
            .map(|s| self.clock.now() - s.captured_at)
    }

    pub fn is_stale(&self, gameweek: i32) -> bool {
        match self.age(gameweek) {
            Some(age) => age >= self.ttl,
            None => true,
        }
    }

    fn fresh_entry(&self, gameweek: i32) -> Option<Arc<Snapshot>> {
        let entries = self.entries.lock().unwrap();
        let snapshot = entries.get(&gameweek)?;
        let age = self.clock.now() - snapshot.captured_at;
        if age < self.ttl {
            Some(Arc::clone(snapshot))
        } else {
            None
        }
    }

    async fn fetch(&self, gameweek: i32) -> AppResult<Snapshot> {
        info!("Fetching league snapshot for gameweek {}", gameweek);

        let (bootstrap, fixtures) =
            tokio::join!(self.api.bootstrap(), self.api.fixtures(Some(gameweek)));
        let bootstrap = bootstrap?;
        let fixtures = fixtures?;

        let mut players = bootstrap.players;

        if let Some(metrics) = &self.metrics {
            let premium_ids: Vec<i64> = players
                .iter()
                .filter(|p| p.now_cost >= PREMIUM_PRICE_TENTHS)
                .map(|p| p.id)
                .collect();

            if !premium_ids.is_empty() {
                // Enrichment is best-effort; a failed secondary fetch must
                // not block the snapshot.
                match metrics.metrics_for(&premium_ids).await {
                    Ok(by_id) => {
                        for player in players.iter_mut() {
                            if let Some(m) = by_id.get(&player.id) {
                                player.metrics = Some(m.clone());
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Metrics enrichment failed for gameweek {}: {}", gameweek, e);
                    }
                }
            }
        }

        let current_gameweek = bootstrap
            .gameweeks
            .iter()
            .find(|g| g.is_current)
            .map(|g| g.id);
        let next_gameweek = bootstrap.gameweeks.iter().find(|g| g.is_next).map(|g| g.id);

        Ok(Snapshot {
            gameweek,
            captured_at: self.clock.now(),
            players,
            teams: bootstrap.teams,
            fixtures,
            current_gameweek,
            next_gameweek,
        })
    }
}
