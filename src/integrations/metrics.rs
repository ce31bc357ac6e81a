// src/integrations/metrics.rs
//
// Secondary-source statistics capability. The concrete scraper/client lives
// outside this subsystem; the snapshot cache only consumes the per-player
// metrics it returns for enrichment.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::league::PlayerMetrics;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Metrics keyed by player id. Ids without data are simply absent from
    /// the result; that is not an error.
    async fn metrics_for(&self, player_ids: &[i64]) -> AppResult<HashMap<i64, PlayerMetrics>>;
}
