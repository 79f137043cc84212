use crate::cache::CacheStats;
use crate::db::RelationalPoolStats;
use crate::router::TandemState;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub mysql: RelationalPoolStats,
    pub redis: CacheStats,
}

impl PoolSnapshot {
    pub fn collect(state: &TandemState) -> Self {
        Self {
            mysql: state.articles.stats(),
            redis: state.cache.stats(),
        }
    }

    pub fn log(&self) {
        info!(
            max_open = self.mysql.max_open,
            open = self.mysql.open,
            in_use = self.mysql.in_use,
            idle = self.mysql.idle,
            "MySQL pool stats"
        );
        info!(
            hits = self.redis.hits,
            misses = self.redis.misses,
            timeouts = self.redis.timeouts,
            "Redis stats"
        );
    }
}

/// Log a pool snapshot every `period`, first one a full period after start.
/// Reads race with live traffic; snapshots are best effort.
pub fn spawn(state: TandemState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            PoolSnapshot::collect(&state).log();
        }
    })
}
