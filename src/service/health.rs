use crate::cache::CacheClient;
use crate::db::ArticleClient;
use crate::error::StoreError;
use axum::http::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Connected,
    Disconnected,
}

/// Per-store reachability, computed fresh on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub mysql: StoreStatus,
    pub redis: StoreStatus,
}

impl HealthReport {
    /// Ping both stores concurrently under one shared deadline. A failure on
    /// one side never short-circuits the other.
    pub async fn probe(articles: &ArticleClient, cache: &CacheClient, within: Duration) -> Self {
        let deadline = Instant::now() + within;
        let (mysql, redis) = tokio::join!(
            timeout_at(deadline, articles.ping()),
            timeout_at(deadline, cache.ping()),
        );
        let expired = |op| Err(StoreError::Timeout { op, after: within });
        Self {
            mysql: status_of("mysql", mysql.unwrap_or_else(|_| expired("health.mysql"))),
            redis: status_of("redis", redis.unwrap_or_else(|_| expired("health.redis"))),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.mysql == StoreStatus::Connected && self.redis == StoreStatus::Connected
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn status_of(store: &'static str, outcome: Result<(), StoreError>) -> StoreStatus {
    match outcome {
        Ok(()) => StoreStatus::Connected,
        Err(e) => {
            warn!(store, error = %e, "health ping failed");
            StoreStatus::Disconnected
        }
    }
}
