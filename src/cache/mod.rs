//! Key-value cache store and the client request code talks to.

pub mod redis;

pub use self::redis::RedisCache;

use crate::config::STORE_OP_TIMEOUT;
use crate::error::{StoreError, TandemError};
use crate::service::backoff::{Probe, bounded};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Raw key-value storage: GET / SET / PING.
#[async_trait]
pub trait CacheBackend: Probe {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// `ttl == None` stores the entry without expiration.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub timeouts: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    timeouts: AtomicU64,
}

/// Shared handle to the cache store.
#[derive(Clone)]
pub struct CacheClient {
    backend: Arc<dyn CacheBackend>,
    counters: Arc<Counters>,
    op_timeout: Duration,
}

impl CacheClient {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            counters: Arc::default(),
            op_timeout: STORE_OP_TIMEOUT,
        }
    }

    pub async fn get(&self, key: &str) -> Result<String, TandemError> {
        let start = Instant::now();
        let result = bounded("cache.get", self.op_timeout, self.backend.get(key)).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Some(value)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, elapsed_ms, "cache hit");
                Ok(value)
            }
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, elapsed_ms, "cache miss");
                Err(TandemError::NotFound("Key not found"))
            }
            Err(e) => {
                self.record_failure(&e);
                error!(key, error = %e, elapsed_ms, "failed to get key from cache");
                Err(TandemError::internal("Cache operation failed", e))
            }
        }
    }

    /// Store `value` under `key`. A `ttl_secs` of 0 means no expiration.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), TandemError> {
        if key.is_empty() || value.is_empty() {
            return Err(TandemError::Validation("Key and value are required"));
        }
        let ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));

        let start = Instant::now();
        let result = bounded("cache.set", self.op_timeout, self.backend.set(key, value, ttl)).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                debug!(key, ttl_secs, elapsed_ms, "cache set");
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e);
                error!(key, error = %e, elapsed_ms, "failed to set key in cache");
                Err(TandemError::internal("Cache operation failed", e))
            }
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.ping().await
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
        }
    }

    pub async fn close(&self) {
        self.backend.close().await;
    }

    fn record_failure(&self, e: &StoreError) {
        if e.is_timeout() {
            self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }
}
