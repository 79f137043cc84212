use crate::config::{BACKOFF_BASE, CONNECT_ATTEMPTS, PROBE_TIMEOUT};
use crate::error::{StoreError, TandemError};
use async_trait::async_trait;
use backon::{BackoffBuilder, Retryable};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// A live store handle that can be probed and released.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Lightweight round trip confirming the handle is usable.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self);
}

/// Run `fut` under `after`, reporting expiry as [`StoreError::Timeout`].
pub async fn bounded<T, F>(op: &'static str, after: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| StoreError::Timeout { op, after })?
}

/// Linear backoff: the delay before retry *n* (1-based) is `n * base`.
#[derive(Debug, Clone, Copy)]
pub struct LinearBuilder {
    base: Duration,
    max_attempts: usize,
}

impl LinearBuilder {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            max_attempts: CONNECT_ATTEMPTS,
        }
    }

    /// Total attempts including the first; yields `max_attempts - 1` delays.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

impl Default for LinearBuilder {
    fn default() -> Self {
        Self::new(BACKOFF_BASE)
    }
}

impl BackoffBuilder for LinearBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            base: self.base,
            retries: self.max_attempts - 1,
            done: 0,
        }
    }
}

#[derive(Debug)]
pub struct LinearBackoff {
    base: Duration,
    retries: usize,
    done: usize,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.done >= self.retries {
            return None;
        }
        self.done += 1;
        Some(self.base * self.done as u32)
    }
}

/// Open a store handle and validate it with a bounded probe, retrying with
/// linear backoff. A handle whose probe fails is closed before the next try.
/// The first handle that passes is returned without further delay.
pub async fn connect_with_backoff<T, F, Fut>(
    store: &'static str,
    policy: LinearBuilder,
    open: F,
) -> Result<T, TandemError>
where
    T: Probe,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let attempt = AtomicUsize::new(0);

    let result = (|| async {
        let n = attempt.fetch_add(1, Ordering::Relaxed) + 1;
        let conn = open().await.inspect_err(|e| {
            warn!(store, attempt = n, error = %e, "connection attempt failed");
        })?;

        let probe = bounded("probe", PROBE_TIMEOUT, conn.ping()).await;
        match probe {
            Ok(()) => Ok(conn),
            Err(e) => {
                warn!(store, attempt = n, error = %e, "probe failed; closing connection");
                conn.close().await;
                Err(e)
            }
        }
    })
    .retry(policy)
    .notify(|err: &StoreError, dur: Duration| {
        warn!(store, "retrying connection after error {}, sleeping {:?}", err, dur);
    })
    .await;

    let attempts = attempt.load(Ordering::Relaxed);
    match result {
        Ok(conn) => {
            info!(store, attempts, "connected");
            Ok(conn)
        }
        Err(source) => Err(TandemError::ConnectionEstablishment {
            store,
            attempts,
            source,
        }),
    }
}
