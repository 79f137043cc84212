use crate::cache::CacheBackend;
use crate::config::Config;
use crate::error::StoreError;
use crate::service::backoff::Probe;
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Redis-backed cache using a multiplexed `ConnectionManager`.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("conn", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    /// Dial the server described by `cfg`. Fails if the initial connection
    /// cannot be established within the dial timeout.
    pub async fn open(cfg: &Config) -> Result<Self, StoreError> {
        let url = endpoint_url(cfg)?;
        info!(url = %redact_url(&url), "connecting to Redis");

        let client = redis::Client::open(url.as_str())?;
        let manager_cfg = ConnectionManagerConfig::new()
            .set_connection_timeout(cfg.redis_dial_timeout())
            .set_response_timeout(cfg.redis_io_timeout());
        let conn = ConnectionManager::new_with_config(client, manager_cfg).await?;
        Ok(Self { conn })
    }
}

/// `redis://[user[:password]@]host:port/0`
fn endpoint_url(cfg: &Config) -> Result<Url, StoreError> {
    let mut url = Url::parse(&format!("redis://{}:{}/0", cfg.redis_host, cfg.redis_port))?;
    // Both setters only fail for cannot-be-a-base urls, which redis:// is not.
    if !cfg.redis_username.is_empty() {
        let _ = url.set_username(&cfg.redis_username);
    }
    if !cfg.redis_password.is_empty() {
        let _ = url.set_password(Some(&cfg.redis_password));
    }
    Ok(url)
}

fn redact_url(url: &Url) -> String {
    let mut shown = url.clone();
    if shown.password().is_some() {
        let _ = shown.set_password(Some("***"));
    }
    shown.to_string()
}

#[async_trait]
impl Probe for RedisCache {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) {
        // The multiplexed connection is torn down when the last clone drops.
        debug!("Redis connection manager released");
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs());
        }
        cmd.query_async::<()>(&mut conn).await?;
        Ok(())
    }
}
