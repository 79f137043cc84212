use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TandemError;

/// Connection attempts made per store at startup.
pub const CONNECT_ATTEMPTS: usize = 3;
/// Base of the linear backoff between connection attempts.
pub const BACKOFF_BASE: Duration = Duration::from_secs(2);
/// Deadline for the validation probe run after each connection attempt.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Deadline for every steady-state store operation.
pub const STORE_OP_TIMEOUT: Duration = Duration::from_secs(5);
/// Shared deadline for both health probes.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Period between pool statistics snapshots.
pub const STATS_INTERVAL: Duration = Duration::from_secs(30);
/// Upper bound on in-flight request drain at shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum rows returned by the published-articles listing.
pub const ARTICLE_LIST_LIMIT: u32 = 50;

const STRING_KEYS: [&str; 9] = [
    "listen_addr",
    "loglevel",
    "db_host",
    "db_database",
    "db_username",
    "db_password",
    "redis_host",
    "redis_username",
    "redis_password",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub listen_addr: String,
    pub loglevel: String,

    pub db_host: String,
    pub db_port: u16,
    pub db_database: String,
    pub db_username: String,
    pub db_password: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_max_lifetime_secs: u64,

    pub redis_host: String,
    pub redis_port: u16,
    pub redis_username: String,
    pub redis_password: String,
    pub redis_dial_timeout_secs: u64,
    pub redis_io_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            loglevel: "info".to_string(),
            db_host: "mysql".to_string(),
            db_port: 3306,
            db_database: "cms".to_string(),
            db_username: "cms_user".to_string(),
            db_password: "password".to_string(),
            db_max_connections: 25,
            db_min_connections: 5,
            db_max_lifetime_secs: 300,
            redis_host: "redis".to_string(),
            redis_port: 6379,
            redis_username: String::new(),
            redis_password: String::new(),
            redis_dial_timeout_secs: 10,
            redis_io_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Defaults overlaid with process environment (`DB_HOST`, `REDIS_PORT`, ...).
    pub fn from_env() -> Result<Self, TandemError> {
        Self::from_figment(Self::env_figment())
    }

    /// `Env` parses values into typed scalars, so `DB_PASSWORD=0000` would
    /// arrive as the number 0. String keys are re-read verbatim on top.
    pub fn env_figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default())).merge(Env::raw());
        for key in STRING_KEYS {
            if let Ok(raw) = std::env::var(key.to_ascii_uppercase()) {
                figment = figment.merge(Serialized::default(key, raw));
            }
        }
        figment
    }

    pub fn from_figment(figment: Figment) -> Result<Self, TandemError> {
        let mut cfg: Config = figment.extract()?;
        cfg.fill_blanks();
        Ok(cfg)
    }

    // An exported-but-empty variable means "unset" for these.
    fn fill_blanks(&mut self) {
        let defaults = Config::default();
        let pairs = [
            (&mut self.listen_addr, defaults.listen_addr),
            (&mut self.loglevel, defaults.loglevel),
            (&mut self.db_host, defaults.db_host),
            (&mut self.db_database, defaults.db_database),
            (&mut self.db_username, defaults.db_username),
            (&mut self.redis_host, defaults.redis_host),
        ];
        for (field, default) in pairs {
            if field.trim().is_empty() {
                *field = default;
            }
        }
    }

    pub fn db_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.db_max_lifetime_secs)
    }

    pub fn redis_dial_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_dial_timeout_secs)
    }

    pub fn redis_io_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_io_timeout_secs)
    }
}
