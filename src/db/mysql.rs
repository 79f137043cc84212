use crate::config::Config;
use crate::db::models::Article;
use crate::db::schema::{GET_BY_ID, LIST_PUBLISHED};
use crate::db::{ArticleBackend, RelationalPoolStats};
use crate::error::StoreError;
use crate::service::backoff::Probe;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{Connection, MySql, Pool, Row};
use std::time::Duration;
use tracing::{debug, info, warn};

pub type MySqlPool = Pool<MySql>;

#[derive(Clone)]
pub struct MySqlArticles {
    pool: MySqlPool,
}

impl MySqlArticles {
    /// Build a lazily-connecting pool configured from `cfg`.
    /// No I/O happens here; the first probe opens the first connection.
    pub async fn open(cfg: &Config) -> Result<Self, StoreError> {
        info!(
            host = %cfg.db_host,
            port = cfg.db_port,
            database = %cfg.db_database,
            user = %cfg.db_username,
            "opening MySQL pool"
        );
        let connect_opts = MySqlConnectOptions::new()
            .host(&cfg.db_host)
            .port(cfg.db_port)
            .database(&cfg.db_database)
            .username(&cfg.db_username)
            .password(&cfg.db_password);
        let pool = MySqlPoolOptions::new()
            .max_connections(cfg.db_max_connections)
            .min_connections(cfg.db_min_connections.min(cfg.db_max_connections))
            .max_lifetime(cfg.db_max_lifetime())
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(connect_opts);
        Ok(Self::new(pool))
    }

    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_model(row: &MySqlRow) -> Result<Article, sqlx::Error> {
        Ok(Article {
            id: row.try_get("id")?,
            user_id: optional_column(row, "user_id")?,
            title: row.try_get("title")?,
            slug: row.try_get("slug")?,
            body: row.try_get("body")?,
            markdown: optional_column(row, "markdown")?,
            is_published: row.try_get("is_published")?,
            created: row.try_get("created")?,
            modified: optional_column(row, "modified")?,
        })
    }
}

// The listing query selects a narrower column set; missing columns read as NULL.
fn optional_column<T>(row: &MySqlRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    match row.try_get::<Option<T>, _>(column) {
        Err(sqlx::Error::ColumnNotFound(_)) => Ok(None),
        other => other,
    }
}

#[async_trait]
impl Probe for MySqlArticles {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("MySQL pool closed");
    }
}

#[async_trait]
impl ArticleBackend for MySqlArticles {
    async fn list_published(&self, limit: u32) -> Result<Vec<Article>, StoreError> {
        let rows = sqlx::query(LIST_PUBLISHED)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let articles = rows
            .iter()
            .filter_map(|row| {
                Self::row_to_model(row)
                    .inspect_err(|e| warn!(error = %e, "skipping undecodable article row"))
                    .ok()
            })
            .collect();
        Ok(articles)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, StoreError> {
        let row = sqlx::query(GET_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(Self::row_to_model)
            .transpose()
            .map_err(StoreError::from)
    }

    fn pool_stats(&self) -> RelationalPoolStats {
        let open = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        RelationalPoolStats {
            max_open: self.pool.options().get_max_connections(),
            open,
            in_use: open.saturating_sub(idle),
            idle,
        }
    }
}
