//! Relational store: article models, SQL, and the client request code talks to.
//!
//! Layout:
//! - `models.rs`: the `Article` row type
//! - `schema.rs`: the two queries issued against `articles`
//! - `mysql.rs`: sqlx-backed `ArticleBackend`

pub mod models;
pub mod mysql;
pub mod schema;

pub use models::Article;
pub use mysql::{MySqlArticles, MySqlPool};

use crate::config::{ARTICLE_LIST_LIMIT, STORE_OP_TIMEOUT};
use crate::error::{StoreError, TandemError};
use crate::service::backoff::{Probe, bounded};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Raw article storage. Implementations do I/O only; deadlines, logging and
/// outcome mapping live in [`ArticleClient`].
#[async_trait]
pub trait ArticleBackend: Probe {
    /// Published articles, newest first, at most `limit`. Rows that fail to
    /// decode are dropped rather than failing the whole listing.
    async fn list_published(&self, limit: u32) -> Result<Vec<Article>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, StoreError>;

    fn pool_stats(&self) -> RelationalPoolStats;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationalPoolStats {
    pub max_open: u32,
    pub open: u32,
    pub in_use: u32,
    pub idle: u32,
}

/// Shared handle to the relational store.
#[derive(Clone)]
pub struct ArticleClient {
    backend: Arc<dyn ArticleBackend>,
    op_timeout: Duration,
}

impl ArticleClient {
    pub fn new(backend: Arc<dyn ArticleBackend>) -> Self {
        Self {
            backend,
            op_timeout: STORE_OP_TIMEOUT,
        }
    }

    pub async fn list_published(&self) -> Result<Vec<Article>, TandemError> {
        let start = Instant::now();
        let result = bounded(
            "articles.list_published",
            self.op_timeout,
            self.backend.list_published(ARTICLE_LIST_LIMIT),
        )
        .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(mut articles) => {
                articles.truncate(ARTICLE_LIST_LIMIT as usize);
                info!(count = articles.len(), elapsed_ms, "fetched published articles");
                Ok(articles)
            }
            Err(e) => {
                error!(error = %e, elapsed_ms, "failed to query articles");
                Err(TandemError::internal("Database query failed", e))
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Article, TandemError> {
        let start = Instant::now();
        let result = bounded(
            "articles.get_by_id",
            self.op_timeout,
            self.backend.find_by_id(id),
        )
        .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Some(article)) => {
                debug!(id, elapsed_ms, "fetched article");
                Ok(article)
            }
            Ok(None) => {
                debug!(id, elapsed_ms, "article not found");
                Err(TandemError::NotFound("Article not found"))
            }
            Err(e) => {
                error!(id, error = %e, elapsed_ms, "failed to query article");
                Err(TandemError::internal("Database query failed", e))
            }
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.ping().await
    }

    pub fn stats(&self) -> RelationalPoolStats {
        self.backend.pool_stats()
    }

    pub async fn close(&self) {
        self.backend.close().await;
    }
}
