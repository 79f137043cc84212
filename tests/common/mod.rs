#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tandem::StoreError;
use tandem::cache::{CacheBackend, CacheClient};
use tandem::db::{Article, ArticleBackend, ArticleClient, RelationalPoolStats};
use tandem::router::{TandemState, tandem_router};
use tandem::service::backoff::Probe;
use tokio::sync::Notify;
use tower::ServiceExt;

fn refused() -> StoreError {
    StoreError::Cache(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

/// In-memory article table with switchable failure modes.
#[derive(Default)]
pub struct MemoryArticles {
    pub rows: Vec<Article>,
    pub down: bool,
    pub delay: Option<Duration>,
    pub panic_on_list: bool,
    pub started: Option<Arc<Notify>>,
    pub closed: AtomicBool,
    pub stats_reads: AtomicUsize,
}

impl MemoryArticles {
    pub fn seeded() -> Self {
        Self {
            rows: sample_articles(),
            ..Self::default()
        }
    }

    async fn enter(&self) -> Result<(), StoreError> {
        if let Some(started) = &self.started {
            started.notify_one();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.down {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for MemoryArticles {
    async fn ping(&self) -> Result<(), StoreError> {
        self.enter().await
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArticleBackend for MemoryArticles {
    async fn list_published(&self, limit: u32) -> Result<Vec<Article>, StoreError> {
        self.enter().await?;
        if self.panic_on_list {
            panic!("article backend exploded");
        }
        let mut published: Vec<Article> =
            self.rows.iter().filter(|a| a.is_published).cloned().collect();
        published.sort_by(|a, b| b.created.cmp(&a.created));
        published.truncate(limit as usize);
        Ok(published)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, StoreError> {
        self.enter().await?;
        Ok(self.rows.iter().find(|a| a.id == id).cloned())
    }

    fn pool_stats(&self) -> RelationalPoolStats {
        self.stats_reads.fetch_add(1, Ordering::SeqCst);
        RelationalPoolStats {
            max_open: 25,
            open: 3,
            in_use: 1,
            idle: 2,
        }
    }
}

/// In-memory key-value store recording the ttl of each write.
#[derive(Default)]
pub struct MemoryCache {
    pub entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
    pub down: bool,
    pub delay: Option<Duration>,
    pub writes: AtomicUsize,
    pub closed: AtomicBool,
}

impl MemoryCache {
    async fn enter(&self) -> Result<(), StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.down {
            return Err(refused());
        }
        Ok(())
    }

    pub fn ttl_of(&self, key: &str) -> Option<Option<Duration>> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl Probe for MemoryCache {
    async fn ping(&self) -> Result<(), StoreError> {
        self.enter().await
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.enter().await?;
        Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.enter().await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }
}

pub fn sample_articles() -> Vec<Article> {
    let at = |day| Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap();
    vec![
        Article {
            id: "a-old".into(),
            user_id: Some("u1".into()),
            title: "Older post".into(),
            slug: "older-post".into(),
            body: Some("<p>old</p>".into()),
            markdown: Some("old".into()),
            is_published: true,
            created: Some(at(1)),
            modified: Some(at(2)),
        },
        Article {
            id: "a-new".into(),
            user_id: None,
            title: "Newer post".into(),
            slug: "newer-post".into(),
            body: None,
            markdown: None,
            is_published: true,
            created: Some(at(10)),
            modified: None,
        },
        Article {
            id: "a-draft".into(),
            user_id: Some("u2".into()),
            title: "Draft".into(),
            slug: "draft".into(),
            body: Some("wip".into()),
            markdown: None,
            is_published: false,
            created: Some(at(20)),
            modified: None,
        },
    ]
}

pub struct Harness {
    pub app: Router,
    pub articles: Arc<MemoryArticles>,
    pub cache: Arc<MemoryCache>,
    pub state: TandemState,
}

pub fn harness(articles: MemoryArticles, cache: MemoryCache) -> Harness {
    let articles = Arc::new(articles);
    let cache = Arc::new(cache);
    let state = TandemState::new(
        ArticleClient::new(articles.clone()),
        CacheClient::new(cache.clone()),
    );
    Harness {
        app: tandem_router(state.clone()),
        articles,
        cache,
        state,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Reply {
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        json,
    }
}
