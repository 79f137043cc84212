use axum::{
    Router,
    routing::{get, post},
};

use crate::cache::CacheClient;
use crate::db::ArticleClient;
use crate::handlers::{self, articles, cache, health};
use crate::middleware::apply_pipeline;

/// Per-process dependencies shared by every request.
#[derive(Clone)]
pub struct TandemState {
    pub articles: ArticleClient,
    pub cache: CacheClient,
}

impl TandemState {
    pub fn new(articles: ArticleClient, cache: CacheClient) -> Self {
        Self { articles, cache }
    }
}

pub fn tandem_router(state: TandemState) -> Router {
    let cache_item = get(cache::cache_get)
        .post(cache::cache_set)
        .fallback(handlers::method_not_allowed);

    let routes = Router::new()
        .route(
            "/health",
            get(health::health_handler).fallback(handlers::method_not_allowed),
        )
        .route(
            "/articles",
            get(articles::list_articles).fallback(handlers::method_not_allowed),
        )
        .route(
            "/articles/",
            get(articles::get_article).fallback(handlers::method_not_allowed),
        )
        .route(
            "/articles/{*rest}",
            get(articles::get_article).fallback(handlers::method_not_allowed),
        )
        .route(
            "/cache",
            post(cache::cache_set).fallback(handlers::method_not_allowed),
        )
        .route("/cache/", cache_item.clone())
        .route("/cache/{*rest}", cache_item)
        .fallback(handlers::not_found)
        .with_state(state);

    apply_pipeline(routes)
}
