use axum::{Json, extract::State};

use crate::db::Article;
use crate::middleware::path_segment::{ArticleId, Segment};
use crate::{TandemError, router::TandemState};

/// GET /articles -> up to 50 published articles, newest first.
pub async fn list_articles(
    State(state): State<TandemState>,
) -> Result<Json<Vec<Article>>, TandemError> {
    let articles = state.articles.list_published().await?;
    Ok(Json(articles))
}

/// GET /articles/{id}
pub async fn get_article(
    State(state): State<TandemState>,
    id: Segment<ArticleId>,
) -> Result<Json<Article>, TandemError> {
    let article = state.articles.get_by_id(&id.into_inner()).await?;
    Ok(Json(article))
}
