use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};

use crate::middleware::path_segment::{CacheKey, Segment};
use crate::{TandemError, router::TandemState};

/// Body of a cache write. Missing or null fields read as empty, and a missing
/// ttl means no expiration.
#[derive(Debug, Default, Deserialize)]
pub struct CacheRequest {
    pub key: Option<String>,
    pub value: Option<String>,
    /// Seconds; 0 keeps the entry until evicted.
    pub ttl: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CacheEntryResponse {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct CacheSetResponse {
    pub status: &'static str,
    pub message: String,
}

/// GET /cache/{key}
pub async fn cache_get(
    State(state): State<TandemState>,
    key: Segment<CacheKey>,
) -> Result<Json<CacheEntryResponse>, TandemError> {
    let key = key.into_inner();
    let value = state.cache.get(&key).await?;
    Ok(Json(CacheEntryResponse { key, value }))
}

/// POST /cache and POST /cache/{key}; the key always comes from the body.
pub async fn cache_set(
    State(state): State<TandemState>,
    body: Bytes,
) -> Result<Json<CacheSetResponse>, TandemError> {
    let req: CacheRequest = serde_json::from_slice(&body)
        .map_err(|_| TandemError::Validation("Invalid JSON payload"))?;

    let key = req.key.unwrap_or_default();
    let value = req.value.unwrap_or_default();
    state.cache.set(&key, &value, req.ttl.unwrap_or(0)).await?;

    Ok(Json(CacheSetResponse {
        status: "success",
        message: format!("Key '{key}' set successfully"),
    }))
}
