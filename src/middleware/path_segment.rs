use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::error::TandemError;

/// Names the resource a path segment identifies and the rejection used when
/// it is missing.
pub trait SegmentKind: Send + Sync {
    const INVALID: &'static str;
}

pub struct ArticleId;

impl SegmentKind for ArticleId {
    const INVALID: &'static str = "Invalid article ID";
}

pub struct CacheKey;

impl SegmentKind for CacheKey {
    const INVALID: &'static str = "Invalid cache key";
}

/// First path segment after the route prefix (`/cache/{*rest}` -> `rest`'s
/// head). Missing or empty segments reject with a 400.
pub struct Segment<K>(pub String, PhantomData<K>);

impl<K> Segment<K> {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<S, K> FromRequestParts<S> for Segment<K>
where
    S: Send + Sync,
    K: SegmentKind,
{
    type Rejection = TandemError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(rest) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| TandemError::Validation(K::INVALID))?;
        match first_segment(&rest) {
            Some(seg) => Ok(Segment(seg.to_string(), PhantomData)),
            None => Err(TandemError::Validation(K::INVALID)),
        }
    }
}

fn first_segment(rest: &str) -> Option<&str> {
    rest.trim_start_matches('/')
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
}
