use axum::{Json, extract::State, response::IntoResponse};

use crate::config::HEALTH_TIMEOUT;
use crate::router::TandemState;
use crate::service::health::HealthReport;

/// GET /health -> 200 when both stores answer, 503 otherwise; both statuses
/// are always reported.
pub async fn health_handler(State(state): State<TandemState>) -> impl IntoResponse {
    let report = HealthReport::probe(&state.articles, &state.cache, HEALTH_TIMEOUT).await;
    (report.status_code(), Json(report))
}
