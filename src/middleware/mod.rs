//! Request pipeline: panic isolation -> request logging -> security headers -> routes.

pub mod logging;
pub mod panic;
pub mod path_segment;
pub mod security;

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

/// Wrap `router` in the pipeline. Layers added last run first, so the panic
/// boundary is applied last to sit outermost.
pub fn apply_pipeline(router: Router) -> Router {
    security::apply(router)
        .layer(axum::middleware::from_fn(logging::log_requests))
        .layer(CatchPanicLayer::custom(panic::handle_panic))
}
