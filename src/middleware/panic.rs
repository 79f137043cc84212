use axum::response::{IntoResponse, Response};
use std::any::Any;
use tracing::error;

use crate::error::TandemError;
use crate::middleware::security;

/// Convert a panic caught at the pipeline boundary into a generic 500.
/// The unwind skipped the header layer, so the security headers are set here.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "recovered from panic while handling request");
    let mut resp = TandemError::UnexpectedFault(detail).into_response();
    security::stamp(resp.headers_mut());
    resp
}
