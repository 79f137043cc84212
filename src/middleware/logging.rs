use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{info, warn};

/// Logs one line per request when dropped, so a request that unwinds out of
/// the handler is still recorded with its duration.
struct RequestLog {
    method: Method,
    path: String,
    start: Instant,
    status: Option<StatusCode>,
}

impl RequestLog {
    fn start(method: Method, path: String) -> Self {
        info!(%method, %path, "request");
        Self {
            method,
            path,
            start: Instant::now(),
            status: None,
        }
    }
}

impl Drop for RequestLog {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        match self.status {
            Some(status) => info!(
                method = %self.method,
                path = %self.path,
                status = status.as_u16(),
                elapsed_ms,
                "response"
            ),
            None => warn!(
                method = %self.method,
                path = %self.path,
                elapsed_ms,
                "request aborted before a response was produced"
            ),
        }
    }
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let mut log = RequestLog::start(req.method().clone(), req.uri().path().to_string());
    let resp = next.run(req).await;
    log.status = Some(resp.status());
    resp
}
