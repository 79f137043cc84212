use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error as ThisError;

/// Failures raised by the store layer (drivers, deadlines, endpoints).
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("Invalid endpoint url: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        match self {
            StoreError::Timeout { .. } => true,
            StoreError::Cache(e) => e.is_timeout(),
            StoreError::Database(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

#[derive(Debug, ThisError)]
pub enum TandemError {
    #[error("failed to connect to {store} after {attempts} attempts: {source}")]
    ConnectionEstablishment {
        store: &'static str,
        attempts: usize,
        #[source]
        source: StoreError,
    },

    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{message}: {source}")]
    Internal {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Unexpected fault: {0}")]
    UnexpectedFault(String),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TandemError {
    pub fn internal(message: &'static str, source: StoreError) -> Self {
        TandemError::Internal { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            TandemError::Validation(_) => StatusCode::BAD_REQUEST,
            TandemError::NotFound(_) => StatusCode::NOT_FOUND,
            TandemError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            TandemError::ConnectionEstablishment { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TandemError::Internal { .. }
            | TandemError::UnexpectedFault(_)
            | TandemError::Config(_)
            | TandemError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to a client. Driver details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            TandemError::Validation(msg) | TandemError::NotFound(msg) => *msg,
            TandemError::MethodNotAllowed => "Method not allowed",
            TandemError::Internal { message, .. } => *message,
            TandemError::ConnectionEstablishment { .. } => "Service unavailable",
            TandemError::UnexpectedFault(_) | TandemError::Config(_) | TandemError::Io(_) => {
                "Internal server error"
            }
        }
    }
}

impl From<figment::Error> for TandemError {
    fn from(e: figment::Error) -> Self {
        TandemError::Config(Box::new(e))
    }
}

impl IntoResponse for TandemError {
    fn into_response(self) -> axum::response::Response {
        let body = ApiErrorResponse {
            error: self.public_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
