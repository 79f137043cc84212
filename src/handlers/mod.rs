pub mod articles;
pub mod cache;
pub mod health;

use crate::error::TandemError;

/// Method router fallback: the path matched, the method did not.
pub async fn method_not_allowed() -> TandemError {
    TandemError::MethodNotAllowed
}

/// Router fallback for unknown paths.
pub async fn not_found() -> TandemError {
    TandemError::NotFound("Not found")
}
