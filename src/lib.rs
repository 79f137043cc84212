pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use error::{StoreError, TandemError};
pub use router::{TandemState, tandem_router};
