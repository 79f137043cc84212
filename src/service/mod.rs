pub mod backoff;
pub mod health;
pub mod lifecycle;
pub mod stats;
