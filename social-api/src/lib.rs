//! HTTP API for the social backend.
//!
//! Exposes the follow graph, feed, posts, likes, comments and notifications
//! over axum, backed by either PostgreSQL or the in-memory store.
pub mod config;
pub mod errors;
pub mod server;

pub use config::{ApiConfig, Dependencies, LogFormat, StorageBackend};
pub use errors::{ApiError, ConfigError, StartupError};
pub use server::{create_app, run_server, state::AppState};
