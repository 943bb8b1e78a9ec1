//! Error types for the social API.
mod api_error;
mod config_error;

pub use api_error::ApiError;
pub use config_error::{ConfigError, StartupError};
