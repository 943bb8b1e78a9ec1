//! Error types produced by the social service layer.
mod social_error;

pub use social_error::{ErrorKind, SocialError};
