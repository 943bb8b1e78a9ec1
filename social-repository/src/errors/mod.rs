//! Error types for the social repository.
mod repository;

pub use repository::RepositoryError;
