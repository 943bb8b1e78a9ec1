//! # Social Repository
//! This crate provides the storage traits for the social backend together with
//! two implementations: PostgreSQL (via `sqlx`) for production and an
//! in-memory store used by tests and local development.
//!
//! Uniqueness of follow edges and likes is enforced by the store itself, so two
//! concurrent requests for the same pair can never both insert a row.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::RepositoryError;
pub use interfaces::{
    ContentRepository, FollowRepository, NotificationRepository, SocialRepository, UserRepository,
};
pub use memory::InMemorySocialRepository;
pub use postgres::PostgresSocialRepository;
