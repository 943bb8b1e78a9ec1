//! # Social Service
//! Domain rules of the social backend layered over the storage traits of
//! `social-repository`:
//!
//! - follow graph with irreflexive, deduplicated edges
//! - reverse-chronological feed of followed authors
//! - notification fan-out, read state management and reversal on unlike,
//!   unfollow and comment deletion
//! - like / unlike / toggle-like with derived like counts
//! - posts, comments, `@username` mentions, user registration and tokens
pub mod config;
pub mod errors;
pub mod service;

mod content;
mod feed;
mod graph;
mod likes;
mod mentions;
mod notifications;
mod users;

#[cfg(test)]
mod test_support;

pub use config::ServiceConfig;
pub use errors::{ErrorKind, SocialError};
pub use service::SocialService;
