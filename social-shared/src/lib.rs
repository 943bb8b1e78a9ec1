//! # Social Shared
//! This crate defines the data structures shared across the social backend:
//! users, follow edges, posts, comments, likes, notifications and the
//! pagination envelopes used by every listing operation.
pub mod types;
