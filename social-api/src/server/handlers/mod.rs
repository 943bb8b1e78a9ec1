//! HTTP request handlers, grouped by resource.
pub mod auth;
pub mod comments;
pub mod graph;
pub mod health;
pub mod notifications;
pub mod posts;
pub mod users;

use serde::Deserialize;
use social_shared::types::PageRequest;

use crate::errors::ApiError;
use crate::server::state::AppState;

/// `?page=&page_size=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn resolve(&self, state: &AppState) -> Result<PageRequest, ApiError> {
        Ok(state.service.page_request(self.page, self.page_size)?)
    }
}
