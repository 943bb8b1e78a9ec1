//! Configuration types for the SocialService.
use social_shared::types::PageRequest;

use crate::errors::SocialError;

/// Configuration for the SocialService.
///
/// Controls pagination: the page size used when a caller does not pass one,
/// and the upper bound any requested page size is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl ServiceConfig {
    /// Create a config with custom pagination limits.
    ///
    /// # Arguments
    ///
    /// * `default_page_size` - Page size applied when the caller passes none
    /// * `max_page_size` - Upper bound for any requested page size
    ///
    /// # Returns
    ///
    /// A `ServiceConfig`; `default_page_size` never exceeds `max_page_size`.
    pub fn with_page_sizes(default_page_size: u32, max_page_size: u32) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    /// Resolves optional pagination parameters into a [`PageRequest`].
    ///
    /// `page` is 1-based and defaults to 1. `page_size` defaults to
    /// `default_page_size` and is clamped to `max_page_size`. Zero for either
    /// is rejected.
    pub fn page_request(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<PageRequest, SocialError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(SocialError::validation("page must be a positive integer"));
        }

        let page_size = page_size.unwrap_or(self.default_page_size);
        if page_size == 0 {
            return Err(SocialError::validation(
                "page_size must be a positive integer",
            ));
        }

        Ok(PageRequest::new(page, page_size.min(self.max_page_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_missing() {
        let config = ServiceConfig::default();
        assert_eq!(
            config.page_request(None, None).unwrap(),
            PageRequest::new(1, 10)
        );
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = ServiceConfig::with_page_sizes(5, 20);
        assert_eq!(
            config.page_request(Some(3), Some(500)).unwrap(),
            PageRequest::new(3, 20)
        );
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let config = ServiceConfig::default();
        assert!(matches!(
            config.page_request(Some(0), None),
            Err(SocialError::Validation(_))
        ));
        assert!(matches!(
            config.page_request(None, Some(0)),
            Err(SocialError::Validation(_))
        ));
    }

    #[test]
    fn test_default_never_exceeds_max() {
        let config = ServiceConfig::with_page_sizes(50, 20);
        assert_eq!(config.default_page_size, 20);
    }
}
