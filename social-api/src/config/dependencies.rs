//! Dependency initialization and wiring for the social API.
use std::sync::Arc;

use social_repository::{InMemorySocialRepository, PostgresSocialRepository, SocialRepository};
use social_service::SocialService;
use tracing::{info, warn};

use crate::config::{ApiConfig, StorageBackend};
use crate::errors::{ConfigError, StartupError};
use crate::server::state::AppState;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Shared state handed to the router.
    pub state: AppState,
}

impl Dependencies {
    /// Builds the storage backend, the service and the router state.
    ///
    /// # Arguments
    ///
    /// * `config` - Parsed API configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Ready-to-serve state
    /// * `Err(StartupError)` - Database unreachable or migrations failed
    pub async fn new(config: &ApiConfig) -> Result<Self, StartupError> {
        info!(
            storage = ?config.storage,
            max_connections = config.database_max_connections,
            run_migrations = config.run_migrations,
            default_page_size = config.default_page_size,
            max_page_size = config.max_page_size,
            "Initializing dependencies"
        );

        let repo: Arc<dyn SocialRepository> = match config.storage {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or(ConfigError::Missing("DATABASE_URL"))?;
                let repo =
                    PostgresSocialRepository::connect(url, config.database_max_connections)
                        .await?;
                if config.run_migrations {
                    repo.migrate().await?;
                }
                info!("Connected to PostgreSQL");
                Arc::new(repo)
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage, data will not survive a restart");
                Arc::new(InMemorySocialRepository::new())
            }
        };

        let service = SocialService::with_config(repo, config.service_config());
        Ok(Self {
            state: AppState::new(service),
        })
    }
}
