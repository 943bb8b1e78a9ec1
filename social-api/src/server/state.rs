// App state for the Axum server
use social_service::SocialService;

#[derive(Clone)]
pub struct AppState {
    pub service: SocialService,
}

impl AppState {
    pub fn new(service: SocialService) -> Self {
        Self { service }
    }
}
