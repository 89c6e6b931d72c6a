use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::database::ItemStore;
use crate::media::MediaStore;

/// Shared, read-only dependencies handed to every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ItemStore>,
    pub media: Arc<dyn MediaStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ItemStore>, media: Arc<dyn MediaStore>) -> Self {
        let verifier = TokenVerifier::new(&config.security.jwt_secret);
        Self {
            config: Arc::new(config),
            store,
            media,
            verifier: Arc::new(verifier),
        }
    }
}
