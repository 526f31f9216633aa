use crate::config::Settings;
use crate::services::{AskEngine, DatabaseRegistry, TokenService, UserService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub user_service: Arc<UserService>,
    pub token_service: Arc<TokenService>,
    pub registry: Arc<DatabaseRegistry>,
    pub ask_engine: Arc<dyn AskEngine>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        user_service: Arc<UserService>,
        token_service: Arc<TokenService>,
        registry: Arc<DatabaseRegistry>,
        ask_engine: Arc<dyn AskEngine>,
    ) -> Self {
        Self {
            settings,
            user_service,
            token_service,
            registry,
            ask_engine,
        }
    }
}
