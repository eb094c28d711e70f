use std::sync::Arc;

use crate::auth::TokenKeys;
use crate::database::{HealthProbe, UserStore};
use crate::middleware::TokenGate;

/// Shared handles for request handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<TokenKeys>,
    pub users: Arc<dyn UserStore>,
    pub database: Arc<dyn HealthProbe>,
    pub token_gate: Arc<TokenGate>,
}

impl AppState {
    pub fn new(
        keys: Arc<TokenKeys>,
        users: Arc<dyn UserStore>,
        database: Arc<dyn HealthProbe>,
    ) -> Self {
        let token_gate = Arc::new(TokenGate::new(keys.clone(), users.clone()));
        Self {
            keys,
            users,
            database,
            token_gate,
        }
    }
}
