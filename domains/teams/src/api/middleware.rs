//! Teams domain state and identity integration

use std::sync::Arc;

use axum::extract::FromRef;
use hackhub_auth::AuthConfig;

use crate::service::{JoinRequestCoordinator, TeamRegistry};

/// Application state for the Teams domain
#[derive(Clone)]
pub struct TeamsState {
    pub registry: Arc<TeamRegistry>,
    pub join_requests: Arc<JoinRequestCoordinator>,
    pub auth: AuthConfig,
}

impl TeamsState {
    pub fn new(registry: Arc<TeamRegistry>, auth: AuthConfig) -> Self {
        let join_requests = Arc::new(JoinRequestCoordinator::new(registry.clone()));
        Self {
            registry,
            join_requests,
            auth,
        }
    }
}

impl FromRef<TeamsState> for AuthConfig {
    fn from_ref(state: &TeamsState) -> Self {
        state.auth.clone()
    }
}
