//! Pitches domain state

use std::sync::Arc;

use axum::extract::FromRef;
use hackhub_auth::AuthConfig;

use crate::service::SlotAllocator;

#[derive(Clone)]
pub struct PitchesState {
    pub allocator: Arc<SlotAllocator>,
    pub auth: AuthConfig,
}

impl FromRef<PitchesState> for AuthConfig {
    fn from_ref(state: &PitchesState) -> Self {
        state.auth.clone()
    }
}
