//! Repository implementations for Teams domain

pub mod join_requests;
pub mod participants;
pub mod teams;
pub mod transactions;

use std::sync::Arc;

use hackhub_store::{DocumentStore, ReadRetryPolicy};

pub use join_requests::JoinRequestRepository;
pub use participants::ParticipantRepository;
pub use teams::{TeamClaim, TeamRepository};
pub use transactions::{
    claim_team_tx, create_join_request_tx, delete_join_request_tx, discard_join_requests_tx,
    set_team_reference_tx, write_team_tx,
};

/// Collection names owned by the teams domain
pub mod collections {
    pub const TEAMS: &str = "teams";
    /// Per-user team reference documents, keyed by user id
    pub const USERS: &str = "users";
    pub const JOIN_REQUESTS: &str = "join_requests";
    /// Name claims keyed by the lowercased team name
    pub const TEAM_NAMES: &str = "team_names";
    /// Invite code claims keyed by code
    pub const INVITE_CODES: &str = "invite_codes";
}

/// Combined repository access for the Teams domain
#[derive(Clone)]
pub struct TeamsRepositories {
    store: Arc<dyn DocumentStore>,
    pub teams: TeamRepository,
    pub participants: ParticipantRepository,
    pub join_requests: JoinRequestRepository,
}

impl TeamsRepositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_retry(store, ReadRetryPolicy::default())
    }

    pub fn with_retry(store: Arc<dyn DocumentStore>, retry: ReadRetryPolicy) -> Self {
        Self {
            teams: TeamRepository::new(store.clone(), retry),
            participants: ParticipantRepository::new(store.clone(), retry),
            join_requests: JoinRequestRepository::new(store.clone(), retry),
            store,
        }
    }

    /// Shared store handle, for committing transactions
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}
