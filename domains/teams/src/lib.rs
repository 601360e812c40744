//! Teams domain: team formation, invite codes, join requests

pub mod api;
pub mod domain;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::invite_code::{CodeLookup, InviteCodeGenerator, INVITE_CODE_ALPHABET};
pub use domain::rules::{JoinOverflowPolicy, TeamRules};
pub use domain::validation::{is_valid_invite_code, name_key, normalize_invite_code};
// Re-export repository types
pub use repository::{
    claim_team_tx, set_team_reference_tx, write_team_tx, JoinRequestRepository,
    ParticipantRepository, TeamRepository, TeamsRepositories,
};
pub use service::{JoinRequestCoordinator, TeamRegistry};

// Re-export API types
pub use api::routes;
pub use api::TeamsState;
