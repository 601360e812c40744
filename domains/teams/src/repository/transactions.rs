//! Transaction builders for the Teams domain
//!
//! Each helper appends the preconditions and writes for one part of a
//! multi-document change. Services compose them into a single
//! `Transaction` and commit once.

use chrono::{DateTime, Utc};
use hackhub_common::Result;
use hackhub_store::{Precondition, Transaction};
use uuid::Uuid;

use super::collections::{INVITE_CODES, JOIN_REQUESTS, TEAMS, TEAM_NAMES, USERS};
use super::teams::TeamClaim;
use crate::domain::entities::{JoinRequest, Participant, Team};

/// Create a team together with its name and invite code claims.
///
/// Conflicts if the name key or the code is already claimed.
pub fn claim_team_tx(tx: &mut Transaction, team: &Team) -> Result<()> {
    let team_id = team.id.to_string();
    let claim = serde_json::to_value(TeamClaim { team_id: team.id })?;
    let name_key = team.name_key();

    tx.expect(TEAM_NAMES, &name_key, Precondition::Missing)
        .expect(INVITE_CODES, &team.invite_code, Precondition::Missing)
        .create(TEAMS, &team_id, serde_json::to_value(team)?)
        .create(TEAM_NAMES, &name_key, claim.clone())
        .create(INVITE_CODES, &team.invite_code, claim);
    Ok(())
}

/// Overwrite a team, provided nobody changed it since `read_version`
pub fn write_team_tx(tx: &mut Transaction, team: &Team, read_version: u64) -> Result<()> {
    let team_id = team.id.to_string();
    tx.expect(TEAMS, &team_id, Precondition::Version(read_version))
        .set(TEAMS, &team_id, serde_json::to_value(team)?);
    Ok(())
}

/// Point a user's team reference at `team_id` (or clear it).
///
/// `read_version` is the version the caller observed, `None` if the user
/// had no reference document.
pub fn set_team_reference_tx(
    tx: &mut Transaction,
    user_id: Uuid,
    team_id: Option<Uuid>,
    read_version: Option<u64>,
    now: DateTime<Utc>,
) -> Result<()> {
    let id = user_id.to_string();
    let participant = Participant::new(user_id, team_id, now);
    tx.expect(USERS, &id, Precondition::from_read(read_version))
        .set(USERS, &id, serde_json::to_value(participant)?);
    Ok(())
}

/// Create a join request; conflicts if one is already pending for the pair
pub fn create_join_request_tx(tx: &mut Transaction, request: &JoinRequest) -> Result<()> {
    let id = request.id.to_string();
    tx.expect(JOIN_REQUESTS, &id, Precondition::Missing)
        .create(JOIN_REQUESTS, &id, serde_json::to_value(request)?);
    Ok(())
}

/// Delete a join request that must still be pending at commit time
pub fn delete_join_request_tx(tx: &mut Transaction, request_id: Uuid) {
    let id = request_id.to_string();
    tx.expect(JOIN_REQUESTS, &id, Precondition::Exists)
        .delete(JOIN_REQUESTS, &id);
}

/// Delete requests that became moot, skipping `keep`
pub fn discard_join_requests_tx(
    tx: &mut Transaction,
    requests: &[JoinRequest],
    keep: Option<Uuid>,
) -> usize {
    let mut discarded = 0;
    for request in requests.iter().filter(|r| Some(r.id) != keep) {
        tx.delete(JOIN_REQUESTS, &request.id.to_string());
        discarded += 1;
    }
    discarded
}
