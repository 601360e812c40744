//! Team management API handlers
//!
//! Thin adapters over `TeamRegistry`: extract the caller, validate the
//! payload, delegate, and shape the response.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use hackhub_auth::{AdminActor, CurrentActor};
use hackhub_common::{Actor, Error, Pagination, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::domain::entities::{SubmissionStatus, Team, TeamMember};

/// Request for creating a new team
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 3, max = 50))]
    pub name: String,

    /// Free-form project details (idea, track, repository link)
    #[serde(default)]
    pub metadata: HashMap<String, Value>,

    /// The leader's own position on the team
    #[validate(length(max = 50))]
    pub position: Option<String>,
}

/// Request for joining a team with its invite code
#[derive(Debug, Deserialize, Validate)]
pub struct JoinByCodeRequest {
    #[validate(length(min = 1, max = 16))]
    pub code: String,

    #[validate(length(max = 50))]
    pub position: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubmissionRequest {
    pub status: SubmissionStatus,
}

#[derive(Debug, Deserialize)]
pub struct ShortlistRequest {
    pub shortlisted: bool,
}

#[derive(Debug, Deserialize)]
pub struct NameAvailabilityParams {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct NameAvailabilityResponse {
    pub name: String,
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListTeamsParams {
    pub shortlisted: Option<bool>,
}

/// Team response for API operations
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    /// Only shown to members and administrators
    pub invite_code: Option<String>,
    pub leader_id: Uuid,
    pub members: Vec<TeamMember>,
    pub size: usize,
    pub shortlisted: bool,
    pub submission_status: SubmissionStatus,
    pub pitch_slot_id: Option<Uuid>,
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamResponse {
    /// Shape a team for `viewer`, hiding the invite code from outsiders
    pub fn for_viewer(team: Team, viewer: &Actor) -> Self {
        let invite_code =
            (viewer.is_admin || team.is_member(viewer.id)).then(|| team.invite_code.clone());
        Self {
            id: team.id,
            size: team.size(),
            name: team.name,
            invite_code,
            leader_id: team.leader_id,
            members: team.members,
            shortlisted: team.shortlisted,
            submission_status: team.submission_status,
            pitch_slot_id: team.pitch_slot_id,
            metadata: team.metadata,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

/// Create a new team
///
/// **POST /v1/teams**
///
/// The caller becomes leader and sole member. Fails with `NAME_TAKEN` or
/// `ALREADY_IN_TEAM`.
pub async fn create_team(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>)> {
    let team = state
        .registry
        .create_team(&actor, &request.name, request.metadata, request.position)
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::for_viewer(team, &actor))))
}

/// Live team-name availability probe
///
/// **GET /v1/teams/name-availability?name=**
pub async fn check_name_availability(
    CurrentActor(_actor): CurrentActor,
    State(state): State<TeamsState>,
    Query(params): Query<NameAvailabilityParams>,
) -> Result<Json<NameAvailabilityResponse>> {
    let available = state.registry.check_name_available(&params.name).await?;
    Ok(Json(NameAvailabilityResponse {
        name: params.name.trim().to_string(),
        available,
    }))
}

/// The caller's current team
///
/// **GET /v1/teams/mine**
pub async fn my_team(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
) -> Result<Json<TeamResponse>> {
    let team = state
        .registry
        .team_for_user(actor.id)
        .await?
        .ok_or_else(|| Error::NotFound("You are not in a team".to_string()))?;

    Ok(Json(TeamResponse::for_viewer(team, &actor)))
}

/// **GET /v1/teams/{id}**
pub async fn get_team(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamResponse>> {
    let team = state.registry.get_team(team_id).await?;
    Ok(Json(TeamResponse::for_viewer(team, &actor)))
}

/// Join a team directly with its invite code
///
/// **POST /v1/teams/join**
pub async fn join_by_code(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<JoinByCodeRequest>,
) -> Result<Json<TeamResponse>> {
    let team = state
        .registry
        .join_by_code(&actor, &request.code, request.position)
        .await?;

    Ok(Json(TeamResponse::for_viewer(team, &actor)))
}

/// **POST /v1/teams/{id}/leave**
pub async fn leave_team(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.registry.leave_team(&actor, team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Leader removes a member
///
/// **DELETE /v1/teams/{id}/members/{user_id}**
pub async fn remove_member(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    Path((team_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TeamResponse>> {
    let team = state
        .registry
        .remove_member(&actor, team_id, member_id)
        .await?;
    Ok(Json(TeamResponse::for_viewer(team, &actor)))
}

/// **PATCH /v1/teams/{id}/submission**
pub async fn update_submission(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    Json(request): Json<UpdateSubmissionRequest>,
) -> Result<Json<TeamResponse>> {
    let team = state
        .registry
        .set_submission_status(&actor, team_id, request.status)
        .await?;
    Ok(Json(TeamResponse::for_viewer(team, &actor)))
}

/// Organizer listing, ordered by name
///
/// **GET /v1/admin/teams?shortlisted=&offset=&limit=**
pub async fn list_teams(
    AdminActor(actor): AdminActor,
    State(state): State<TeamsState>,
    Query(params): Query<ListTeamsParams>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<TeamResponse>>> {
    let teams = state.registry.list_teams(&actor, params.shortlisted).await?;

    let responses = pagination
        .apply(teams)
        .into_iter()
        .map(|team| TeamResponse::for_viewer(team, &actor))
        .collect();
    Ok(Json(responses))
}

/// **PUT /v1/admin/teams/{id}/shortlist**
pub async fn set_shortlisted(
    AdminActor(actor): AdminActor,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    Json(request): Json<ShortlistRequest>,
) -> Result<Json<TeamResponse>> {
    let team = state
        .registry
        .set_shortlisted(&actor, team_id, request.shortlisted)
        .await?;
    Ok(Json(TeamResponse::for_viewer(team, &actor)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_team_request_validation() {
        let valid = CreateTeamRequest {
            name: "Nebula".to_string(),
            metadata: HashMap::new(),
            position: Some("backend".to_string()),
        };
        assert!(valid.validate().is_ok());

        let short = CreateTeamRequest {
            name: "AB".to_string(),
            metadata: HashMap::new(),
            position: None,
        };
        assert!(short.validate().is_err());

        let long = CreateTeamRequest {
            name: "N".repeat(51),
            metadata: HashMap::new(),
            position: None,
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_join_by_code_request_validation() {
        let valid = JoinByCodeRequest {
            code: "ab3k9z".to_string(),
            position: None,
        };
        assert!(valid.validate().is_ok());

        let empty = JoinByCodeRequest {
            code: String::new(),
            position: None,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_invite_code_hidden_from_outsiders() {
        let leader = Actor::new(Uuid::new_v4(), "Alice", "alice@example.com");
        let team = Team::new(
            "Nebula",
            "AB3K9Z".to_string(),
            leader.id,
            None,
            HashMap::new(),
            Utc::now(),
        )
        .unwrap();

        let outsider = Actor::new(Uuid::new_v4(), "Eve", "eve@example.com");
        let admin = Actor::new(Uuid::new_v4(), "Root", "root@example.com").admin();

        assert_eq!(
            TeamResponse::for_viewer(team.clone(), &leader).invite_code.as_deref(),
            Some("AB3K9Z")
        );
        assert!(TeamResponse::for_viewer(team.clone(), &outsider).invite_code.is_none());
        assert!(TeamResponse::for_viewer(team, &admin).invite_code.is_some());
    }

    #[test]
    fn test_team_response_serialization() {
        let leader = Actor::new(Uuid::new_v4(), "Alice", "alice@example.com");
        let team = Team::new(
            "Nebula",
            "AB3K9Z".to_string(),
            leader.id,
            None,
            HashMap::new(),
            Utc::now(),
        )
        .unwrap();

        let json = serde_json::to_value(TeamResponse::for_viewer(team, &leader)).unwrap();
        assert_eq!(json["size"], 1);
        assert_eq!(json["submission_status"], "draft");
        assert_eq!(json["members"][0]["user_id"], leader.id.to_string());
    }
}
