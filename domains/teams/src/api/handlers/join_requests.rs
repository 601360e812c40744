//! Join request API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use hackhub_auth::CurrentActor;
use hackhub_common::{Pagination, Result};
use serde::Serialize;
use uuid::Uuid;

use super::teams::TeamResponse;
use crate::api::middleware::TeamsState;
use crate::domain::entities::JoinRequest;

#[derive(Debug, Serialize)]
pub struct JoinRequestResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<JoinRequest> for JoinRequestResponse {
    fn from(r: JoinRequest) -> Self {
        Self {
            id: r.id,
            team_id: r.team_id,
            user_id: r.user_id,
            user_name: r.user_name,
            user_email: r.user_email,
            created_at: r.created_at,
        }
    }
}

/// Ask to join a team
///
/// **POST /v1/teams/{id}/join-requests**
pub async fn create_join_request(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<(StatusCode, Json<JoinRequestResponse>)> {
    let request = state.join_requests.request_join(&actor, team_id).await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

/// Pending requests for a team, oldest first (leader only)
///
/// **GET /v1/teams/{id}/join-requests**
pub async fn list_team_join_requests(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<JoinRequestResponse>>> {
    let requests = state
        .join_requests
        .pending_for_team(&actor, team_id)
        .await?;

    Ok(Json(
        pagination
            .apply(requests)
            .into_iter()
            .map(JoinRequestResponse::from)
            .collect(),
    ))
}

/// **GET /v1/join-requests/mine**
pub async fn my_join_requests(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
) -> Result<Json<Vec<JoinRequestResponse>>> {
    let requests = state.join_requests.requests_for_user(actor.id).await?;
    Ok(Json(requests.into_iter().map(JoinRequestResponse::from).collect()))
}

/// Approve a request; answers with the updated team
///
/// **POST /v1/join-requests/{id}/approve**
pub async fn approve_join_request(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<TeamResponse>> {
    let team = state.join_requests.approve(&actor, request_id).await?;
    Ok(Json(TeamResponse::for_viewer(team, &actor)))
}

/// **POST /v1/join-requests/{id}/reject**
pub async fn reject_join_request(
    CurrentActor(actor): CurrentActor,
    State(state): State<TeamsState>,
    Path(request_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.join_requests.reject(&actor, request_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
