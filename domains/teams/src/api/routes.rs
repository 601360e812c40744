//! Route definitions for Teams domain API

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use super::handlers::{join_requests, teams};
use super::middleware::TeamsState;

/// Create team management routes
fn team_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/teams", post(teams::create_team))
        .route(
            "/v1/teams/name-availability",
            get(teams::check_name_availability),
        )
        .route("/v1/teams/mine", get(teams::my_team))
        .route("/v1/teams/join", post(teams::join_by_code))
        .route("/v1/teams/{id}", get(teams::get_team))
        .route("/v1/teams/{id}/leave", post(teams::leave_team))
        .route(
            "/v1/teams/{id}/members/{user_id}",
            delete(teams::remove_member),
        )
        .route("/v1/teams/{id}/submission", patch(teams::update_submission))
}

/// Create join request routes
fn join_request_routes() -> Router<TeamsState> {
    Router::new()
        .route(
            "/v1/teams/{id}/join-requests",
            get(join_requests::list_team_join_requests).post(join_requests::create_join_request),
        )
        .route("/v1/join-requests/mine", get(join_requests::my_join_requests))
        .route(
            "/v1/join-requests/{id}/approve",
            post(join_requests::approve_join_request),
        )
        .route(
            "/v1/join-requests/{id}/reject",
            post(join_requests::reject_join_request),
        )
}

/// Create organizer routes
fn admin_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/admin/teams", get(teams::list_teams))
        .route(
            "/v1/admin/teams/{id}/shortlist",
            put(teams::set_shortlisted),
        )
}

/// Create all Teams domain API routes
pub fn routes() -> Router<TeamsState> {
    Router::new()
        .merge(team_routes())
        .merge(join_request_routes())
        .merge(admin_routes())
}
