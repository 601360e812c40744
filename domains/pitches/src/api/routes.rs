//! Route definitions for Pitches domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::slots;
use super::middleware::PitchesState;

fn slot_routes() -> Router<PitchesState> {
    Router::new()
        .route("/v1/pitch-slots", get(slots::list_slots))
        .route("/v1/pitch-slots/{id}/book", post(slots::book_slot))
        .route("/v1/teams/{id}/pitch-slot", get(slots::team_slot))
}

fn admin_routes() -> Router<PitchesState> {
    Router::new()
        .route("/v1/admin/pitch-slots/seed", post(slots::seed_slots))
        .route(
            "/v1/admin/pitch-slots/{id}/release",
            post(slots::release_slot),
        )
        .route(
            "/v1/admin/pitch-slots/{id}/complete",
            post(slots::complete_slot),
        )
}

/// Create all Pitches domain API routes
pub fn routes() -> Router<PitchesState> {
    Router::new().merge(slot_routes()).merge(admin_routes())
}
