//! Pitch slot API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use hackhub_auth::{AdminActor, CurrentActor};
use hackhub_common::{Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::PitchesState;
use crate::domain::entities::PitchSlot;
use crate::domain::state::SlotStatus;
use crate::service::{allocator::MAX_SEED_SLOTS, SeedPlan};

#[derive(Debug, Serialize)]
pub struct PitchSlotResponse {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    pub team_id: Option<Uuid>,
    pub pitched_team_id: Option<Uuid>,
    pub booked_at: Option<DateTime<Utc>>,
}

impl From<PitchSlot> for PitchSlotResponse {
    fn from(s: PitchSlot) -> Self {
        Self {
            id: s.id,
            start_time: s.start_time,
            end_time: s.end_time,
            status: s.status,
            team_id: s.team_id,
            pitched_team_id: s.pitched_team_id,
            booked_at: s.booked_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookSlotRequest {
    pub team_id: Uuid,
}

/// Request for seeding evenly spaced slots
#[derive(Debug, Deserialize, Validate)]
pub struct SeedSlotsRequest {
    #[validate(range(min = 1, max = MAX_SEED_SLOTS))]
    pub count: u32,

    pub start_time: DateTime<Utc>,

    #[validate(range(min = 1, max = 240))]
    pub duration_minutes: i64,

    #[validate(range(min = 1, max = 1440))]
    pub interval_minutes: i64,
}

impl SeedSlotsRequest {
    pub fn plan(&self) -> SeedPlan {
        SeedPlan {
            count: self.count,
            start_time: self.start_time,
            duration: Duration::minutes(self.duration_minutes),
            interval: Duration::minutes(self.interval_minutes),
        }
    }
}

/// **GET /v1/pitch-slots**
pub async fn list_slots(
    CurrentActor(_actor): CurrentActor,
    State(state): State<PitchesState>,
) -> Result<Json<Vec<PitchSlotResponse>>> {
    let slots = state.allocator.list_slots().await?;
    Ok(Json(slots.into_iter().map(PitchSlotResponse::from).collect()))
}

/// Book a slot for the caller's team
///
/// **POST /v1/pitch-slots/{id}/book**
///
/// `SLOT_ALREADY_TAKEN` means another team won; pick a different slot.
pub async fn book_slot(
    CurrentActor(actor): CurrentActor,
    State(state): State<PitchesState>,
    Path(slot_id): Path<Uuid>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<PitchSlotResponse>> {
    let slot = state
        .allocator
        .book_slot(&actor, slot_id, request.team_id)
        .await?;
    Ok(Json(slot.into()))
}

/// **GET /v1/teams/{id}/pitch-slot**
pub async fn team_slot(
    CurrentActor(_actor): CurrentActor,
    State(state): State<PitchesState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Option<PitchSlotResponse>>> {
    let slot = state.allocator.my_slot(team_id).await?;
    Ok(Json(slot.map(PitchSlotResponse::from)))
}

/// **POST /v1/admin/pitch-slots/seed**
pub async fn seed_slots(
    AdminActor(actor): AdminActor,
    State(state): State<PitchesState>,
    ValidatedJson(request): ValidatedJson<SeedSlotsRequest>,
) -> Result<(StatusCode, Json<Vec<PitchSlotResponse>>)> {
    let slots = state.allocator.seed_slots(&actor, request.plan()).await?;
    Ok((
        StatusCode::CREATED,
        Json(slots.into_iter().map(PitchSlotResponse::from).collect()),
    ))
}

/// **POST /v1/admin/pitch-slots/{id}/release**
pub async fn release_slot(
    AdminActor(actor): AdminActor,
    State(state): State<PitchesState>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<PitchSlotResponse>> {
    let slot = state.allocator.release_slot(&actor, slot_id).await?;
    Ok(Json(slot.into()))
}

/// **POST /v1/admin/pitch-slots/{id}/complete**
pub async fn complete_slot(
    AdminActor(actor): AdminActor,
    State(state): State<PitchesState>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<PitchSlotResponse>> {
    let slot = state.allocator.complete_slot(&actor, slot_id).await?;
    Ok(Json(slot.into()))
}
