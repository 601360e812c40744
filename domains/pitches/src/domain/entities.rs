//! Domain entities for the Pitches domain

use chrono::{DateTime, Duration, Utc};
use hackhub_common::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::state::{SlotEvent, SlotStateMachine, SlotStatus, StateError};

/// A fixed time window in which one team pitches to the judges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchSlot {
    pub id: Uuid,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    /// Holder of a booked slot; set only while the slot is booked
    pub team_id: Option<Uuid>,
    /// Team that pitched in a completed slot
    #[serde(default)]
    pub pitched_team_id: Option<Uuid>,
    pub booked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PitchSlot {
    pub fn new(start_time: DateTime<Utc>, duration: Duration, now: DateTime<Utc>) -> Result<Self> {
        if duration <= Duration::zero() {
            return Err(Error::Validation(
                "Pitch slot duration must be positive".to_string(),
            ));
        }

        let end_time = start_time.checked_add_signed(duration).ok_or_else(|| {
            Error::Validation("Pitch slot ends past the supported time range".to_string())
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            start_time,
            end_time,
            status: SlotStatus::Open,
            team_id: None,
            pitched_team_id: None,
            booked_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    #[mutants::skip] // Mirrors the status check done by the state machine
    pub fn is_open(&self) -> bool {
        self.status == SlotStatus::Open
    }

    pub fn is_held_by(&self, team_id: Uuid) -> bool {
        self.status == SlotStatus::Booked && self.team_id == Some(team_id)
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn book(&mut self, team_id: Uuid, now: DateTime<Utc>) -> std::result::Result<(), StateError> {
        self.status = SlotStateMachine::transition(self.status, SlotEvent::Book)?;
        self.team_id = Some(team_id);
        self.booked_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Free the slot, returning the team that held it
    pub fn release(&mut self, now: DateTime<Utc>) -> std::result::Result<Option<Uuid>, StateError> {
        self.status = SlotStateMachine::transition(self.status, SlotEvent::Release)?;
        self.booked_at = None;
        self.updated_at = now;
        Ok(self.team_id.take())
    }

    /// Mark the slot as pitched, moving the holder into `pitched_team_id`
    pub fn complete(&mut self, now: DateTime<Utc>) -> std::result::Result<(), StateError> {
        self.status = SlotStateMachine::transition(self.status, SlotEvent::Complete)?;
        self.pitched_team_id = self.team_id.take();
        self.updated_at = now;
        Ok(())
    }

    /// Only a booked slot carries `team_id`; only a completed one `pitched_team_id`
    pub fn validate(&self) -> Result<()> {
        let consistent = match self.status {
            SlotStatus::Open => self.team_id.is_none() && self.pitched_team_id.is_none(),
            SlotStatus::Booked => self.team_id.is_some() && self.pitched_team_id.is_none(),
            SlotStatus::Completed => self.team_id.is_none() && self.pitched_team_id.is_some(),
        };
        if !consistent || self.end_time <= self.start_time {
            return Err(Error::Internal(format!(
                "Pitch slot {} is inconsistent",
                self.id
            )));
        }
        Ok(())
    }
}
