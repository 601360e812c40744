//! Slot allocator
//!
//! Books pitch slots for shortlisted teams. A booking writes the slot and
//! the team's `pitch_slot_id` in one transaction guarded by both read
//! versions, so two teams racing for one slot produce exactly one winner.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hackhub_common::{retry_on_contention, Actor, Clock, Error, Result};
use hackhub_store::{ReadRetryPolicy, Transaction};
use hackhub_teams::repository::write_team_tx;
use hackhub_teams::TeamsRepositories;
use uuid::Uuid;

use crate::domain::entities::PitchSlot;
use crate::repository::{create_slot_tx, write_slot_tx, SlotRepository};

/// Upper bound on slots created by one seeding call
pub const MAX_SEED_SLOTS: u32 = 100;

const DEFAULT_TX_MAX_ATTEMPTS: u32 = 8;

/// Evenly spaced slots: `count` slots of `duration`, one every `interval`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedPlan {
    pub count: u32,
    pub start_time: DateTime<Utc>,
    pub duration: Duration,
    pub interval: Duration,
}

impl SeedPlan {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 || self.count > MAX_SEED_SLOTS {
            return Err(Error::Validation(format!(
                "Slot count must be between 1 and {}",
                MAX_SEED_SLOTS
            )));
        }
        if self.duration <= Duration::zero() {
            return Err(Error::Validation(
                "Slot duration must be positive".to_string(),
            ));
        }
        if self.interval < self.duration {
            return Err(Error::Validation(
                "Slot interval must not be shorter than the slot duration".to_string(),
            ));
        }
        self.start_of(self.count - 1)?
            .checked_add_signed(self.duration)
            .ok_or_else(out_of_range)?;
        Ok(())
    }

    /// Start time of the slot at `index`
    pub fn start_of(&self, index: u32) -> Result<DateTime<Utc>> {
        let offset = i32::try_from(index)
            .ok()
            .and_then(|i| self.interval.checked_mul(i))
            .ok_or_else(out_of_range)?;
        self.start_time
            .checked_add_signed(offset)
            .ok_or_else(out_of_range)
    }
}

fn out_of_range() -> Error {
    Error::Validation("Slots would end past the supported time range".to_string())
}

#[derive(Clone)]
pub struct SlotAllocator {
    slots: SlotRepository,
    teams: TeamsRepositories,
    clock: Arc<dyn Clock>,
    tx_max_attempts: u32,
    min_team_size: usize,
}

impl SlotAllocator {
    pub fn new(teams: TeamsRepositories, clock: Arc<dyn Clock>) -> Self {
        Self::with_retry(teams, clock, ReadRetryPolicy::default())
    }

    pub fn with_retry(teams: TeamsRepositories, clock: Arc<dyn Clock>, retry: ReadRetryPolicy) -> Self {
        Self {
            slots: SlotRepository::new(teams.store().clone(), retry),
            teams,
            clock,
            tx_max_attempts: DEFAULT_TX_MAX_ATTEMPTS,
            min_team_size: 1,
        }
    }

    pub fn with_max_attempts(mut self, tx_max_attempts: u32) -> Self {
        self.tx_max_attempts = tx_max_attempts.max(1);
        self
    }

    /// Teams smaller than this cannot book a slot
    pub fn with_min_team_size(mut self, min_team_size: usize) -> Self {
        self.min_team_size = min_team_size;
        self
    }

    /// All slots ordered by start time
    pub async fn list_slots(&self) -> Result<Vec<PitchSlot>> {
        self.slots.list().await
    }

    /// Book `slot_id` for `team_id` on behalf of the team leader.
    ///
    /// Checks run in order: `NotShortlisted`, the minimum team size, then
    /// `TeamAlreadyBooked`, then `SlotAlreadyTaken`. Booking the slot the
    /// team already holds returns it unchanged.
    pub async fn book_slot(&self, actor: &Actor, slot_id: Uuid, team_id: Uuid) -> Result<PitchSlot> {
        let leader_id = actor.id;
        let (slot, booked) = retry_on_contention(self.tx_max_attempts, "book_slot", move || {
            self.try_book_slot(leader_id, slot_id, team_id)
        })
        .await?;

        if booked {
            tracing::info!(
                slot_id = %slot_id,
                team_id = %team_id,
                start_time = %slot.start_time,
                "Pitch slot booked"
            );
        }
        Ok(slot)
    }

    async fn try_book_slot(
        &self,
        leader_id: Uuid,
        slot_id: Uuid,
        team_id: Uuid,
    ) -> Result<(PitchSlot, bool)> {
        let mut team = self.teams.teams.find(team_id).await?;
        team.value.require_leader(leader_id)?;

        if !team.value.shortlisted {
            return Err(Error::NotShortlisted);
        }
        team.value.require_min_size(self.min_team_size)?;
        if let Some(held) = team.value.pitch_slot_id {
            if held == slot_id {
                let slot = self.slots.find(slot_id).await?;
                if slot.value.is_held_by(team_id) {
                    return Ok((slot.value, false));
                }
            }
            return Err(Error::TeamAlreadyBooked);
        }

        let mut slot = self.slots.find(slot_id).await?;
        if !slot.value.is_open() {
            return Err(Error::SlotAlreadyTaken);
        }

        let now = self.clock.now();
        slot.value.book(team_id, now)?;
        team.value.pitch_slot_id = Some(slot_id);
        team.value.updated_at = now;

        let mut tx = Transaction::new();
        write_slot_tx(&mut tx, &slot.value, slot.version)?;
        write_team_tx(&mut tx, &team.value, team.version)?;
        self.teams.store().commit(tx).await?;

        Ok((slot.value, true))
    }

    /// The slot a team holds, if any
    pub async fn my_slot(&self, team_id: Uuid) -> Result<Option<PitchSlot>> {
        let team = self.teams.teams.find(team_id).await?;
        match team.value.pitch_slot_id {
            Some(slot_id) => Ok(self.slots.get(slot_id).await?.map(|s| s.into_inner())),
            None => Ok(None),
        }
    }

    /// Bulk-create open slots. Repeated seeding is not deduplicated.
    pub async fn seed_slots(&self, actor: &Actor, plan: SeedPlan) -> Result<Vec<PitchSlot>> {
        actor.require_admin()?;
        plan.validate()?;

        let now = self.clock.now();
        let slots = (0..plan.count)
            .map(|i| PitchSlot::new(plan.start_of(i)?, plan.duration, now))
            .collect::<Result<Vec<_>>>()?;

        let mut tx = Transaction::new();
        for slot in &slots {
            create_slot_tx(&mut tx, slot)?;
        }
        self.teams.store().commit(tx).await?;

        tracing::info!(
            count = plan.count,
            start_time = %plan.start_time,
            admin_id = %actor.id,
            "Pitch slots seeded"
        );
        Ok(slots)
    }

    /// Return a booked slot to open and clear the holder's reference
    pub async fn release_slot(&self, actor: &Actor, slot_id: Uuid) -> Result<PitchSlot> {
        actor.require_admin()?;

        let slot = retry_on_contention(self.tx_max_attempts, "release_slot", move || {
            self.try_release_slot(slot_id)
        })
        .await?;

        tracing::info!(slot_id = %slot_id, admin_id = %actor.id, "Pitch slot released");
        Ok(slot)
    }

    async fn try_release_slot(&self, slot_id: Uuid) -> Result<PitchSlot> {
        let mut slot = self.slots.find(slot_id).await?;
        let now = self.clock.now();
        let holder = slot.value.release(now)?;

        let mut tx = Transaction::new();
        write_slot_tx(&mut tx, &slot.value, slot.version)?;
        if let Some(team_id) = holder {
            if let Some(mut team) = self.teams.teams.get(team_id).await? {
                if team.value.pitch_slot_id == Some(slot_id) {
                    team.value.pitch_slot_id = None;
                    team.value.updated_at = now;
                    write_team_tx(&mut tx, &team.value, team.version)?;
                }
            }
        }
        self.teams.store().commit(tx).await?;

        Ok(slot.value)
    }

    /// Mark a booked slot as pitched.
    ///
    /// The holder moves to `pitched_team_id`; the team keeps its
    /// `pitch_slot_id` so it cannot book a second slot.
    pub async fn complete_slot(&self, actor: &Actor, slot_id: Uuid) -> Result<PitchSlot> {
        actor.require_admin()?;

        let slot = retry_on_contention(self.tx_max_attempts, "complete_slot", move || {
            self.try_complete_slot(slot_id)
        })
        .await?;

        tracing::info!(
            slot_id = %slot_id,
            team_id = ?slot.pitched_team_id,
            admin_id = %actor.id,
            "Pitch slot completed"
        );
        Ok(slot)
    }

    async fn try_complete_slot(&self, slot_id: Uuid) -> Result<PitchSlot> {
        let mut slot = self.slots.find(slot_id).await?;
        slot.value.complete(self.clock.now())?;

        let mut tx = Transaction::new();
        write_slot_tx(&mut tx, &slot.value, slot.version)?;
        self.teams.store().commit(tx).await?;

        Ok(slot.value)
    }
}
