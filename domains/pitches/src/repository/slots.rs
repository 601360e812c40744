//! Pitch slot repository and transaction builders

use std::sync::Arc;

use hackhub_common::{Error, Result};
use hackhub_store::{
    with_read_retry, DocumentStore, Precondition, Query, ReadRetryPolicy, Transaction, Versioned,
};
use uuid::Uuid;

use crate::domain::entities::PitchSlot;

pub const PITCH_SLOTS: &str = "pitch_slots";

#[derive(Clone)]
pub struct SlotRepository {
    store: Arc<dyn DocumentStore>,
    retry: ReadRetryPolicy,
}

impl SlotRepository {
    pub fn new(store: Arc<dyn DocumentStore>, retry: ReadRetryPolicy) -> Self {
        Self { store, retry }
    }

    pub async fn get(&self, slot_id: Uuid) -> Result<Option<Versioned<PitchSlot>>> {
        let id = slot_id.to_string();
        let (store, id) = (&self.store, &id);
        let doc =
            with_read_retry(self.retry, "get_pitch_slot", move || store.get(PITCH_SLOTS, id))
                .await?;

        Ok(doc.map(|d| d.decode_versioned()).transpose()?)
    }

    pub async fn find(&self, slot_id: Uuid) -> Result<Versioned<PitchSlot>> {
        self.get(slot_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Pitch slot {} not found", slot_id)))
    }

    /// All slots by start time
    pub async fn list(&self) -> Result<Vec<PitchSlot>> {
        let query = Query::new().order_by("start_time");
        let (store, query) = (&self.store, &query);
        let docs = with_read_retry(self.retry, "list_pitch_slots", move || {
            store.query(PITCH_SLOTS, query)
        })
        .await?;

        let slots = docs
            .iter()
            .map(|d| d.decode::<PitchSlot>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(slots)
    }
}

/// Create a new slot
pub fn create_slot_tx(tx: &mut Transaction, slot: &PitchSlot) -> Result<()> {
    slot.validate()?;
    let id = slot.id.to_string();
    tx.expect(PITCH_SLOTS, &id, Precondition::Missing)
        .create(PITCH_SLOTS, &id, serde_json::to_value(slot)?);
    Ok(())
}

/// Overwrite a slot, provided nobody changed it since `read_version`.
///
/// This is the "set team only if still open" guard: a concurrent booking
/// bumps the version and this write conflicts.
pub fn write_slot_tx(tx: &mut Transaction, slot: &PitchSlot, read_version: u64) -> Result<()> {
    slot.validate()?;
    let id = slot.id.to_string();
    tx.expect(PITCH_SLOTS, &id, Precondition::Version(read_version))
        .set(PITCH_SLOTS, &id, serde_json::to_value(slot)?);
    Ok(())
}
