//! Participant (per-user team reference) repository

use std::sync::Arc;

use hackhub_common::Result;
use hackhub_store::{with_read_retry, DocumentStore, ReadRetryPolicy, Versioned};
use uuid::Uuid;

use super::collections::USERS;
use crate::domain::entities::Participant;

#[derive(Clone)]
pub struct ParticipantRepository {
    store: Arc<dyn DocumentStore>,
    retry: ReadRetryPolicy,
}

impl ParticipantRepository {
    pub fn new(store: Arc<dyn DocumentStore>, retry: ReadRetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Read a user's team reference; `None` if the user never joined a team
    pub async fn get(&self, user_id: Uuid) -> Result<Option<Versioned<Participant>>> {
        let id = user_id.to_string();
        let (store, id) = (&self.store, &id);
        let doc =
            with_read_retry(self.retry, "get_participant", move || store.get(USERS, id)).await?;

        Ok(doc.map(|d| d.decode_versioned()).transpose()?)
    }

    /// The team a user currently belongs to
    pub async fn team_id_for(&self, user_id: Uuid) -> Result<Option<Uuid>> {
        Ok(self
            .get(user_id)
            .await?
            .and_then(|p| p.value.team_id))
    }
}
