//! Join request repository

use std::sync::Arc;

use hackhub_common::{Error, Result};
use hackhub_store::{with_read_retry, Document, DocumentStore, Query, ReadRetryPolicy, Versioned};
use uuid::Uuid;

use super::collections::JOIN_REQUESTS;
use crate::domain::entities::JoinRequest;

#[derive(Clone)]
pub struct JoinRequestRepository {
    store: Arc<dyn DocumentStore>,
    retry: ReadRetryPolicy,
}

impl JoinRequestRepository {
    pub fn new(store: Arc<dyn DocumentStore>, retry: ReadRetryPolicy) -> Self {
        Self { store, retry }
    }

    pub async fn get(&self, request_id: Uuid) -> Result<Option<Versioned<JoinRequest>>> {
        let id = request_id.to_string();
        let (store, id) = (&self.store, &id);
        let doc = with_read_retry(self.retry, "get_join_request", move || {
            store.get(JOIN_REQUESTS, id)
        })
        .await?;

        Ok(doc.map(|d| d.decode_versioned()).transpose()?)
    }

    /// Find a pending request or fail with `NotFound`
    pub async fn find(&self, request_id: Uuid) -> Result<Versioned<JoinRequest>> {
        self.get(request_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Join request {} not found", request_id)))
    }

    /// Pending requests for a team, oldest first
    pub async fn for_team(&self, team_id: Uuid) -> Result<Vec<JoinRequest>> {
        let query = Query::new()
            .filter("team_id", team_id.to_string())
            .order_by("created_at");
        self.list("list_team_join_requests", &query).await
    }

    /// Pending requests made by a user, oldest first
    pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<JoinRequest>> {
        let query = Query::new()
            .filter("user_id", user_id.to_string())
            .order_by("created_at");
        self.list("list_user_join_requests", &query).await
    }

    async fn list(&self, operation: &'static str, query: &Query) -> Result<Vec<JoinRequest>> {
        let store = &self.store;
        let docs =
            with_read_retry(self.retry, operation, move || store.query(JOIN_REQUESTS, query))
                .await?;

        let requests = docs
            .iter()
            .map(Document::decode::<JoinRequest>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(requests)
    }
}
