//! Team repository

use std::sync::Arc;

use async_trait::async_trait;
use hackhub_common::{Error, Result};
use hackhub_store::{with_read_retry, DocumentStore, Query, ReadRetryPolicy, Versioned};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::collections::{INVITE_CODES, TEAMS, TEAM_NAMES};
use crate::domain::entities::Team;
use crate::domain::invite_code::CodeLookup;

/// Body of a name or invite-code claim document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamClaim {
    pub team_id: Uuid,
}

#[derive(Clone)]
pub struct TeamRepository {
    store: Arc<dyn DocumentStore>,
    retry: ReadRetryPolicy,
}

impl TeamRepository {
    pub fn new(store: Arc<dyn DocumentStore>, retry: ReadRetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Find team by ID, with the version it was read at
    pub async fn get(&self, team_id: Uuid) -> Result<Option<Versioned<Team>>> {
        let id = team_id.to_string();
        let (store, id) = (&self.store, &id);
        let doc = with_read_retry(self.retry, "get_team", move || store.get(TEAMS, id)).await?;

        Ok(doc.map(|d| d.decode_versioned()).transpose()?)
    }

    /// Find team by ID or fail with `NotFound`
    pub async fn find(&self, team_id: Uuid) -> Result<Versioned<Team>> {
        self.get(team_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Team {} not found", team_id)))
    }

    /// List teams by name, optionally filtered by shortlist flag
    pub async fn list(&self, shortlisted: Option<bool>) -> Result<Vec<Team>> {
        let mut query = Query::new().order_by("name");
        if let Some(flag) = shortlisted {
            query = query.filter("shortlisted", flag);
        }

        let (store, query) = (&self.store, &query);
        let docs =
            with_read_retry(self.retry, "list_teams", move || store.query(TEAMS, query)).await?;

        let teams = docs
            .iter()
            .map(|d| d.decode::<Team>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    /// Whether a case-insensitive name key is already claimed
    pub async fn name_taken(&self, key: &str) -> Result<bool> {
        let store = &self.store;
        let doc =
            with_read_retry(self.retry, "get_team_name", move || store.get(TEAM_NAMES, key))
                .await?;
        Ok(doc.is_some())
    }

    /// Resolve an invite code to the team holding it
    pub async fn resolve_code(&self, code: &str) -> Result<Option<Uuid>> {
        let store = &self.store;
        let doc =
            with_read_retry(self.retry, "get_invite_code", move || store.get(INVITE_CODES, code))
                .await?;

        match doc {
            Some(doc) => Ok(Some(doc.decode::<TeamClaim>()?.team_id)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CodeLookup for TeamRepository {
    async fn code_exists(&self, code: &str) -> Result<bool> {
        Ok(self.resolve_code(code).await?.is_some())
    }
}
