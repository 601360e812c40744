//! Join request coordination
//!
//! Request-then-approve flow. Approval re-validates capacity and commits the
//! membership, the user's team reference and the request deletion together.
//!
//! Creating a request rewrites the team and the requester's team reference,
//! so an admission or team creation that read either one before the request
//! landed fails its commit and re-reads the pending requests.

use std::sync::Arc;

use hackhub_common::{retry_on_contention, Actor, Error, Result};
use hackhub_ratelimit::ActionKind;
use hackhub_store::Transaction;
use uuid::Uuid;

use crate::domain::entities::{JoinRequest, Team};
use crate::repository::{
    create_join_request_tx, delete_join_request_tx, set_team_reference_tx, write_team_tx,
};
use crate::service::registry::TeamRegistry;

#[derive(Clone)]
pub struct JoinRequestCoordinator {
    registry: Arc<TeamRegistry>,
}

impl JoinRequestCoordinator {
    pub fn new(registry: Arc<TeamRegistry>) -> Self {
        Self { registry }
    }

    fn attempts(&self) -> u32 {
        self.registry.rules().tx_max_attempts
    }

    /// Ask to join `team_id`; one pending request per (team, user)
    pub async fn request_join(&self, actor: &Actor, team_id: Uuid) -> Result<JoinRequest> {
        self.registry
            .limiter()
            .enforce(actor.id, ActionKind::JoinRequest)
            .await?;

        let request = retry_on_contention(self.attempts(), "request_join", move || {
            self.try_request_join(actor, team_id)
        })
        .await?;

        tracing::info!(
            request_id = %request.id,
            team_id = %team_id,
            user_id = %actor.id,
            "Join request created"
        );
        Ok(request)
    }

    async fn try_request_join(&self, actor: &Actor, team_id: Uuid) -> Result<JoinRequest> {
        let repos = self.registry.repositories();

        let mut team = repos.teams.find(team_id).await?;
        let participant = repos.participants.get(actor.id).await?;
        if team.value.is_member(actor.id)
            || participant.as_ref().is_some_and(|p| p.value.has_team())
        {
            return Err(Error::AlreadyInTeam);
        }

        let request_id = JoinRequest::id_for(team_id, actor.id);
        if repos.join_requests.get(request_id).await?.is_some() {
            return Err(Error::RequestAlreadyPending);
        }
        if !team.value.has_capacity(self.registry.rules().max_team_size) {
            return Err(Error::TeamFull);
        }

        let now = self.registry.clock().now();
        let request = JoinRequest::new(
            team_id,
            actor.id,
            actor.name.clone(),
            actor.email.clone(),
            now,
        );
        team.value.updated_at = now;

        let mut tx = Transaction::new();
        create_join_request_tx(&mut tx, &request)?;
        write_team_tx(&mut tx, &team.value, team.version)?;
        set_team_reference_tx(&mut tx, actor.id, None, participant.map(|p| p.version), now)?;
        repos.store().commit(tx).await?;

        Ok(request)
    }

    /// Leader approves a pending request.
    ///
    /// A full team fails with `TeamFull` and the request stays pending.
    pub async fn approve(&self, actor: &Actor, request_id: Uuid) -> Result<Team> {
        let leader_id = actor.id;
        let (team, discarded) = retry_on_contention(self.attempts(), "approve_join_request", move || {
            self.try_approve(leader_id, request_id)
        })
        .await?;

        tracing::info!(
            request_id = %request_id,
            team_id = %team.id,
            leader_id = %leader_id,
            size = team.size(),
            discarded,
            "Join request approved"
        );
        Ok(team)
    }

    async fn try_approve(&self, leader_id: Uuid, request_id: Uuid) -> Result<(Team, usize)> {
        let repos = self.registry.repositories();

        let request = repos.join_requests.find(request_id).await?.into_inner();
        let mut team = repos.teams.find(request.team_id).await?;
        team.value.require_leader(leader_id)?;
        let participant = repos.participants.get(request.user_id).await?;

        let mut tx = Transaction::new();
        delete_join_request_tx(&mut tx, request_id);
        let discarded = self
            .registry
            .stage_admission(
                &mut tx,
                &mut team,
                request.user_id,
                None,
                participant.as_ref(),
                Some(request_id),
            )
            .await?;
        repos.store().commit(tx).await?;

        Ok((team.value, discarded))
    }

    /// Leader rejects a pending request; nothing else changes
    pub async fn reject(&self, actor: &Actor, request_id: Uuid) -> Result<()> {
        let leader_id = actor.id;
        retry_on_contention(self.attempts(), "reject_join_request", move || {
            self.try_reject(leader_id, request_id)
        })
        .await?;

        tracing::info!(request_id = %request_id, leader_id = %leader_id, "Join request rejected");
        Ok(())
    }

    async fn try_reject(&self, leader_id: Uuid, request_id: Uuid) -> Result<()> {
        let repos = self.registry.repositories();

        let request = repos.join_requests.find(request_id).await?.into_inner();
        let team = repos.teams.find(request.team_id).await?;
        team.value.require_leader(leader_id)?;

        let mut tx = Transaction::new();
        delete_join_request_tx(&mut tx, request_id);
        repos.store().commit(tx).await?;
        Ok(())
    }

    /// Pending requests for a team, oldest first; leader only
    pub async fn pending_for_team(&self, actor: &Actor, team_id: Uuid) -> Result<Vec<JoinRequest>> {
        let repos = self.registry.repositories();
        let team = repos.teams.find(team_id).await?;
        team.value.require_leader(actor.id)?;
        repos.join_requests.for_team(team_id).await
    }

    pub async fn requests_for_user(&self, user_id: Uuid) -> Result<Vec<JoinRequest>> {
        self.registry
            .repositories()
            .join_requests
            .for_user(user_id)
            .await
    }
}
