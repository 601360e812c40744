//! Team registry
//!
//! Owns team creation, direct joins by invite code, membership removal and
//! the admin shortlist flag. Every mutation that touches membership reads
//! the team and the affected users' team references, validates, and commits
//! one transaction guarded by the versions it read. A lost race re-runs the
//! whole attempt from fresh reads.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hackhub_common::{retry_on_contention, Actor, Clock, Error, Result};
use hackhub_ratelimit::{ActionKind, RateLimiter};
use hackhub_store::{Fields, Transaction, Versioned};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::{JoinRequest, Participant, SubmissionStatus, Team};
use crate::domain::invite_code::InviteCodeGenerator;
use crate::domain::rules::{JoinOverflowPolicy, TeamRules};
use crate::domain::validation::{
    is_valid_invite_code, name_key, normalize_invite_code, validate_team_name,
};
use crate::repository::collections::TEAMS;
use crate::repository::{
    claim_team_tx, discard_join_requests_tx, set_team_reference_tx, write_team_tx,
    TeamsRepositories,
};

#[derive(Clone)]
pub struct TeamRegistry {
    repos: TeamsRepositories,
    codes: InviteCodeGenerator,
    limiter: RateLimiter,
    rules: TeamRules,
    clock: Arc<dyn Clock>,
}

impl TeamRegistry {
    pub fn new(
        repos: TeamsRepositories,
        limiter: RateLimiter,
        rules: TeamRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codes = InviteCodeGenerator::new(
            Arc::new(repos.teams.clone()),
            rules.invite_code_max_attempts,
        );
        Self {
            repos,
            codes,
            limiter,
            rules,
            clock,
        }
    }

    pub fn rules(&self) -> &TeamRules {
        &self.rules
    }

    pub fn repositories(&self) -> &TeamsRepositories {
        &self.repos
    }

    pub(crate) fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Create a team led by `actor`, who must not belong to a team yet
    pub async fn create_team(
        &self,
        actor: &Actor,
        name: &str,
        metadata: HashMap<String, Value>,
        position: Option<String>,
    ) -> Result<Team> {
        let name = validate_team_name(name)?;
        self.limiter.enforce(actor.id, ActionKind::TeamCreate).await?;

        let (name, metadata, position) = (name.as_str(), &metadata, position.as_deref());
        let team = retry_on_contention(self.rules.tx_max_attempts, "create_team", move || {
            self.try_create_team(actor, name, metadata, position)
        })
        .await?;

        tracing::info!(
            team_id = %team.id,
            leader_id = %actor.id,
            name = %team.name,
            "Team created"
        );
        Ok(team)
    }

    async fn try_create_team(
        &self,
        actor: &Actor,
        name: &str,
        metadata: &HashMap<String, Value>,
        position: Option<&str>,
    ) -> Result<Team> {
        let participant = self.repos.participants.get(actor.id).await?;
        if participant.as_ref().is_some_and(|p| p.value.has_team()) {
            return Err(Error::AlreadyInTeam);
        }

        if self.repos.teams.name_taken(&name_key(name)).await? {
            return Err(Error::NameTaken(name.to_string()));
        }

        let code = self.codes.generate().await?;
        let now = self.clock.now();
        let team = Team::new(
            name,
            code,
            actor.id,
            position.map(str::to_string),
            metadata.clone(),
            now,
        )?;

        let mut tx = Transaction::new();
        claim_team_tx(&mut tx, &team)?;
        set_team_reference_tx(
            &mut tx,
            actor.id,
            Some(team.id),
            participant.map(|p| p.version),
            now,
        )?;
        let stale = self.repos.join_requests.for_user(actor.id).await?;
        discard_join_requests_tx(&mut tx, &stale, None);
        self.repos.store().commit(tx).await?;

        Ok(team)
    }

    /// Read-only check for live validation; not a reservation
    pub async fn check_name_available(&self, name: &str) -> Result<bool> {
        let name = validate_team_name(name)?;
        Ok(!self.repos.teams.name_taken(&name_key(&name)).await?)
    }

    /// Join a team directly with its invite code
    pub async fn join_by_code(
        &self,
        actor: &Actor,
        code: &str,
        position: Option<String>,
    ) -> Result<Team> {
        self.limiter.enforce(actor.id, ActionKind::CodeJoin).await?;

        let code = normalize_invite_code(code);
        if !is_valid_invite_code(&code) {
            return Err(Error::InvalidCode);
        }

        let (user_id, code, position) = (actor.id, code.as_str(), position.as_deref());
        let team = retry_on_contention(self.rules.tx_max_attempts, "join_by_code", move || {
            self.try_join_by_code(user_id, code, position)
        })
        .await?;

        tracing::info!(
            team_id = %team.id,
            user_id = %actor.id,
            size = team.size(),
            "Member joined team by invite code"
        );
        Ok(team)
    }

    async fn try_join_by_code(
        &self,
        user_id: Uuid,
        code: &str,
        position: Option<&str>,
    ) -> Result<Team> {
        let team_id = self
            .repos
            .teams
            .resolve_code(code)
            .await?
            .ok_or(Error::InvalidCode)?;
        let mut team = self
            .repos
            .teams
            .get(team_id)
            .await?
            .ok_or(Error::InvalidCode)?;
        let participant = self.repos.participants.get(user_id).await?;

        let mut tx = Transaction::new();
        self.stage_admission(&mut tx, &mut team, user_id, position, participant.as_ref(), None)
            .await?;
        self.repos.store().commit(tx).await?;

        Ok(team.value)
    }

    /// Stage adding `user_id` to `team` into `tx`.
    ///
    /// Writes the team (guarded by its read version) and the user's team
    /// reference, and deletes join requests made moot by the admission:
    /// the user's own pending requests, plus the team's remaining requests
    /// when this fills the last seat under `AutoReject`. `handled_request`
    /// is left alone so the caller can delete it under its own precondition.
    pub(crate) async fn stage_admission(
        &self,
        tx: &mut Transaction,
        team: &mut Versioned<Team>,
        user_id: Uuid,
        position: Option<&str>,
        participant: Option<&Versioned<Participant>>,
        handled_request: Option<Uuid>,
    ) -> Result<usize> {
        if participant.is_some_and(|p| p.value.has_team()) {
            return Err(Error::AlreadyInTeam);
        }

        let now = self.clock.now();
        team.value.add_member(
            user_id,
            position.map(str::to_string),
            self.rules.max_team_size,
            now,
        )?;
        team.value.validate(self.rules.max_team_size)?;
        write_team_tx(tx, &team.value, team.version)?;
        set_team_reference_tx(
            tx,
            user_id,
            Some(team.value.id),
            participant.map(|p| p.version),
            now,
        )?;

        let mut moot: Vec<JoinRequest> = self.repos.join_requests.for_user(user_id).await?;
        let filled = !team.value.has_capacity(self.rules.max_team_size);
        if filled && self.rules.overflow_policy == JoinOverflowPolicy::AutoReject {
            let seen: HashSet<Uuid> = moot.iter().map(|r| r.id).collect();
            let remaining = self.repos.join_requests.for_team(team.value.id).await?;
            moot.extend(remaining.into_iter().filter(|r| !seen.contains(&r.id)));
        }

        let discarded = discard_join_requests_tx(tx, &moot, handled_request);
        if discarded > 0 {
            tracing::debug!(
                team_id = %team.value.id,
                user_id = %user_id,
                discarded,
                "Discarding join requests made moot by admission"
            );
        }
        Ok(discarded)
    }

    /// Admin-only shortlist toggle; setting the current value is a no-op
    pub async fn set_shortlisted(&self, actor: &Actor, team_id: Uuid, value: bool) -> Result<Team> {
        actor.require_admin()?;

        let team = self.repos.teams.find(team_id).await?;
        if team.value.shortlisted == value {
            return Ok(team.value);
        }

        let mut fields = Fields::new();
        fields.insert("shortlisted".to_string(), Value::Bool(value));
        fields.insert(
            "updated_at".to_string(),
            serde_json::to_value(self.clock.now())?,
        );
        let doc = self
            .repos
            .store()
            .update(TEAMS, &team_id.to_string(), fields)
            .await?;

        tracing::info!(team_id = %team_id, shortlisted = value, admin_id = %actor.id, "Team shortlist updated");
        Ok(doc.decode()?)
    }

    pub async fn get_team(&self, team_id: Uuid) -> Result<Team> {
        Ok(self.repos.teams.find(team_id).await?.into_inner())
    }

    /// The team a user currently belongs to, if any
    pub async fn team_for_user(&self, user_id: Uuid) -> Result<Option<Team>> {
        let Some(team_id) = self.repos.participants.team_id_for(user_id).await? else {
            return Ok(None);
        };
        Ok(self.repos.teams.get(team_id).await?.map(Versioned::into_inner))
    }

    /// A non-leader member leaves their team
    pub async fn leave_team(&self, actor: &Actor, team_id: Uuid) -> Result<()> {
        let user_id = actor.id;
        retry_on_contention(self.rules.tx_max_attempts, "leave_team", move || {
            self.try_leave_team(user_id, team_id)
        })
        .await?;

        tracing::info!(team_id = %team_id, user_id = %user_id, "Member left team");
        Ok(())
    }

    async fn try_leave_team(&self, user_id: Uuid, team_id: Uuid) -> Result<()> {
        let participant = self
            .repos
            .participants
            .get(user_id)
            .await?
            .filter(|p| p.value.team_id == Some(team_id))
            .ok_or_else(|| Error::NotFound("You are not a member of this team".to_string()))?;

        let mut team = self.repos.teams.find(team_id).await?;
        let now = self.clock.now();
        team.value.remove_member(user_id, now)?;

        let mut tx = Transaction::new();
        write_team_tx(&mut tx, &team.value, team.version)?;
        set_team_reference_tx(&mut tx, user_id, None, Some(participant.version), now)?;
        self.repos.store().commit(tx).await?;
        Ok(())
    }

    /// Leader removes another member from the team
    pub async fn remove_member(
        &self,
        actor: &Actor,
        team_id: Uuid,
        member_id: Uuid,
    ) -> Result<Team> {
        let leader_id = actor.id;
        let team = retry_on_contention(self.rules.tx_max_attempts, "remove_member", move || {
            self.try_remove_member(leader_id, team_id, member_id)
        })
        .await?;

        tracing::info!(
            team_id = %team_id,
            member_id = %member_id,
            leader_id = %leader_id,
            "Member removed from team"
        );
        Ok(team)
    }

    async fn try_remove_member(
        &self,
        leader_id: Uuid,
        team_id: Uuid,
        member_id: Uuid,
    ) -> Result<Team> {
        let mut team = self.repos.teams.find(team_id).await?;
        team.value.require_leader(leader_id)?;

        let now = self.clock.now();
        team.value.remove_member(member_id, now)?;
        let participant = self.repos.participants.get(member_id).await?;

        let mut tx = Transaction::new();
        write_team_tx(&mut tx, &team.value, team.version)?;
        if let Some(participant) = participant.filter(|p| p.value.team_id == Some(team_id)) {
            set_team_reference_tx(&mut tx, member_id, None, Some(participant.version), now)?;
        }
        self.repos.store().commit(tx).await?;

        Ok(team.value)
    }

    /// Members update the submission status; last writer wins.
    ///
    /// Submitting requires at least `min_team_size` members.
    pub async fn set_submission_status(
        &self,
        actor: &Actor,
        team_id: Uuid,
        status: SubmissionStatus,
    ) -> Result<Team> {
        let team = self.repos.teams.find(team_id).await?;
        if !team.value.is_member(actor.id) {
            return Err(Error::Authorization(
                "Only team members can update the submission".to_string(),
            ));
        }

        if status == SubmissionStatus::Submitted {
            team.value.require_min_size(self.rules.min_team_size)?;
        }

        self.limiter
            .enforce(actor.id, ActionKind::SubmissionWrite)
            .await?;

        let mut fields = Fields::new();
        fields.insert("submission_status".to_string(), serde_json::to_value(status)?);
        fields.insert(
            "updated_at".to_string(),
            serde_json::to_value(self.clock.now())?,
        );
        let doc = self
            .repos
            .store()
            .update(TEAMS, &team_id.to_string(), fields)
            .await?;

        tracing::info!(team_id = %team_id, user_id = %actor.id, status = %status, "Submission status updated");
        Ok(doc.decode()?)
    }

    /// Admin listing of teams, optionally by shortlist flag
    pub async fn list_teams(&self, actor: &Actor, shortlisted: Option<bool>) -> Result<Vec<Team>> {
        actor.require_admin()?;
        self.repos.teams.list(shortlisted).await
    }
}
