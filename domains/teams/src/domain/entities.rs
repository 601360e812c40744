//! Domain entities for the Hackhub teams domain
//!
//! Teams, the per-user team reference, and pending join requests. Entity
//! methods enforce the single-document rules; anything spanning two
//! documents is committed by the services in one transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hackhub_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::validation::{name_key, validate_team_name};

/// Submission progress for a team's project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Draft,
    Submitted,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Draft => write!(f, "draft"),
            SubmissionStatus::Submitted => write!(f, "submitted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: Uuid,
    /// Self-described role on the team, e.g. "frontend"
    pub position: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// Team entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub leader_id: Uuid,
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub shortlisted: bool,
    #[serde(default)]
    pub submission_status: SubmissionStatus,
    #[serde(default)]
    pub pitch_slot_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team with its leader as the only member
    pub fn new(
        name: &str,
        invite_code: String,
        leader_id: Uuid,
        position: Option<String>,
        metadata: HashMap<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let name = validate_team_name(name)?;

        Ok(Team {
            id: Uuid::new_v4(),
            name,
            invite_code,
            leader_id,
            members: vec![TeamMember {
                user_id: leader_id,
                position,
                joined_at: now,
            }],
            shortlisted: false,
            submission_status: SubmissionStatus::Draft,
            pitch_slot_id: None,
            metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// Case-insensitive uniqueness key for this team's name
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn member_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.user_id).collect()
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn is_leader(&self, user_id: Uuid) -> bool {
        self.leader_id == user_id
    }

    /// Whether one more member fits under `max_team_size`
    pub fn has_capacity(&self, max_team_size: usize) -> bool {
        self.size() < max_team_size
    }

    /// Fail with `Validation` while the team is below `min_team_size`
    pub fn require_min_size(&self, min_team_size: usize) -> Result<()> {
        if self.size() < min_team_size {
            return Err(Error::Validation(format!(
                "Team needs at least {} members, it has {}",
                min_team_size,
                self.size()
            )));
        }
        Ok(())
    }

    /// Fail with `Authorization` unless `user_id` leads this team
    pub fn require_leader(&self, user_id: Uuid) -> Result<()> {
        if self.is_leader(user_id) {
            Ok(())
        } else {
            Err(Error::Authorization(
                "Only the team leader can perform this action".to_string(),
            ))
        }
    }

    /// Add a member, enforcing capacity and uniqueness
    pub fn add_member(
        &mut self,
        user_id: Uuid,
        position: Option<String>,
        max_team_size: usize,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.is_member(user_id) {
            return Err(Error::AlreadyInTeam);
        }
        if !self.has_capacity(max_team_size) {
            return Err(Error::TeamFull);
        }

        self.members.push(TeamMember {
            user_id,
            position,
            joined_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Remove a non-leader member
    pub fn remove_member(&mut self, user_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        if self.is_leader(user_id) {
            return Err(Error::Conflict(
                "The team leader cannot leave or be removed from the team".to_string(),
            ));
        }

        let before = self.members.len();
        self.members.retain(|m| m.user_id != user_id);
        if self.members.len() == before {
            return Err(Error::NotFound("Team member not found".to_string()));
        }

        self.updated_at = now;
        Ok(())
    }

    /// Check the structural invariants of a stored team
    pub fn validate(&self, max_team_size: usize) -> Result<()> {
        if !self.is_member(self.leader_id) {
            return Err(Error::Internal(format!(
                "Team {} leader is not a member",
                self.id
            )));
        }
        if self.size() > max_team_size {
            return Err(Error::Internal(format!(
                "Team {} exceeds the maximum size",
                self.id
            )));
        }
        let mut ids = self.member_ids();
        ids.sort();
        ids.dedup();
        if ids.len() != self.size() {
            return Err(Error::Internal(format!(
                "Team {} lists a member twice",
                self.id
            )));
        }
        Ok(())
    }
}

/// A user's reference to the team they belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub team_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(id: Uuid, team_id: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            team_id,
            updated_at: now,
        }
    }

    pub fn has_team(&self) -> bool {
        self.team_id.is_some()
    }
}

/// Pending request by a non-member to join a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    /// Denormalized for display to the leader
    pub user_name: String,
    pub user_email: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl JoinRequest {
    pub fn new(
        team_id: Uuid,
        user_id: Uuid,
        user_name: String,
        user_email: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::id_for(team_id, user_id),
            team_id,
            user_id,
            user_name,
            user_email,
            created_at: now,
        }
    }

    /// Deterministic id, so one (team, user) pair maps to one document
    pub fn id_for(team_id: Uuid, user_id: Uuid) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("join-request:{}:{}", team_id, user_id).as_bytes(),
        )
    }
}
