//! Common test utilities and fixtures for integration tests
//!
//! Every test builds the real service graph over an in-memory document
//! store and a manually driven clock.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Duration, Utc};
use hackhub_app::{create_app, AppServices, CounterBackend};
use hackhub_auth::{sign_token, AuthConfig, IdentityClaims};
use hackhub_common::{Actor, ManualClock};
use hackhub_pitches::{PitchSlot, SeedPlan, SlotAllocator};
use hackhub_ratelimit::RateLimitPolicy;
use hackhub_store::MemoryStore;
use hackhub_teams::{JoinRequestCoordinator, Team, TeamRegistry, TeamRules};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub services: AppServices,
    pub join_requests: JoinRequestCoordinator,
    pub admin: Actor,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(TeamRules::default(), RateLimitPolicy::default())
    }

    pub fn with_rules(rules: TeamRules) -> Self {
        Self::with_config(rules, RateLimitPolicy::default())
    }

    pub fn with_config(rules: TeamRules, policy: RateLimitPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(epoch());
        let services = AppServices::build(
            store.clone(),
            rules,
            policy,
            CounterBackend::Memory,
            Arc::new(clock.clone()),
        );
        let join_requests = JoinRequestCoordinator::new(services.registry.clone());

        Self {
            store,
            clock,
            services,
            join_requests,
            admin: actor("Organizer").admin(),
        }
    }

    pub fn registry(&self) -> &Arc<TeamRegistry> {
        &self.services.registry
    }

    pub fn allocator(&self) -> &Arc<SlotAllocator> {
        &self.services.allocator
    }

    pub fn router(&self) -> Router {
        create_app(&self.services, AuthConfig::with_secret(JWT_SECRET))
    }

    /// Create a team under a fresh leader
    pub async fn team(&self, name: &str) -> (Actor, Team) {
        let leader = actor(&format!("{} Lead", name));
        let team = self
            .registry()
            .create_team(&leader, name, HashMap::new(), None)
            .await
            .expect("team creation failed");
        (leader, team)
    }

    pub async fn shortlisted_team(&self, name: &str) -> (Actor, Team) {
        let (leader, team) = self.team(name).await;
        let team = self
            .registry()
            .set_shortlisted(&self.admin, team.id, true)
            .await
            .expect("shortlisting failed");
        (leader, team)
    }

    /// Fill a team with fresh members up to `size`
    pub async fn fill_to(&self, team: &Team, size: usize) -> Vec<Actor> {
        let mut members = Vec::new();
        for i in team.size()..size {
            let member = actor(&format!("Member {}", i));
            self.registry()
                .join_by_code(&member, &team.invite_code, None)
                .await
                .expect("join failed");
            members.push(member);
        }
        members
    }

    pub async fn seed_slots(&self, count: u32, interval_minutes: i64) -> Vec<PitchSlot> {
        let plan = SeedPlan {
            count,
            start_time: epoch() + Duration::days(1),
            duration: Duration::minutes(15),
            interval: Duration::minutes(interval_minutes),
        };
        self.allocator()
            .seed_slots(&self.admin, plan)
            .await
            .expect("seeding failed")
    }
}

/// Millisecond-aligned start instant so stored timestamps round-trip exactly
pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_900_000_000_000).expect("valid timestamp")
}

pub fn actor(name: &str) -> Actor {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    Actor::new(Uuid::new_v4(), name, email)
}

/// `Authorization` header value for `actor`
pub fn bearer(actor: &Actor) -> String {
    let now = Utc::now().timestamp();
    let claims = IdentityClaims {
        sub: actor.id.to_string(),
        email: Some(actor.email.clone()),
        name: Some(actor.name.clone()),
        role: actor.is_admin.then(|| "admin".to_string()),
        iat: now as u64,
        exp: (now + 600) as u64,
        iss: None,
        aud: None,
    };
    let token = sign_token(&claims, &AuthConfig::with_secret(JWT_SECRET)).expect("signing failed");
    format!("Bearer {}", token)
}
