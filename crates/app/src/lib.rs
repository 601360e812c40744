//! Hackhub application composition root
//!
//! Wires the store, rate limiter and domain services together and composes
//! the domain routers into a single application.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::Router;
use hackhub_auth::AuthConfig;
use hackhub_common::config::parse_var;
use hackhub_common::Clock;
use hackhub_pitches::{PitchesState, SlotAllocator};
use hackhub_ratelimit::{
    CounterStore, DocumentCounterStore, MemoryCounterStore, RateLimitPolicy, RateLimiter,
};
use hackhub_store::DocumentStore;
use hackhub_teams::{TeamRegistry, TeamRules, TeamsRepositories, TeamsState};
use tokio::task::JoinHandle;

/// Where rate-limit counters live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterBackend {
    /// Process-local counters; needs the periodic purge
    #[default]
    Memory,
    /// Counters shared through the document store
    Document,
}

impl FromStr for CounterBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(CounterBackend::Memory),
            "document" | "store" => Ok(CounterBackend::Document),
            other => Err(anyhow!("unknown rate limit store: {}", other)),
        }
    }
}

impl CounterBackend {
    pub fn from_env() -> anyhow::Result<Self> {
        parse_var("RATE_LIMIT_STORE", CounterBackend::default())
    }
}

/// Fully wired services behind the HTTP surface
#[derive(Clone)]
pub struct AppServices {
    pub registry: Arc<TeamRegistry>,
    pub allocator: Arc<SlotAllocator>,
    /// Set when counters are process-local
    pub memory_counters: Option<MemoryCounterStore>,
}

impl AppServices {
    pub fn build(
        store: Arc<dyn DocumentStore>,
        rules: TeamRules,
        policy: RateLimitPolicy,
        backend: CounterBackend,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (counters, memory_counters): (Arc<dyn CounterStore>, _) = match backend {
            CounterBackend::Memory => {
                let counters = MemoryCounterStore::new();
                (Arc::new(counters.clone()), Some(counters))
            }
            CounterBackend::Document => (Arc::new(DocumentCounterStore::new(store.clone())), None),
        };
        let limiter = RateLimiter::new(counters, policy, clock.clone());

        let repos = TeamsRepositories::new(store);
        let allocator = SlotAllocator::new(repos.clone(), clock.clone())
            .with_max_attempts(rules.tx_max_attempts)
            .with_min_team_size(rules.min_team_size);
        let registry = TeamRegistry::new(repos, limiter, rules, clock);

        Self {
            registry: Arc::new(registry),
            allocator: Arc::new(allocator),
            memory_counters,
        }
    }
}

/// Create the main application router with all routes
pub fn create_app(services: &AppServices, auth: AuthConfig) -> Router {
    let teams_state = TeamsState::new(services.registry.clone(), auth.clone());
    let pitches_state = PitchesState {
        allocator: services.allocator.clone(),
        auth,
    };

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(hackhub_teams::routes().with_state(teams_state))
        .merge(hackhub_pitches::routes().with_state(pitches_state))
}

/// Periodically drop expired in-memory rate-limit windows
pub fn spawn_rate_limit_cleanup(
    counters: MemoryCounterStore,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match counters.purge_expired(clock.now()) {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Purged expired rate limit windows"),
                Err(e) => tracing::warn!(error = %e, "Rate limit cleanup failed"),
            }
        }
    })
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
