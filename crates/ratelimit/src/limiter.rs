//! Rate limiter service
//!
//! Every throttled action calls `enforce` before touching entity state.

use std::sync::Arc;

use hackhub_common::{Clock, Error, Result, SystemClock};
use uuid::Uuid;

use crate::policy::{ActionKind, FailureMode, RateLimitPolicy};
use crate::store::{CounterStore, MemoryCounterStore, WindowKey};
use crate::window::RateLimitDecision;

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Process-local limiter on the wall clock
    pub fn in_memory(policy: RateLimitPolicy) -> Self {
        Self::new(
            Arc::new(MemoryCounterStore::new()),
            policy,
            Arc::new(SystemClock),
        )
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Count one request and report the decision without failing on denial
    pub async fn check(&self, actor_id: Uuid, action: ActionKind) -> Result<RateLimitDecision> {
        let limit = self.policy.limit_for(action);
        let now = self.clock.now();
        let key = WindowKey::new(actor_id, action);

        match self.store.hit(&key, &limit, now).await {
            Ok(decision) => Ok(decision),
            Err(err) => match self.policy.failure_mode {
                FailureMode::FailOpen => {
                    tracing::warn!(
                        actor_id = %actor_id,
                        action = %action,
                        error = %err,
                        "Rate limit store unreachable, failing open"
                    );
                    Ok(RateLimitDecision {
                        allowed: true,
                        remaining: limit.max_requests,
                        reset_at: now + limit.window,
                    })
                }
                FailureMode::FailClosed => {
                    tracing::warn!(
                        actor_id = %actor_id,
                        action = %action,
                        error = %err,
                        "Rate limit store unreachable, failing closed"
                    );
                    Err(Error::Unavailable(format!(
                        "rate limiting is temporarily unavailable for {}",
                        action
                    )))
                }
            },
        }
    }

    /// Count one request, failing with `RateLimitExceeded` when denied
    pub async fn enforce(&self, actor_id: Uuid, action: ActionKind) -> Result<RateLimitDecision> {
        let decision = self.check(actor_id, action).await?;
        if !decision.allowed {
            tracing::warn!(
                actor_id = %actor_id,
                action = %action,
                reset_at = %decision.reset_at,
                "Rate limit exceeded"
            );
            return Err(Error::RateLimitExceeded {
                reset_at: decision.reset_at,
            });
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RateLimit;
    use crate::store::DocumentCounterStore;
    use chrono::Duration;
    use hackhub_common::ManualClock;
    use hackhub_store::MemoryStore;

    fn tight_policy() -> RateLimitPolicy {
        RateLimitPolicy::default().with_limit(
            ActionKind::TeamCreate,
            RateLimit::new(3, Duration::milliseconds(1000)),
        )
    }

    #[tokio::test]
    async fn test_window_correctness_with_manual_clock() {
        let clock = ManualClock::default();
        let limiter = RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            tight_policy(),
            Arc::new(clock.clone()),
        );
        let actor = Uuid::new_v4();

        for _ in 0..3 {
            limiter.enforce(actor, ActionKind::TeamCreate).await.unwrap();
        }

        let start = clock.now();
        let result = limiter.enforce(actor, ActionKind::TeamCreate).await;
        match result {
            Err(Error::RateLimitExceeded { reset_at }) => {
                assert_eq!(reset_at, start + Duration::milliseconds(1000));
            }
            other => panic!("expected RateLimitExceeded, got {:?}", other),
        }

        clock.advance(Duration::milliseconds(1001));
        let decision = limiter.enforce(actor, ActionKind::TeamCreate).await.unwrap();
        // Fresh window with a count of one
        assert_eq!(decision.remaining, 2);
    }

    #[tokio::test]
    async fn test_exactly_window_end_is_still_limited() {
        let clock = ManualClock::default();
        let limiter = RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            tight_policy(),
            Arc::new(clock.clone()),
        );
        let actor = Uuid::new_v4();

        for _ in 0..3 {
            limiter.enforce(actor, ActionKind::TeamCreate).await.unwrap();
        }
        clock.advance(Duration::milliseconds(1000));
        assert!(limiter.enforce(actor, ActionKind::TeamCreate).await.is_err());
    }

    #[tokio::test]
    async fn test_check_reports_denial_without_error() {
        let limiter = RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            tight_policy(),
            Arc::new(ManualClock::default()),
        );
        let actor = Uuid::new_v4();

        for _ in 0..3 {
            limiter.check(actor, ActionKind::TeamCreate).await.unwrap();
        }
        let decision = limiter.check(actor, ActionKind::TeamCreate).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn test_actors_are_limited_independently() {
        let limiter = RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            tight_policy(),
            Arc::new(ManualClock::default()),
        );
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        for _ in 0..3 {
            limiter.enforce(a, ActionKind::TeamCreate).await.unwrap();
        }
        assert!(limiter.enforce(a, ActionKind::TeamCreate).await.is_err());
        assert!(limiter.enforce(b, ActionKind::TeamCreate).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_open_by_default() {
        let docs = Arc::new(MemoryStore::new());
        docs.set_available(false);
        let limiter = RateLimiter::new(
            Arc::new(DocumentCounterStore::new(docs)),
            tight_policy(),
            Arc::new(ManualClock::default()),
        );
        let actor = Uuid::new_v4();

        // Far beyond the limit, every call is still allowed
        for _ in 0..10 {
            let decision = limiter.enforce(actor, ActionKind::TeamCreate).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining, 3);
        }
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_closed_when_configured() {
        let docs = Arc::new(MemoryStore::new());
        docs.set_available(false);
        let limiter = RateLimiter::new(
            Arc::new(DocumentCounterStore::new(docs)),
            tight_policy().with_failure_mode(FailureMode::FailClosed),
            Arc::new(ManualClock::default()),
        );

        let result = limiter.enforce(Uuid::new_v4(), ActionKind::TeamCreate).await;
        assert!(matches!(result, Err(Error::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_store_recovers_after_outage() {
        let docs = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(
            Arc::new(DocumentCounterStore::new(docs.clone())),
            tight_policy(),
            Arc::new(ManualClock::default()),
        );
        let actor = Uuid::new_v4();

        docs.fail_next(1);
        limiter.enforce(actor, ActionKind::TeamCreate).await.unwrap();

        // The failed-open call was not counted
        for _ in 0..3 {
            limiter.enforce(actor, ActionKind::TeamCreate).await.unwrap();
        }
        assert!(limiter.enforce(actor, ActionKind::TeamCreate).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enforce_admits_exactly_max() {
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            tight_policy(),
            Arc::new(ManualClock::default()),
        ));
        let actor = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.enforce(actor, ActionKind::TeamCreate).await
            }));
        }

        let mut ok = 0;
        let mut limited = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(Error::RateLimitExceeded { .. }) => limited += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(ok, 3);
        assert_eq!(limited, 17);
    }
}
