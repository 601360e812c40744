//! Counter storage backends
//!
//! `hit` must count a request atomically: two concurrent hits for the same
//! key can never both observe the same count.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hackhub_store::{DocumentStore, Precondition, StoreError, Transaction};
use uuid::Uuid;

use crate::policy::{ActionKind, RateLimit};
use crate::window::{self, RateLimitDecision, Window};

/// Collection holding one counter document per (actor, action)
pub const RATE_LIMITS_COLLECTION: &str = "rate_limits";

const DEFAULT_COMMIT_ATTEMPTS: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKey {
    pub actor_id: Uuid,
    pub action: ActionKind,
}

impl WindowKey {
    pub fn new(actor_id: Uuid, action: ActionKind) -> Self {
        Self { actor_id, action }
    }

    pub fn document_id(&self) -> String {
        format!("{}:{}", self.actor_id, self.action.as_str())
    }
}

/// Storage for fixed-window counters
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Count one request for `key` and report whether it is allowed
    async fn hit(
        &self,
        key: &WindowKey,
        limit: &RateLimit,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, StoreError>;
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    window: Window,
    window_len: Duration,
}

/// Process-local counters, atomic under a single lock
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    windows: Arc<Mutex<HashMap<WindowKey, Tracked>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop windows that have expired so idle actors do not accumulate
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| StoreError::Backend("rate limit lock poisoned".to_string()))?;
        let before = windows.len();
        windows.retain(|_, tracked| now <= tracked.window.window_start + tracked.window_len);
        Ok(before - windows.len())
    }

    pub fn len(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(
        &self,
        key: &WindowKey,
        limit: &RateLimit,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, StoreError> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| StoreError::Backend("rate limit lock poisoned".to_string()))?;

        let existing = windows.get(key).map(|t| t.window);
        let (next, decision) = window::apply(existing.as_ref(), limit, now);
        if let Some(window) = next {
            windows.insert(
                *key,
                Tracked {
                    window,
                    window_len: limit.window,
                },
            );
        }
        Ok(decision)
    }
}

/// Counters kept in the shared document store.
///
/// Each hit is a read followed by a version-checked commit, so two
/// processes counting for the same actor cannot lose an update.
#[derive(Clone)]
pub struct DocumentCounterStore {
    store: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

impl DocumentCounterStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_COMMIT_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

#[async_trait]
impl CounterStore for DocumentCounterStore {
    async fn hit(
        &self,
        key: &WindowKey,
        limit: &RateLimit,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, StoreError> {
        let id = key.document_id();
        let mut attempt = 1;
        loop {
            let current = self.store.get(RATE_LIMITS_COLLECTION, &id).await?;
            let existing = current
                .as_ref()
                .map(|doc| doc.decode::<Window>())
                .transpose()?;

            let (next, decision) = window::apply(existing.as_ref(), limit, now);
            let Some(next) = next else {
                return Ok(decision);
            };

            let mut tx = Transaction::new();
            tx.expect(
                RATE_LIMITS_COLLECTION,
                &id,
                Precondition::from_read(current.map(|d| d.version)),
            )
            .set(RATE_LIMITS_COLLECTION, &id, serde_json::to_value(next)?);

            match self.store.commit(tx).await {
                Ok(()) => return Ok(decision),
                Err(StoreError::Conflict { .. }) if attempt < self.max_attempts => {
                    tracing::debug!(key = %id, attempt, "Rate limit counter raced, recounting");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
