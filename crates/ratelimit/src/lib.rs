//! Per-actor fixed-window rate limiting
//!
//! Counters are keyed by (actor, action). Each action kind has its own
//! limit from `RateLimitPolicy`, and the limiter's behaviour when the
//! counter store is unreachable is an explicit `FailureMode`.

pub mod limiter;
pub mod policy;
pub mod store;
pub mod window;

pub use limiter::RateLimiter;
pub use policy::{ActionKind, FailureMode, RateLimit, RateLimitPolicy};
pub use store::{CounterStore, DocumentCounterStore, MemoryCounterStore, WindowKey};
pub use window::{RateLimitDecision, Window};
