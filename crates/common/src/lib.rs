//! Shared utilities, configuration, and error handling for Hackhub
//!
//! This crate provides common functionality used across the Hackhub crates:
//! - Configuration management following 12-factor principles
//! - The application error type and the storage error type
//! - Clock and caller identity abstractions
//! - Axum extractors

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod identity;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::{retry_on_contention, StoreError};
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use identity::Actor;
