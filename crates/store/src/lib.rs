//! Hackhub document store collaborator
//!
//! The coordination core treats persistence as a managed document database:
//! - single-document reads, filtered/ordered queries and plain writes
//! - atomic multi-document transactions guarded by per-document preconditions
//! - a read-side change feed for UI reactivity
//!
//! `MemoryStore` is the in-process backend used by the local server and tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use hackhub_common::StoreError;

pub mod feed;
pub mod memory;
pub mod query;
pub mod retry;
pub mod transaction;

pub use feed::{ChangeEvent, ChangeKind, Subscription};
pub use memory::MemoryStore;
pub use query::{Filter, OrderBy, Query};
pub use retry::{with_read_retry, ReadRetryPolicy};
pub use transaction::{Precondition, Transaction, Write};

/// Partial document used for shallow field merges
pub type Fields = Map<String, Value>;

/// A stored document and its write version
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    /// Bumped on every write; transactions compare against it
    pub version: u64,
    pub data: Value,
}

impl Document {
    /// Deserialize the document body into a typed entity
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    pub fn decode_versioned<T: DeserializeOwned>(&self) -> Result<Versioned<T>, StoreError> {
        Ok(Versioned {
            value: self.decode()?,
            version: self.version,
        })
    }
}

/// A typed entity together with the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    /// Precondition asserting the document is unchanged since this read
    pub fn unchanged(&self) -> Precondition {
        Precondition::Version(self.version)
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Document store trait for different backends
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Query a collection by field equality, with optional ordering and limit
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Create a document; fails with `AlreadyExists` if the id is taken
    async fn create(&self, collection: &str, id: &str, data: Value)
        -> Result<Document, StoreError>;

    /// Shallow-merge fields into an existing document
    async fn update(&self, collection: &str, id: &str, fields: Fields)
        -> Result<Document, StoreError>;

    /// Delete a document; deleting a missing document succeeds
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Check every precondition and apply every write as one atomic unit.
    ///
    /// Returns `StoreError::Conflict` without applying anything when a
    /// precondition does not hold.
    async fn commit(&self, transaction: Transaction) -> Result<(), StoreError>;

    /// Subscribe to changes in one collection
    fn subscribe(&self, collection: &str) -> Subscription;
}
