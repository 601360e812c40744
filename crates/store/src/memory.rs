//! In-memory document store
//!
//! All collections live behind one lock, so a transaction's precondition
//! checks and writes are applied without any other operation in between.
//! Every async entry point yields to the scheduler first so concurrent
//! callers interleave the way they would against a remote database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::feed::{ChangeEvent, ChangeKind, Subscription};
use crate::transaction::{Transaction, Write};
use crate::{Document, DocumentStore, Fields, Query, StoreError};

const CHANGE_FEED_CAPACITY: usize = 1024;

type Collections = HashMap<String, HashMap<String, Document>>;

#[derive(Default)]
struct State {
    collections: Collections,
    /// Store-wide write sequence; a recreated document never reuses a version
    sequence: u64,
}

impl State {
    fn current(&self, collection: &str, id: &str) -> Option<&Document> {
        self.collections.get(collection).and_then(|c| c.get(id))
    }

    fn next_version(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

struct Inner {
    state: Mutex<State>,
    changes: broadcast::Sender<ChangeEvent>,
    available: AtomicBool,
    failures_pending: AtomicU32,
}

/// In-memory `DocumentStore` backend
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                changes,
                available: AtomicBool::new(true),
                failures_pending: AtomicU32::new(0),
            }),
        }
    }

    /// Simulate the backend going offline (or coming back)
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Fail the next `count` operations with `StoreError::Unavailable`
    pub fn fail_next(&self, count: u32) {
        self.inner.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Number of documents currently stored in a collection
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let state = self.lock()?;
        Ok(state.collections.get(collection).map_or(0, HashMap::len))
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.inner
            .state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    async fn enter(&self) -> Result<(), StoreError> {
        tokio::task::yield_now().await;

        if !self.inner.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }

        let injected = self
            .inner
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }

    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No receivers is not an error
            let _ = self.inner.changes.send(event);
        }
    }
}

fn conflict(collection: &str, id: &str) -> StoreError {
    StoreError::Conflict {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn merge(data: &mut Value, fields: Fields) -> Result<(), StoreError> {
    match data {
        Value::Object(map) => {
            map.extend(fields);
            Ok(())
        }
        _ => Err(StoreError::InvalidData(
            "cannot merge fields into a non-object document".to_string(),
        )),
    }
}

/// Apply one write to the staged view of the documents a transaction touches
fn stage_write(
    staged: &mut HashMap<(String, String), Option<Document>>,
    state: &mut State,
    write: Write,
) -> Result<ChangeEvent, StoreError> {
    let (collection, id) = {
        let (c, i) = write.target();
        (c.to_string(), i.to_string())
    };
    let key = (collection.clone(), id.clone());
    let existing = match staged.get(&key) {
        Some(doc) => doc.clone(),
        None => state.current(&collection, &id).cloned(),
    };

    let (kind, after) = match write {
        Write::Create { data, .. } => {
            if existing.is_some() {
                return Err(conflict(&collection, &id));
            }
            (ChangeKind::Created, Some(data))
        }
        Write::Set { data, .. } => {
            let kind = if existing.is_some() {
                ChangeKind::Updated
            } else {
                ChangeKind::Created
            };
            (kind, Some(data))
        }
        Write::Update { fields, .. } => {
            let mut data = existing
                .map(|d| d.data)
                .ok_or_else(|| conflict(&collection, &id))?;
            merge(&mut data, fields)?;
            (ChangeKind::Updated, Some(data))
        }
        Write::Delete { .. } => (ChangeKind::Deleted, None),
    };

    let document = after.map(|data| Document {
        id: id.clone(),
        version: state.next_version(),
        data,
    });
    staged.insert(key, document.clone());

    Ok(ChangeEvent {
        collection,
        id,
        kind,
        document,
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.enter().await?;
        let state = self.lock()?;
        Ok(state.current(collection, id).cloned())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.enter().await?;
        let state = self.lock()?;
        let documents = state
            .collections
            .get(collection)
            .map(|c| c.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(query.apply(documents))
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        self.enter().await?;
        let document = {
            let mut state = self.lock()?;
            if state.current(collection, id).is_some() {
                return Err(StoreError::AlreadyExists);
            }
            let document = Document {
                id: id.to_string(),
                version: state.next_version(),
                data,
            };
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), document.clone());
            document
        };

        self.publish(vec![ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: ChangeKind::Created,
            document: Some(document.clone()),
        }]);
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        self.enter().await?;
        let document = {
            let mut state = self.lock()?;
            let mut data = state
                .current(collection, id)
                .map(|d| d.data.clone())
                .ok_or(StoreError::NotFound)?;
            merge(&mut data, fields)?;
            let document = Document {
                id: id.to_string(),
                version: state.next_version(),
                data,
            };
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), document.clone());
            document
        };

        self.publish(vec![ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: ChangeKind::Updated,
            document: Some(document.clone()),
        }]);
        Ok(document)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.enter().await?;
        let removed = {
            let mut state = self.lock()?;
            state
                .collections
                .get_mut(collection)
                .and_then(|c| c.remove(id))
                .is_some()
        };

        if removed {
            self.publish(vec![ChangeEvent {
                collection: collection.to_string(),
                id: id.to_string(),
                kind: ChangeKind::Deleted,
                document: None,
            }]);
        }
        Ok(())
    }

    async fn commit(&self, transaction: Transaction) -> Result<(), StoreError> {
        self.enter().await?;
        let events = {
            let mut state = self.lock()?;

            for check in &transaction.checks {
                let current = state
                    .current(&check.collection, &check.id)
                    .map(|d| d.version);
                if !check.precondition.holds(current) {
                    tracing::debug!(
                        collection = %check.collection,
                        id = %check.id,
                        expected = ?check.precondition,
                        actual = ?current,
                        "Transaction precondition failed"
                    );
                    return Err(conflict(&check.collection, &check.id));
                }
            }

            // Stage every write before touching stored state so a failing
            // write leaves nothing applied.
            let sequence_before = state.sequence;
            let mut staged = HashMap::new();
            let mut events = Vec::with_capacity(transaction.writes.len());
            for write in transaction.writes {
                match stage_write(&mut staged, &mut state, write) {
                    Ok(event) => events.push(event),
                    Err(err) => {
                        state.sequence = sequence_before;
                        return Err(err);
                    }
                }
            }

            for ((collection, id), document) in staged {
                let docs = state.collections.entry(collection).or_default();
                match document {
                    Some(document) => {
                        docs.insert(id, document);
                    }
                    None => {
                        docs.remove(&id);
                    }
                }
            }
            events
        };

        self.publish(events);
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        Subscription::new(collection, self.inner.changes.subscribe())
    }
}
