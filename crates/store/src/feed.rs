//! Read-side change feed
//!
//! Subscribers see committed changes for one collection. The feed is lossy
//! under backpressure: a receiver that falls behind skips missed events and
//! should re-query the collection.

use tokio::sync::broadcast;

use crate::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
    /// Document state after the change; `None` for deletions
    pub document: Option<Document>,
}

pub struct Subscription {
    collection: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub(crate) fn new(collection: &str, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
        Self {
            collection: collection.to_string(),
            receiver,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Wait for the next change in the subscribed collection.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.collection == self.collection => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        collection = %self.collection,
                        skipped,
                        "Change feed subscriber lagged, events dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
