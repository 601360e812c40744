//! Atomic multi-document transactions
//!
//! A transaction is a list of preconditions followed by a list of writes.
//! Backends apply all writes or none of them.

use serde_json::Value;

use crate::Fields;

/// Expected state of a document at commit time
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// The document must not exist
    Missing,
    /// The document must exist, any version
    Exists,
    /// The document must exist at exactly this version
    Version(u64),
}

impl Precondition {
    /// Precondition for a document that may or may not have been read
    pub fn from_read(version: Option<u64>) -> Self {
        match version {
            Some(v) => Precondition::Version(v),
            None => Precondition::Missing,
        }
    }

    pub fn holds(&self, current: Option<u64>) -> bool {
        match (self, current) {
            (Precondition::Missing, None) => true,
            (Precondition::Exists, Some(_)) => true,
            (Precondition::Version(expected), Some(actual)) => *expected == actual,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub collection: String,
    pub id: String,
    pub precondition: Precondition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create a new document; conflicts if it already exists
    Create {
        collection: String,
        id: String,
        data: Value,
    },
    /// Create or replace a document
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    /// Shallow-merge fields into an existing document
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    Delete { collection: String, id: String },
}

impl Write {
    pub fn target(&self) -> (&str, &str) {
        match self {
            Write::Create { collection, id, .. }
            | Write::Set { collection, id, .. }
            | Write::Update { collection, id, .. }
            | Write::Delete { collection, id } => (collection, id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub checks: Vec<Check>,
    pub writes: Vec<Write>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a document state at commit time
    pub fn expect(&mut self, collection: &str, id: &str, precondition: Precondition) -> &mut Self {
        self.checks.push(Check {
            collection: collection.to_string(),
            id: id.to_string(),
            precondition,
        });
        self
    }

    pub fn create(&mut self, collection: &str, id: &str, data: Value) -> &mut Self {
        self.writes.push(Write::Create {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        });
        self
    }

    pub fn set(&mut self, collection: &str, id: &str, data: Value) -> &mut Self {
        self.writes.push(Write::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        });
        self
    }

    pub fn update(&mut self, collection: &str, id: &str, fields: Fields) -> &mut Self {
        self.writes.push(Write::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.writes.push(Write::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
