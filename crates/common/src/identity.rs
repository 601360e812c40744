//! Authenticated caller identity
//!
//! The core never authenticates anyone. It receives an `Actor` that the
//! identity collaborator has already vouched for.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(id: Uuid, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            is_admin: false,
        }
    }

    /// Grant the administrative capability
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Fail with `Authorization` unless this actor is an administrator
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::Authorization(
                "Administrator capability required".to_string(),
            ))
        }
    }
}
