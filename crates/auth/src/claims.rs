//! JWT claims types

use serde::{Deserialize, Serialize};

/// Role claim value granting administrative capability
pub const ADMIN_ROLE: &str = "admin";

/// Claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// `admin` for organizers, anything else for participants
    #[serde(default)]
    pub role: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl IdentityClaims {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}
