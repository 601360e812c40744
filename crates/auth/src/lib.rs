//! Identity adapter for the Hackhub API
//!
//! The identity provider issues HS256 bearer tokens; this crate validates
//! them and turns the claims into an `Actor`. Extractors work with any
//! domain state implementing `FromRef<S>` for `AuthConfig`.

mod claims;
mod config;
mod error;
mod extractors;
mod jwt;

pub use claims::IdentityClaims;
pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{AdminActor, CurrentActor};
pub use jwt::{sign_token, validate_token};
