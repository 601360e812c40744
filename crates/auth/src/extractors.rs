//! Axum extractors for authentication
//!
//! Generic over any state `S` where `AuthConfig: FromRef<S>`.
//! This is axum's idiomatic nested-state pattern.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use hackhub_common::Actor;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::jwt::{actor_from_claims, extract_bearer_token, validate_token};

/// Authenticated caller extractor
#[derive(Debug)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = extract_bearer_token(auth_header)?;
        let claims = validate_token(&token, &config)?;
        let actor = actor_from_claims(&claims)?;

        tracing::debug!(actor_id = %actor.id, is_admin = actor.is_admin, "Authenticated request");
        Ok(CurrentActor(actor))
    }
}

/// Administrator extractor.
///
/// Like `CurrentActor` but rejects callers without the admin role with
/// 403 FORBIDDEN. Use this for organizer routes under `/v1/admin`.
#[derive(Debug)]
pub struct AdminActor(pub Actor);

impl<S> FromRequestParts<S> for AdminActor
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let CurrentActor(actor) = CurrentActor::from_request_parts(parts, state).await?;

        if !actor.is_admin {
            return Err(AuthError::AdminRequired);
        }

        Ok(AdminActor(actor))
    }
}
