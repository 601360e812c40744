//! JWT validation and token extraction helpers

use axum::http::HeaderValue;
use hackhub_common::Actor;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::claims::IdentityClaims;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Validate a bearer token issued by the identity provider
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<IdentityClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);

    if let Some(aud) = &config.audience {
        validation.set_audience(&[aud]);
    } else {
        validation.validate_aud = false;
    }

    if let Some(iss) = &config.issuer {
        validation.set_issuer(&[iss]);
    }

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_ref());

    let token_data = decode::<IdentityClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        AuthError::InvalidToken
    })?;

    Ok(token_data.claims)
}

/// Sign claims with the shared secret; used by local tooling and tests
pub fn sign_token(claims: &IdentityClaims, config: &AuthConfig) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_ref());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key).map_err(|e| {
        tracing::error!(error = %e, "JWT signing failed");
        AuthError::TokenSigning
    })
}

/// Turn validated claims into the caller identity the core consumes
pub(crate) fn actor_from_claims(claims: &IdentityClaims) -> Result<Actor, AuthError> {
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;
    let email = claims.email.clone().unwrap_or_default();
    let name = claims.name.clone().unwrap_or_else(|| email.clone());

    let actor = Actor::new(id, name, email);
    Ok(if claims.is_admin() { actor.admin() } else { actor })
}

/// Extract bearer token from Authorization header
pub(crate) fn extract_bearer_token(header: &HeaderValue) -> Result<String, AuthError> {
    let header_str = header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorizationFormat)?;

    if let Some(token) = header_str.strip_prefix("Bearer ") {
        Ok(token.to_string())
    } else {
        Err(AuthError::InvalidAuthorizationFormat)
    }
}
