//! Common error types and handling for Hackhub
//!
//! Every outcome the coordination core can report to a caller is a named
//! variant here, so handlers never have to inspect message strings.

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Hackhub application
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Team name is already taken: {0}")]
    NameTaken(String),

    #[error("User already belongs to a team")]
    AlreadyInTeam,

    #[error("Team is full")]
    TeamFull,

    #[error("Invalid team code")]
    InvalidCode,

    #[error("A join request for this team is already pending")]
    RequestAlreadyPending,

    #[error("Rate limit exceeded, retry after {reset_at}")]
    RateLimitExceeded { reset_at: DateTime<Utc> },

    #[error("Pitch slot has already been taken")]
    SlotAlreadyTaken,

    #[error("Team already holds a pitch slot")]
    TeamAlreadyBooked,

    #[error("Team is not shortlisted")]
    NotShortlisted,

    #[error("Could not allocate an invite code, please retry later")]
    GenerationExhausted,

    #[error("Too much concurrent activity on {0}, please retry")]
    Contention(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::Authorization(_) | Error::NotShortlisted => StatusCode::FORBIDDEN,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) | Error::InvalidCode => StatusCode::NOT_FOUND,
            Error::Conflict(_)
            | Error::NameTaken(_)
            | Error::AlreadyInTeam
            | Error::TeamFull
            | Error::RequestAlreadyPending
            | Error::SlotAlreadyTaken
            | Error::TeamAlreadyBooked
            | Error::Contention(_) => StatusCode::CONFLICT,
            Error::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::GenerationExhausted | Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Unexpected(_) | Error::Serialization(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unexpected(_) => "UNEXPECTED_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Authentication(_) => "AUTHENTICATION_ERROR",
            Error::Authorization(_) => "AUTHORIZATION_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::NameTaken(_) => "NAME_TAKEN",
            Error::AlreadyInTeam => "ALREADY_IN_TEAM",
            Error::TeamFull => "TEAM_FULL",
            Error::InvalidCode => "INVALID_CODE",
            Error::RequestAlreadyPending => "REQUEST_ALREADY_PENDING",
            Error::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Error::SlotAlreadyTaken => "SLOT_ALREADY_TAKEN",
            Error::TeamAlreadyBooked => "TEAM_ALREADY_BOOKED",
            Error::NotShortlisted => "NOT_SHORTLISTED",
            Error::GenerationExhausted => "RETRY_LATER",
            Error::Contention(_) => "CONTENTION",
            Error::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Seconds until the caller may retry, for throttling errors
    pub fn retry_after_secs(&self) -> Option<i64> {
        match self {
            Error::RateLimitExceeded { reset_at } => {
                Some((*reset_at - Utc::now()).num_seconds().max(1))
            }
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Log server-side failures with full context
        if status.is_server_error() {
            tracing::error!(error = %self, code = error_code, "Request failed");
        }

        let retry_after = self.retry_after_secs();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}
