//! API layer for the Pitches domain

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::PitchesState;
pub use routes::routes;
