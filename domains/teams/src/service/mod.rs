//! Coordination services for the Teams domain

pub mod join_requests;
pub mod registry;

pub use join_requests::JoinRequestCoordinator;
pub use registry::TeamRegistry;
