//! HTTP handlers for the Teams domain

pub mod join_requests;
pub mod teams;
