//! HTTP handlers for the Pitches domain

pub mod slots;
