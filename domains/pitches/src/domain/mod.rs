//! Pitches domain layer: slot entity and its state machine

pub mod entities;
pub mod state;
