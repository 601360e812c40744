//! Repository implementations for the Pitches domain

pub mod slots;

pub use slots::{create_slot_tx, write_slot_tx, SlotRepository, PITCH_SLOTS};
