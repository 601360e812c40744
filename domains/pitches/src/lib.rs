//! Pitches domain: pitch slots and their allocation to shortlisted teams

pub mod api;
pub mod domain;
pub mod repository;
pub mod service;

pub use domain::entities::PitchSlot;
pub use domain::state::{SlotEvent, SlotStateMachine, SlotStatus, StateError};
pub use repository::SlotRepository;
pub use service::{SeedPlan, SlotAllocator};

pub use api::routes;
pub use api::PitchesState;
