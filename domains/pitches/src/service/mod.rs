//! Slot allocation service

pub mod allocator;

pub use allocator::{SeedPlan, SlotAllocator};
