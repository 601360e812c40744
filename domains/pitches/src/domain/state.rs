//! Pitch slot state machine
//!
//! ```text
//! open --book--> booked --complete--> completed
//!   ^              |
//!   +---release----+
//! ```
//!
//! `completed` is terminal. Completion is driven by organizers, never by
//! the allocator itself.

use hackhub_common::Error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot {event} a slot that is {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

impl From<StateError> for Error {
    fn from(err: StateError) -> Self {
        Error::Conflict(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[default]
    Open,
    Booked,
    Completed,
}

impl SlotStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [SlotStatus] {
        match self {
            Self::Open => &[Self::Booked],
            Self::Booked => &[Self::Open, Self::Completed],
            Self::Completed => &[],
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Booked => write!(f, "booked"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Events that trigger slot transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotEvent {
    /// A shortlisted team claims the slot
    Book,
    /// An organizer frees a booked slot
    Release,
    /// An organizer marks the pitch as held
    Complete,
}

impl std::fmt::Display for SlotEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Book => write!(f, "book"),
            Self::Release => write!(f, "release"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Slot state machine
pub struct SlotStateMachine;

impl SlotStateMachine {
    pub fn transition(current: SlotStatus, event: SlotEvent) -> Result<SlotStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        match (current, event) {
            (SlotStatus::Open, SlotEvent::Book) => Ok(SlotStatus::Booked),
            (SlotStatus::Booked, SlotEvent::Release) => Ok(SlotStatus::Open),
            (SlotStatus::Booked, SlotEvent::Complete) => Ok(SlotStatus::Completed),
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            }),
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: SlotStatus, event: SlotEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
