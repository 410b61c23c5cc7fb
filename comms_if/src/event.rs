//! # Operator Events
//!
//! The trajectory core only ever consumes one kind of operator input: a toggle between running
//! and stopped. What produced the toggle (a key press, a scripted entry) is carried along for
//! logging only and is never interpreted by the core.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single start/stop toggle request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ToggleEvent {
    /// Time at which the event was received by its source.
    pub received: DateTime<Utc>,

    /// Where the event came from.
    pub origin: EventOrigin,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The origin of a toggle event.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum EventOrigin {
    /// A byte typed on the operator console.
    Console(u8),

    /// An entry of a toggle script, scheduled at the given number of seconds.
    Script(f64),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A non-blocking source of toggle events.
///
/// Implementations must never block in any of these methods, they are polled from the main loop
/// on every iteration.
pub trait EventSource {
    /// Returns true if an event is ready to be consumed.
    fn has_event(&mut self) -> bool;

    /// Consume the next ready event.
    ///
    /// Each event is returned at most once. `None` is returned if no event is ready.
    fn consume_event(&mut self) -> Option<ToggleEvent>;

    /// Returns true once the source will never produce another event and the executable should
    /// shut down.
    fn is_exhausted(&self) -> bool {
        false
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ToggleEvent {
    /// Create a new event received now.
    pub fn now(origin: EventOrigin) -> Self {
        Self {
            received: Utc::now(),
            origin,
        }
    }
}
