//! # Event Sources
//!
//! Non-blocking sources of start/stop toggles for the main loop. Both
//! implement `comms_if::event::EventSource`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod script;
mod stdin;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use comms_if::event::{EventOrigin, EventSource, ToggleEvent};
pub use script::ScriptEventSource;
pub use stdin::StdinEventSource;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    #[error("Could not load the toggle script: {0}")]
    ScriptError(util::script_interpreter::ScriptError),

    #[error("Could not start the console reader thread: {0}")]
    ReaderSpawnError(std::io::Error),
}
