//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable holding the root directory of the software.
pub const SW_ROOT_ENV_VAR: &str = "EXO_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable ({}) is not set", SW_ROOT_ENV_VAR)]
    SwRootNotSet,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software, which contains the `params` and `sessions`
/// directories.
pub fn get_exo_sw_root() -> Result<PathBuf, HostError> {
    match env::var_os(SW_ROOT_ENV_VAR) {
        Some(p) => Ok(PathBuf::from(p)),
        None => Err(HostError::SwRootNotSet),
    }
}
