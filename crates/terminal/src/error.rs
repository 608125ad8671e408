//! Terminal session errors

use greenstone_core::GreenstoneError;
use greenstone_scripting::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("Failed to set up terminal commands: {0}")]
    Registry(#[from] RegistryError),
}

impl From<TerminalError> for GreenstoneError {
    fn from(err: TerminalError) -> Self {
        GreenstoneError::Script(err.to_string())
    }
}

/// Result type for terminal operations
pub type Result<T> = std::result::Result<T, TerminalError>;
