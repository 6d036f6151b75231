//! Error definitions for the mapping module

use thiserror::Error;

/// Errors raised while building or editing key mappings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A configuration entry names a button that is not in the catalog
    #[error("Unknown button: {0}")]
    UnknownButton(String),

    /// A configuration entry names a preset that does not exist
    #[error("Unknown preset action: {0}")]
    UnknownPreset(String),

    /// A mapping entry is structurally invalid
    #[error("Invalid mapping for {button}: {reason}")]
    InvalidMapping { button: String, reason: String },
}
