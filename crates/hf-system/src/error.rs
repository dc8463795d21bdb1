//! Chemical system errors.

use hf_core::HfError;
use thiserror::Error;

/// Result type for system construction.
pub type SystemResult<T> = Result<T, SystemError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SystemError {
    /// Malformed dimensions, non-finite data, empty reactions.
    #[error("Invalid chemical system: {what}")]
    Configuration { what: String },

    /// A reaction references a name that is not a component.
    #[error("Unknown component '{name}' in reaction of '{species}'")]
    UnknownComponent { species: String, name: String },

    /// Two species normalise to the same name.
    #[error("Duplicate species name '{name}'")]
    Duplicate { name: String },

    #[error(transparent)]
    Core(#[from] HfError),
}

impl From<SystemError> for HfError {
    fn from(err: SystemError) -> Self {
        match err {
            SystemError::Core(inner) => inner,
            SystemError::Configuration { .. } => HfError::InvalidArg {
                what: "chemical system",
            },
            SystemError::UnknownComponent { .. } => HfError::InvalidArg {
                what: "unknown component",
            },
            SystemError::Duplicate { .. } => HfError::InvalidArg {
                what: "duplicate species",
            },
        }
    }
}
