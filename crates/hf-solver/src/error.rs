//! Error types for equilibrium solves.

use crate::flags::SolveFlags;
use hf_activity::ActivityError;
use hf_core::HfError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// Malformed request or mismatched model dimensions.
    #[error("Solver configuration error: {what}")]
    Configuration { what: String },

    #[error("Activity model error: {0}")]
    Activity(#[from] ActivityError),

    /// No non-singular set of solids is consistent with the constraints.
    #[error("No consistent solid-phase combination (flags {flags})")]
    Inconsistent { flags: SolveFlags },

    #[error("Solve cancelled")]
    Cancelled,
}

pub type SolveResult<T> = Result<T, SolveError>;

impl From<HfError> for SolveError {
    fn from(err: HfError) -> Self {
        SolveError::Configuration {
            what: err.to_string(),
        }
    }
}

impl From<SolveError> for HfError {
    fn from(e: SolveError) -> Self {
        match e {
            SolveError::Configuration { .. } => HfError::InvalidArg {
                what: "solver configuration",
            },
            SolveError::Activity(_) => HfError::InvalidArg { what: "activity" },
            SolveError::Inconsistent { .. } => HfError::InvalidArg {
                what: "solid phases",
            },
            SolveError::Cancelled => HfError::InvalidArg { what: "cancelled" },
        }
    }
}
