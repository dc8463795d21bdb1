//! Scan errors.

use hf_solver::SolveError;
use thiserror::Error;

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Invalid scan configuration: {what}")]
    InvalidConfiguration { what: String },

    /// A failure that stops the whole scan (bad request, model setup).
    #[error("Solve failed at point {index}: {source}")]
    Solve {
        index: usize,
        #[source]
        source: SolveError,
    },

    #[error("Scan cancelled after {completed} points")]
    Cancelled { completed: usize },
}
