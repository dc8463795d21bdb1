//! Activity model errors.

use hf_core::HfError;
use thiserror::Error;

pub type ActivityResult<T> = Result<T, ActivityError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActivityError {
    /// Bad dimensions or conditions outside what any model accepts.
    #[error("Activity model configuration error: {what}")]
    Configuration { what: String },

    /// Conditions outside the envelope of a correlation.
    #[error("{what} out of valid range: {value}")]
    Range { what: &'static str, value: f64 },

    /// Missing or unreadable SIT coefficient table.
    #[error("SIT data error: {message}")]
    SitData { message: String },
}

impl From<HfError> for ActivityError {
    fn from(err: HfError) -> Self {
        ActivityError::Configuration {
            what: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ActivityError::Range {
            what: "temperature (°C)",
            value: 1200.0,
        };
        assert!(err.to_string().contains("1200"));

        let err: ActivityError = HfError::LengthMismatch {
            what: "charges",
            expected: 3,
            actual: 2,
        }
        .into();
        assert!(matches!(err, ActivityError::Configuration { .. }));
    }
}
