//! Validation errors raised by engine commands.
//!
//! None of these are fatal: the engine logs them, reports them through
//! [`crate::EngineEvent::Rejected`] and leaves its state untouched.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ExpressionError {
    /// Emotion name outside the closed emotion set.
    #[error("invalid emotion: {0:?}")]
    InvalidEmotion(String),

    /// Weather mode name that no mode or alias matches.
    #[error("invalid weather mode: {0:?}")]
    InvalidWeatherMode(String),
}

pub type Result<T> = std::result::Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_offending_name() {
        let err = ExpressionError::InvalidEmotion("cheerful".into());
        assert_eq!(err.to_string(), "invalid emotion: \"cheerful\"");
        let err = ExpressionError::InvalidWeatherMode("hail".into());
        assert_eq!(err.to_string(), "invalid weather mode: \"hail\"");
    }

    #[test]
    fn errors_round_trip_through_json() {
        let err = ExpressionError::InvalidEmotion("x".into());
        let json = serde_json::to_string(&err).unwrap();
        let back: ExpressionError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
