//! Error types for timeline generation and sequence lifecycle.

use serde::{Deserialize, Serialize};

/// Errors raised by generation, validation and the sequence store.
///
/// Transport operations never produce these; they clamp instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// Requested duration lies outside the configured bounds
    #[error("duration {duration_ms}ms is out of range [{min_ms}, {max_ms}]")]
    DurationOutOfRange {
        duration_ms: f64,
        min_ms: f64,
        max_ms: f64,
    },

    /// A settings field failed validation
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: String, reason: String },

    /// A timestamp was negative or not finite
    #[error("invalid timestamp for `{field}`: {value}")]
    InvalidTimestamp { field: String, value: f64 },

    /// Diagram content cannot be used for generation
    #[error("malformed diagram: {reason}")]
    MalformedDiagram { reason: String },

    /// The parent play has no diagram
    #[error("play not found: {play_id}")]
    PlayNotFound { play_id: String },

    /// Sequence id is unknown to the store
    #[error("sequence not found: {id}")]
    SequenceNotFound { id: String },

    /// Storage backend failure
    #[error("storage error: {reason}")]
    Storage { reason: String },

    /// Serialization error
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

impl AnimationError {
    pub fn invalid_setting(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDiagram {
            reason: reason.into(),
        }
    }

    /// True for errors the caller fixes by correcting its input.
    #[inline]
    pub fn is_validation(&self) -> bool {
        self.category() == "validation"
    }

    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::DurationOutOfRange { .. }
            | Self::InvalidSetting { .. }
            | Self::InvalidTimestamp { .. }
            | Self::MalformedDiagram { .. }
            | Self::PlayNotFound { .. } => "validation",
            Self::SequenceNotFound { .. } => "not_found",
            Self::Storage { .. } => "storage",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
