//! Error types for reconciliation runs and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::Side;

/// Errors surfaced by the reconciliation engine.
///
/// Inconclusive runs (no name columns, no confirmed matches) are not errors;
/// they produce an empty result with an explanatory outcome instead.
#[derive(Debug, Error)]
pub enum ReconError {
    /// A header sequence was empty.
    #[error("dataset {side} has no columns")]
    EmptyHeaders { side: Side },

    /// The same column name appears twice in a header sequence.
    #[error("dataset {side} has duplicate column '{column}'")]
    DuplicateHeader { side: Side, column: String },

    /// A record's columns do not line up with the dataset headers.
    #[error("record {index} of dataset {side} does not align with its headers at column '{column}'")]
    RecordMisaligned {
        side: Side,
        index: usize,
        column: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration value {field} = {value}: {reason}")]
    InvalidConfig {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The external pair scorer failed. Recovered by falling back to library scoring.
    #[error("external scorer unavailable: {message}")]
    ExternalScorerUnavailable { message: String },
}

impl ReconError {
    /// Returns true for errors caused by malformed input data.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyHeaders { .. } | Self::DuplicateHeader { .. } | Self::RecordMisaligned { .. }
        )
    }
}

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ReconError),
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ReconError::RecordMisaligned {
            side: Side::B,
            index: 3,
            column: "price".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "record 3 of dataset B does not align with its headers at column 'price'"
        );
        assert!(err.is_invalid_input());
    }

    #[test]
    fn scorer_error_is_not_invalid_input() {
        let err = ReconError::ExternalScorerUnavailable {
            message: "timeout".to_string(),
        };
        assert!(!err.is_invalid_input());
    }
}
