//! Configuration options for a reconciliation run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ReconError};

/// Which candidate generator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategyKind {
    /// Match on classified name (and date) columns only.
    #[default]
    KeyField,
    /// Compare every column of A with every column of B.
    BruteForce,
}

impl MatchStrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyField => "key_field",
            Self::BruteForce => "brute_force",
        }
    }
}

/// Thresholds and strategy selection for a run.
///
/// Every field has a default, so a TOML file only needs to name the values it
/// overrides:
///
/// ```toml
/// match_strategy = "brute_force"
/// brute_force_row_threshold = 0.7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    pub match_strategy: MatchStrategyKind,

    /// Minimum key-field score for a record pair to become a candidate.
    ///
    /// A name match scores 1.0 and a date match adds 0.1, so the default
    /// requires a name match.
    pub key_field_match_threshold: f64,

    /// Brute-force row scores must exceed this value.
    pub brute_force_row_threshold: f64,

    /// Exact-agreement mappings below this confidence are discarded.
    pub field_mapping_min_confidence: f64,

    /// Co-occurrence mappings must exceed this confidence.
    pub cooccurrence_min_confidence: f64,

    /// Retry with the brute-force strategy when key-field matching is inconclusive.
    pub fallback_to_brute_force: bool,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            match_strategy: MatchStrategyKind::KeyField,
            key_field_match_threshold: 1.0,
            brute_force_row_threshold: 0.6,
            field_mapping_min_confidence: 0.5,
            cooccurrence_min_confidence: 0.3,
            fallback_to_brute_force: false,
        }
    }
}

impl ReconConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for the exhaustive strategy with default thresholds.
    pub fn brute_force() -> Self {
        Self {
            match_strategy: MatchStrategyKind::BruteForce,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: MatchStrategyKind) -> Self {
        self.match_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_key_field_match_threshold(mut self, threshold: f64) -> Self {
        self.key_field_match_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_brute_force_row_threshold(mut self, threshold: f64) -> Self {
        self.brute_force_row_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_field_mapping_min_confidence(mut self, threshold: f64) -> Self {
        self.field_mapping_min_confidence = threshold;
        self
    }

    #[must_use]
    pub fn with_cooccurrence_min_confidence(mut self, threshold: f64) -> Self {
        self.cooccurrence_min_confidence = threshold;
        self
    }

    #[must_use]
    pub fn with_fallback_to_brute_force(mut self, enable: bool) -> Self {
        self.fallback_to_brute_force = enable;
        self
    }

    /// Checks that every threshold is finite and inside its meaningful range.
    ///
    /// # Errors
    ///
    /// Returns [`ReconError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ReconError> {
        check_range(
            "key_field_match_threshold",
            self.key_field_match_threshold,
            0.0,
            1.1,
        )?;
        check_range(
            "brute_force_row_threshold",
            self.brute_force_row_threshold,
            0.0,
            1.0,
        )?;
        check_range(
            "field_mapping_min_confidence",
            self.field_mapping_min_confidence,
            0.0,
            1.0,
        )?;
        check_range(
            "cooccurrence_min_confidence",
            self.cooccurrence_min_confidence,
            0.0,
            1.0,
        )?;
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ReconError> {
    if !value.is_finite() {
        return Err(ReconError::InvalidConfig {
            field,
            value,
            reason: "must be a finite number",
        });
    }
    if value < min || value > max {
        return Err(ReconError::InvalidConfig {
            field,
            value,
            reason: "out of range",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ReconConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.match_strategy, MatchStrategyKind::KeyField);
        assert!((config.key_field_match_threshold - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ReconConfig::from_toml_str(
            "match_strategy = \"brute_force\"\nbrute_force_row_threshold = 0.7\n",
            Path::new("recon.toml"),
        )
        .expect("parse config");
        assert_eq!(config.match_strategy, MatchStrategyKind::BruteForce);
        assert!((config.brute_force_row_threshold - 0.7).abs() < f64::EPSILON);
        assert!((config.cooccurrence_min_confidence - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ReconConfig::from_toml_str("threshold = 0.5\n", Path::new("recon.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = ReconConfig::default()
            .with_field_mapping_min_confidence(1.5)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ReconError::InvalidConfig {
                field: "field_mapping_min_confidence",
                ..
            }
        ));
        assert!(
            ReconConfig::default()
                .with_cooccurrence_min_confidence(f64::NAN)
                .validate()
                .is_err()
        );
    }
}
