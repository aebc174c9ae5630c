//! Inferred column-to-column mappings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reliability bucket of a field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Exact agreement above 80%.
    High,
    /// Exact agreement of at least 50%.
    Medium,
    /// Exact agreement below 50% (only with a lowered minimum confidence).
    Low,
    /// Either column is an identifier; agreement is informational.
    IdField,
    /// Inferred from value co-occurrence rather than equality.
    Cooccurrence,
}

impl QualityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::IdField => "id_field",
            Self::Cooccurrence => "cooccurrence",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pair of raw values observed together in a confirmed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePair {
    pub value_a: String,
    pub value_b: String,
}

/// A column of A inferred to correspond to a column of B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub column_a: String,
    pub column_b: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Number of agreeing value pairs (exact pass) or observed pairs (co-occurrence).
    pub sample_count: usize,
    /// Number of value pairs where both sides were non-empty.
    pub total_comparisons: usize,
    pub quality_tier: QualityTier,
    pub is_identifier_field: bool,
    /// Mutual information in bits, set for co-occurrence mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutual_information: Option<f64>,
    /// Distinct (a, b) value pairs over observed pairs, set for co-occurrence mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_diversity_ratio: Option<f64>,
    /// Up to three agreeing value pairs for display.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<ValuePair>,
}

impl FieldMapping {
    /// Key identifying the column pair.
    pub fn key(&self) -> (&str, &str) {
        (&self.column_a, &self.column_b)
    }
}
