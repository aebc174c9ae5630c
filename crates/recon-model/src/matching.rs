//! Record-level match candidates and confirmed matches.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::semantic::SemanticType;

/// How two cell values were judged similar by the brute-force matcher.
///
/// Variants are listed in precedence order: when several measures apply the
/// first one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchClass {
    Exact,
    Numeric,
    Normalized,
    Substring,
    Word,
    Fuzzy,
    Weak,
}

impl MatchClass {
    /// Weight applied to a comparison's similarity when scoring a record pair.
    pub fn weight(self) -> f64 {
        match self {
            Self::Exact => 1.0,
            Self::Numeric => 0.95,
            Self::Normalized => 0.9,
            Self::Word => 0.85,
            Self::Substring => 0.8,
            Self::Fuzzy => 0.7,
            Self::Weak => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Numeric => "numeric",
            Self::Normalized => "normalized",
            Self::Substring => "substring",
            Self::Word => "word",
            Self::Fuzzy => "fuzzy",
            Self::Weak => "weak",
        }
    }
}

impl fmt::Display for MatchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of agreement a piece of evidence records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EvidenceKind {
    /// Key-field equality on a classified column.
    Field(SemanticType),
    /// Brute-force comparison outcome.
    Class(MatchClass),
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(semantic) => write!(f, "{semantic}"),
            Self::Class(class) => write!(f, "{class}"),
        }
    }
}

/// One column-pair agreement supporting a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvidence {
    pub column_a: String,
    pub column_b: String,
    pub kind: EvidenceKind,
    /// The normalized value that matched (side A's value for brute-force evidence).
    pub value: String,
    /// Similarity of the two values, 1.0 for key-field equality.
    pub similarity: f64,
}

/// A proposed correspondence between one record of A and one record of B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub index_a: usize,
    pub index_b: usize,
    pub score: f64,
    pub evidence: Vec<MatchEvidence>,
}

/// A candidate accepted by one-to-one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedMatch {
    pub index_a: usize,
    pub index_b: usize,
    pub score: f64,
    pub evidence: Vec<MatchEvidence>,
}

impl From<MatchCandidate> for ConfirmedMatch {
    fn from(candidate: MatchCandidate) -> Self {
        Self {
            index_a: candidate.index_a,
            index_b: candidate.index_b,
            score: candidate.score,
            evidence: candidate.evidence,
        }
    }
}
