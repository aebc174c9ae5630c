//! Pluggable external scorer for brute-force value comparisons.

use std::collections::BTreeMap;

use recon_model::{MatchClass, ReconError};

/// One column-pair comparison submitted to an external scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPair<'a> {
    pub column_a: &'a str,
    pub column_b: &'a str,
    pub value_a: &'a str,
    pub value_b: &'a str,
}

/// An external verdict for one submitted pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub similarity: f64,
    pub match_class: MatchClass,
    /// How sure the scorer is of its own verdict.
    pub confidence: f64,
}

/// Verdicts below this confidence are replaced by library scoring.
pub const MIN_SCORER_CONFIDENCE: f64 = 0.5;

/// A semantic similarity service consulted per record pair.
///
/// The result maps indices into `pairs` to verdicts. Pairs absent from the
/// map, and every pair when the call fails, are scored locally; a scorer can
/// change precision but never whether a run succeeds.
pub trait PairScorer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ReconError::ExternalScorerUnavailable`] when the service
    /// cannot answer.
    fn score_field_pairs(
        &self,
        pairs: &[FieldPair<'_>],
    ) -> Result<BTreeMap<usize, PairScore>, ReconError>;
}
