//! Candidate generation strategies.

use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use recon_model::{Dataset, MatchCandidate, MatchStrategyKind};

/// Proposes record pairs of A and B that may describe the same entity.
///
/// Implementations are pure: they read both datasets and return candidates
/// in discovery order (row-major over A, then B). Assignment and field
/// mapping do not depend on which strategy produced the candidates.
pub trait MatchStrategy: Send + Sync {
    fn kind(&self) -> MatchStrategyKind;

    fn generate_candidates(&self, a: &Dataset, b: &Dataset) -> Vec<MatchCandidate>;
}

/// Scores every record of A against every record of B on the rayon pool.
///
/// One task per row of A; per-row results are concatenated in row order so
/// the output is identical to a sequential scan.
pub(crate) fn scan_pairs<F>(a: &Dataset, b: &Dataset, score: F) -> Vec<MatchCandidate>
where
    F: Fn(usize, usize) -> Option<MatchCandidate> + Sync,
{
    let rows: Vec<Vec<MatchCandidate>> = (0..a.len())
        .into_par_iter()
        .map(|index_a| {
            (0..b.len())
                .filter_map(|index_b| score(index_a, index_b))
                .collect()
        })
        .collect();
    rows.into_iter().flatten().collect()
}
