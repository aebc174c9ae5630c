//! Greedy one-to-one assignment of candidates.

use std::collections::BTreeSet;

use recon_model::{ConfirmedMatch, MatchCandidate};

/// Promotes candidates to confirmed matches, highest score first.
///
/// The sort is stable, so equal scores keep discovery order. A candidate is
/// accepted only when neither of its records was consumed by an earlier
/// acceptance; no record index of A or B appears in two confirmed matches.
pub fn assign(mut candidates: Vec<MatchCandidate>) -> Vec<ConfirmedMatch> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut consumed_a = BTreeSet::new();
    let mut consumed_b = BTreeSet::new();
    let mut confirmed = Vec::new();

    for candidate in candidates {
        if consumed_a.contains(&candidate.index_a) || consumed_b.contains(&candidate.index_b) {
            continue;
        }
        consumed_a.insert(candidate.index_a);
        consumed_b.insert(candidate.index_b);
        confirmed.push(ConfirmedMatch::from(candidate));
    }

    confirmed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index_a: usize, index_b: usize, score: f64) -> MatchCandidate {
        MatchCandidate {
            index_a,
            index_b,
            score,
            evidence: Vec::new(),
        }
    }

    #[test]
    fn higher_score_claims_shared_records() {
        let confirmed = assign(vec![
            candidate(1, 1, 0.9),
            candidate(1, 2, 0.95),
            candidate(2, 2, 0.85),
        ]);
        let pairs: Vec<(usize, usize)> = confirmed.iter().map(|m| (m.index_a, m.index_b)).collect();
        assert_eq!(pairs, vec![(1, 2)]);
    }

    #[test]
    fn ties_keep_discovery_order() {
        let confirmed = assign(vec![candidate(0, 5, 1.0), candidate(3, 5, 1.0)]);
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].index_a, 0);
    }

    #[test]
    fn empty_input_yields_no_matches() {
        assert!(assign(Vec::new()).is_empty());
    }
}
