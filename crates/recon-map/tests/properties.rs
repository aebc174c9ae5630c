// Property-based tests for similarity measures, assignment and learning.

use std::collections::BTreeSet;

use proptest::prelude::*;
use recon_map::{assign, learn_mappings, similarity};
use recon_model::{ConfirmedMatch, Dataset, MatchCandidate, ReconConfig, Side};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn arb_text() -> impl Strategy<Value = String> {
    r"[a-zA-Z0-9 \-ぁ-ゟァ-ヿ]{0,16}"
}

fn arb_candidates() -> impl Strategy<Value = Vec<MatchCandidate>> {
    prop::collection::vec((0usize..6, 0usize..6, 0.0f64..1.2), 0..24).prop_map(|raw| {
        raw.into_iter()
            .map(|(index_a, index_b, score)| MatchCandidate {
                index_a,
                index_b,
                score,
                evidence: Vec::new(),
            })
            .collect()
    })
}

fn arb_column() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop_oneof![Just(String::new()), r"[a-c]{1,2}"], 6)
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn toolkit_measures_are_symmetric(a in arb_text(), b in arb_text()) {
        let forward = similarity(&a, &b);
        let backward = similarity(&b, &a);
        prop_assert!((forward.exact - backward.exact).abs() < 1e-12);
        prop_assert!((forward.fuzzy - backward.fuzzy).abs() < 1e-12);
        prop_assert!((forward.partial - backward.partial).abs() < 1e-12);
        prop_assert!((forward.jaccard - backward.jaccard).abs() < 1e-12);
        prop_assert!((forward.composite - backward.composite).abs() < 1e-12);
    }

    #[test]
    fn toolkit_measures_are_bounded(a in arb_text(), b in arb_text()) {
        let scores = similarity(&a, &b);
        for value in [scores.exact, scores.fuzzy, scores.partial, scores.jaccard, scores.composite] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn assignment_is_one_to_one(candidates in arb_candidates()) {
        let confirmed = assign(candidates.clone());
        let used_a: BTreeSet<usize> = confirmed.iter().map(|m| m.index_a).collect();
        let used_b: BTreeSet<usize> = confirmed.iter().map(|m| m.index_b).collect();
        prop_assert_eq!(used_a.len(), confirmed.len());
        prop_assert_eq!(used_b.len(), confirmed.len());
        for window in confirmed.windows(2) {
            prop_assert!(window[0].score >= window[1].score);
        }
        for m in &confirmed {
            prop_assert!(candidates.iter().any(|c| c.index_a == m.index_a && c.index_b == m.index_b));
        }
    }

    #[test]
    fn mapping_confidence_is_bounded(
        left in arb_column(),
        right in arb_column(),
        extra in arb_column(),
    ) {
        let rows_a: Vec<Vec<String>> = left.iter().zip(&extra).map(|(x, y)| vec![x.clone(), y.clone()]).collect();
        let rows_b: Vec<Vec<String>> = right.iter().map(|x| vec![x.clone()]).collect();
        let a = Dataset::from_rows(Side::A, vec!["left".into(), "extra".into()], &rows_a).unwrap();
        let b = Dataset::from_rows(Side::B, vec!["right".into()], &rows_b).unwrap();
        let matches: Vec<ConfirmedMatch> = (0..6)
            .map(|index| ConfirmedMatch { index_a: index, index_b: index, score: 1.0, evidence: Vec::new() })
            .collect();

        let mappings = learn_mappings(&matches, &a, &b, &ReconConfig::default());
        for mapping in &mappings {
            prop_assert!((0.0..=1.0).contains(&mapping.confidence));
            prop_assert!(mapping.total_comparisons > 0);
            prop_assert!(mapping.sample_count <= mapping.total_comparisons);
        }
        for window in mappings.windows(2) {
            prop_assert!(window[0].confidence >= window[1].confidence);
        }
    }
}
