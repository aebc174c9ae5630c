//! End-to-end reconciliation runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use recon_map::{
    FieldPair, InconclusiveReason, Outcome, PairScore, PairScorer, ReconEngine, Recommendation,
};
use recon_model::{
    Dataset, EvidenceKind, MatchClass, MatchStrategyKind, QualityTier, ReconConfig, ReconError,
    Record, SemanticType, Side,
};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn dataset(side: Side, headers: &[&str], rows: &[&[&str]]) -> Dataset {
    let rows: Vec<Vec<String>> = rows.iter().map(|row| strings(row)).collect();
    Dataset::from_rows(side, strings(headers), &rows).expect("valid dataset")
}

fn catalog_pair() -> (Dataset, Dataset) {
    let a = dataset(
        Side::A,
        &["name", "price"],
        &[
            &["Fire Dragon", "1200"],
            &["Water Turtle", "800"],
            &["Thunder Bird", "1500"],
        ],
    );
    let b = dataset(
        Side::B,
        &["title", "price"],
        &[
            &["Thunder Bird", "¥1,500"],
            &["fire dragon", "1200円"],
            &["Water Turtle", "800"],
        ],
    );
    (a, b)
}

fn pairs(result: &recon_map::ReconResult) -> BTreeSet<(usize, usize)> {
    result
        .matches
        .iter()
        .map(|m| (m.index_a, m.index_b))
        .collect()
}

#[test]
fn key_field_match_ignores_mismatched_identifiers() {
    let a = dataset(Side::A, &["name", "serial"], &[&["Fire Dragon", "PK001"]]);
    let b = dataset(Side::B, &["カード名", "型番"], &[&["fire dragon", "DIFFERENT"]]);

    let engine = ReconEngine::new(ReconConfig::default()).expect("engine");
    let result = engine.run(&a, &b);

    assert_eq!(result.outcome, Outcome::Matched);
    assert_eq!(result.strategy, MatchStrategyKind::KeyField);
    assert_eq!(result.matches.len(), 1);
    let confirmed = &result.matches[0];
    assert_eq!((confirmed.index_a, confirmed.index_b), (0, 0));
    assert!(confirmed.score >= 1.0);
    assert_eq!(
        confirmed.evidence[0].kind,
        EvidenceKind::Field(SemanticType::Name)
    );

    let mapping = &result.mappings[0];
    assert_eq!(mapping.key(), ("name", "カード名"));
    assert_eq!(mapping.quality_tier, QualityTier::High);
    assert!(!result.mappings.iter().any(|m| m.key() == ("serial", "型番")));
}

#[test]
fn identifier_like_name_columns_do_not_match_records() {
    let a = dataset(
        Side::A,
        &["product_code", "title"],
        &[&["PK001", "Fire Dragon"]],
    );
    let b = dataset(
        Side::B,
        &["product_code", "名前"],
        &[&["PK001", "Water Turtle"]],
    );

    let result = ReconEngine::new(ReconConfig::default())
        .expect("engine")
        .run(&a, &b);

    assert!(result.matches.is_empty());
    assert_eq!(
        result.outcome,
        Outcome::Inconclusive {
            reason: InconclusiveReason::NoConfirmedMatches
        }
    );
}

#[test]
fn identifier_only_name_column_counts_as_missing() {
    let a = dataset(Side::A, &["product_code"], &[&["PK001"]]);
    let b = dataset(Side::B, &["title"], &[&["PK001"]]);

    let result = ReconEngine::new(ReconConfig::default())
        .expect("engine")
        .run(&a, &b);

    assert_eq!(
        result.outcome,
        Outcome::Inconclusive {
            reason: InconclusiveReason::NoNameColumns { side: Side::A }
        }
    );
}

#[test]
fn date_agreement_adds_bonus() {
    let a = dataset(
        Side::A,
        &["name", "release date"],
        &[&["Fire Dragon", "2024/3/1"]],
    );
    let b = dataset(
        Side::B,
        &["商品名", "発売日"],
        &[&["FIRE DRAGON", "2024-03-01"]],
    );
    let result = ReconEngine::new(ReconConfig::default())
        .expect("engine")
        .run(&a, &b);
    assert!((result.matches[0].score - 1.1).abs() < 1e-9);
    assert_eq!(result.matches[0].evidence.len(), 2);
}

#[test]
fn missing_name_columns_is_inconclusive() {
    let a = dataset(Side::A, &["code", "price"], &[&["X100", "1200"]]);
    let b = dataset(Side::B, &["sku", "cost"], &[&["X100", "1200"]]);

    let result = ReconEngine::new(ReconConfig::default())
        .expect("engine")
        .run(&a, &b);

    assert_eq!(
        result.outcome,
        Outcome::Inconclusive {
            reason: InconclusiveReason::NoNameColumns { side: Side::A }
        }
    );
    assert!(result.matches.is_empty());
    assert!(result.mappings.is_empty());
    assert_eq!(result.candidate_count, 0);
}

#[test]
fn inconclusive_key_field_run_falls_back_to_brute_force() {
    let a = dataset(Side::A, &["code", "price"], &[&["X100", "1200"]]);
    let b = dataset(Side::B, &["sku", "cost"], &[&["X100", "1200"]]);

    let config = ReconConfig::default().with_fallback_to_brute_force(true);
    let result = ReconEngine::new(config).expect("engine").run(&a, &b);

    assert!(result.fell_back);
    assert_eq!(result.strategy, MatchStrategyKind::BruteForce);
    assert_eq!(result.outcome, Outcome::Matched);
    assert_eq!(pairs(&result), BTreeSet::from([(0, 0)]));
}

#[test]
fn brute_force_pairs_reordered_catalogs() {
    let (a, b) = catalog_pair();
    let engine = ReconEngine::new(ReconConfig::brute_force()).expect("engine");
    let result = engine.run(&a, &b);

    assert_eq!(result.strategy, MatchStrategyKind::BruteForce);
    assert_eq!(pairs(&result), BTreeSet::from([(0, 1), (1, 2), (2, 0)]));

    let top = &result.mappings[0];
    assert_eq!(top.key(), ("name", "title"));
    assert_eq!(top.quality_tier, QualityTier::High);
    assert!((top.confidence - 1.0).abs() < 1e-9);

    let summary = result.summarize(&a, &b);
    assert_eq!(summary.match_quality.total, 3);
    assert!(
        summary
            .recommendations
            .contains(&Recommendation::GatherMoreData)
    );
}

#[test]
fn matches_are_one_to_one() {
    let a = dataset(
        Side::A,
        &["name"],
        &[&["Fire Dragon"], &["Fire Dragon"], &["Ice Queen"]],
    );
    let b = dataset(
        Side::B,
        &["title"],
        &[&["fire dragon"], &["Ice Queen"], &["Ice Queen"]],
    );
    let result = ReconEngine::new(ReconConfig::default())
        .expect("engine")
        .run(&a, &b);

    let used_a: BTreeSet<usize> = result.matches.iter().map(|m| m.index_a).collect();
    let used_b: BTreeSet<usize> = result.matches.iter().map(|m| m.index_b).collect();
    assert_eq!(used_a.len(), result.matches.len());
    assert_eq!(used_b.len(), result.matches.len());
    assert_eq!(result.matches.len(), 2);
}

#[test]
fn empty_datasets_yield_empty_results() {
    let a = dataset(Side::A, &["name"], &[]);
    let b = dataset(Side::B, &["title"], &[]);
    let result = ReconEngine::new(ReconConfig::default())
        .expect("engine")
        .run(&a, &b);
    assert!(result.matches.is_empty());
    assert!(result.mappings.is_empty());
    assert_eq!(
        result.outcome,
        Outcome::Inconclusive {
            reason: InconclusiveReason::NoConfirmedMatches
        }
    );
}

#[test]
fn invalid_input_is_rejected_before_matching() {
    let engine = ReconEngine::new(ReconConfig::default()).expect("engine");
    let err = engine
        .reconcile(
            Vec::new(),
            Vec::new(),
            strings(&["title"]),
            Vec::new(),
        )
        .unwrap_err();
    assert!(matches!(err, ReconError::EmptyHeaders { side: Side::A }));

    let misaligned = Record::new(vec![("other".to_string(), "x".to_string())]);
    let err = engine
        .reconcile(
            strings(&["name"]),
            vec![misaligned],
            strings(&["title"]),
            Vec::new(),
        )
        .unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn invalid_config_is_rejected() {
    let config = ReconConfig::default().with_brute_force_row_threshold(1.5);
    assert!(ReconEngine::new(config).is_err());
}

struct FailingScorer;

impl PairScorer for FailingScorer {
    fn score_field_pairs(
        &self,
        _pairs: &[FieldPair<'_>],
    ) -> Result<BTreeMap<usize, PairScore>, ReconError> {
        Err(ReconError::ExternalScorerUnavailable {
            message: "connection refused".to_string(),
        })
    }
}

#[test]
fn scorer_failure_falls_back_to_library_scoring() {
    let (a, b) = catalog_pair();
    let baseline = ReconEngine::new(ReconConfig::brute_force())
        .expect("engine")
        .run(&a, &b);
    let with_scorer = ReconEngine::new(ReconConfig::brute_force())
        .expect("engine")
        .with_scorer(Arc::new(FailingScorer))
        .run(&a, &b);

    assert_eq!(pairs(&with_scorer), pairs(&baseline));
    assert_eq!(with_scorer.scorer_fallbacks, 9);
    assert_eq!(baseline.scorer_fallbacks, 0);
}

/// Answers every pair, but without conviction.
struct UnsureScorer;

impl PairScorer for UnsureScorer {
    fn score_field_pairs(
        &self,
        pairs: &[FieldPair<'_>],
    ) -> Result<BTreeMap<usize, PairScore>, ReconError> {
        Ok((0..pairs.len())
            .map(|index| {
                (
                    index,
                    PairScore {
                        similarity: 0.0,
                        match_class: MatchClass::Weak,
                        confidence: 0.1,
                    },
                )
            })
            .collect())
    }
}

#[test]
fn low_confidence_verdicts_defer_to_library_scoring() {
    let a = dataset(Side::A, &["name", "price"], &[&["Fire Dragon", "1200"]]);
    let b = dataset(Side::B, &["title", "price"], &[&["Fire Dragon", "1200"]]);
    let baseline = ReconEngine::new(ReconConfig::brute_force())
        .expect("engine")
        .run(&a, &b);
    let with_scorer = ReconEngine::new(ReconConfig::brute_force())
        .expect("engine")
        .with_scorer(Arc::new(UnsureScorer))
        .run(&a, &b);

    assert_eq!(baseline.matches.len(), 1);
    assert_eq!(pairs(&with_scorer), pairs(&baseline));
    assert!((with_scorer.matches[0].score - baseline.matches[0].score).abs() < 1e-9);
    assert_eq!(with_scorer.scorer_fallbacks, 0);
}
