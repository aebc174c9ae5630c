//! Integration tests for the reconcile and classify commands.

use std::fs;
use std::path::PathBuf;

use recon_cli::commands::{resolve_config, run_classify, run_reconcile};
use recon_cli::types::{ConfigOverrides, InputFiles, ReconcileRequest};
use recon_map::Outcome;
use recon_model::{MatchStrategyKind, SemanticType, Side};
use tempfile::TempDir;

const SHOP_A: &str = "\
商品名,価格,型番,レア
Fire Dragon,1200,PK-001,SR
Water Turtle,800,PK-002,R
Thunder Bird,1500,PK-003,R
";

const SHOP_B: &str = "\
title,cost,code
thunder bird,1500,TB3
fire dragon,1200,FD1
Ice Queen,900,IQ9
";

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

fn request(dir: &TempDir) -> ReconcileRequest {
    ReconcileRequest {
        input: InputFiles {
            file_a: write(dir, "a.csv", SHOP_A),
            file_b: write(dir, "b.csv", SHOP_B),
            max_rows: None,
        },
        overrides: ConfigOverrides::default(),
        json_out: None,
        rules_out: None,
        rule_threshold: 0.8,
    }
}

#[test]
fn reconcile_matches_names_and_learns_mappings() {
    let dir = TempDir::new().expect("temp dir");
    let report = run_reconcile(&request(&dir)).expect("reconcile");

    assert_eq!(report.result.outcome, Outcome::Matched);
    let mut pairs: Vec<(usize, usize)> = report
        .result
        .matches
        .iter()
        .map(|m| (m.index_a, m.index_b))
        .collect();
    pairs.sort_unstable();
    assert_eq!(pairs, vec![(0, 1), (2, 0)]);

    let keys: Vec<(&str, &str)> = report.result.mappings.iter().map(|m| m.key()).collect();
    assert!(keys.contains(&("商品名", "title")));
    assert!(keys.contains(&("価格", "cost")));
    assert_eq!(report.summary.match_quality.total, 2);
}

#[test]
fn reconcile_writes_json_and_rules() {
    let dir = TempDir::new().expect("temp dir");
    let json = dir.path().join("result.json");
    let rules = dir.path().join("rules.json");
    let mut request = request(&dir);
    request.json_out = Some(json.clone());
    request.rules_out = Some(rules.clone());

    let report = run_reconcile(&request).expect("reconcile");

    let result: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).expect("read json")).expect("parse json");
    assert_eq!(result["result"]["outcome"]["status"], "matched");
    assert_eq!(result["result"]["matches"].as_array().map(Vec::len), Some(2));

    let rule_set: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&rules).expect("read rules")).expect("parse rules");
    assert_eq!(rule_set["version"], "1.0");
    assert_eq!(
        rule_set["total_rules"].as_u64(),
        report.rules.as_ref().map(|r| r.total_rules as u64)
    );
}

#[test]
fn flags_override_config_file() {
    let dir = TempDir::new().expect("temp dir");
    let config = write(
        &dir,
        "recon.toml",
        "match_strategy = \"brute_force\"\nbrute_force_row_threshold = 0.7\n",
    );
    let overrides = ConfigOverrides {
        config_file: Some(config),
        brute_force_row_threshold: Some(0.65),
        ..ConfigOverrides::default()
    };
    let resolved = resolve_config(&overrides).expect("config");
    assert_eq!(resolved.match_strategy, MatchStrategyKind::BruteForce);
    assert!((resolved.brute_force_row_threshold - 0.65).abs() < 1e-9);

    let invalid = ConfigOverrides {
        field_mapping_min_confidence: Some(2.0),
        ..ConfigOverrides::default()
    };
    assert!(resolve_config(&invalid).is_err());
}

#[test]
fn max_rows_limits_input() {
    let dir = TempDir::new().expect("temp dir");
    let mut request = request(&dir);
    request.input.max_rows = Some(1);
    let report = run_reconcile(&request).expect("reconcile");
    assert!(report.a.truncated);
    assert_eq!(report.a.dataset.len(), 1);
    assert_eq!(report.result.matches.len(), 0);
}

#[test]
fn classify_reports_key_fields() {
    let dir = TempDir::new().expect("temp dir");
    let request = request(&dir);
    let report = run_classify(&request.input).expect("classify");

    assert_eq!(
        report.key_fields.columns(Side::A, SemanticType::Name),
        ["商品名".to_string()]
    );
    assert_eq!(
        report.key_fields.columns(Side::B, SemanticType::Identifier),
        ["code".to_string()]
    );
    assert!(
        report
            .key_fields
            .columns(Side::A, SemanticType::Rarity)
            .contains(&"レア".to_string())
    );
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let mut request = request(&dir);
    request.input.file_b = dir.path().join("missing.csv");
    let error = run_reconcile(&request).unwrap_err();
    assert!(format!("{error:#}").contains("missing.csv"));
}
