use std::path::PathBuf;

use recon_map::{KeyFieldIndex, MappingRuleSet, MappingSummary, ReconResult, Refinement};
use recon_model::{Dataset, MatchStrategyKind};
use serde::Serialize;

/// Values given on the command line; `None` keeps the file or default value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub strategy: Option<MatchStrategyKind>,
    pub key_field_match_threshold: Option<f64>,
    pub brute_force_row_threshold: Option<f64>,
    pub field_mapping_min_confidence: Option<f64>,
    pub cooccurrence_min_confidence: Option<f64>,
    pub fallback: bool,
}

#[derive(Debug, Clone)]
pub struct InputFiles {
    pub file_a: PathBuf,
    pub file_b: PathBuf,
    pub max_rows: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub input: InputFiles,
    pub overrides: ConfigOverrides,
    pub json_out: Option<PathBuf>,
    pub rules_out: Option<PathBuf>,
    pub rule_threshold: f64,
}

/// A loaded catalog file.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub path: PathBuf,
    pub dataset: Dataset,
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub a: LoadedCatalog,
    pub b: LoadedCatalog,
    pub result: ReconResult,
    pub summary: MappingSummary,
    pub rules: Option<MappingRuleSet>,
    pub json_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ClassifyReport {
    pub a: LoadedCatalog,
    pub b: LoadedCatalog,
    pub key_fields: KeyFieldIndex,
    pub refinements: Vec<Refinement>,
}

/// Shape of the `--json` output file.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub file_a: String,
    pub file_b: String,
    pub result: &'a ReconResult,
    pub summary: &'a MappingSummary,
}
