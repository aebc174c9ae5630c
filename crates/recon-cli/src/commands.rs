use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use recon_ingest::{IngestOptions, read_csv_table_with_options};
use recon_map::{ReconEngine, classify, export_rules, refine_with_samples};
use recon_model::{ReconConfig, Side};
use serde::Serialize;
use tracing::{debug, info, info_span, trace, warn};

use crate::logging::redact_value;
use crate::types::{
    ClassifyReport, ConfigOverrides, InputFiles, JsonReport, LoadedCatalog, ReconcileReport,
    ReconcileRequest,
};

/// Builds the run configuration: defaults, then the config file, then flags.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ReconConfig> {
    let mut config = match &overrides.config_file {
        Some(path) => ReconConfig::load(path)?,
        None => ReconConfig::default(),
    };
    if let Some(strategy) = overrides.strategy {
        config.match_strategy = strategy;
    }
    if let Some(value) = overrides.key_field_match_threshold {
        config.key_field_match_threshold = value;
    }
    if let Some(value) = overrides.brute_force_row_threshold {
        config.brute_force_row_threshold = value;
    }
    if let Some(value) = overrides.field_mapping_min_confidence {
        config.field_mapping_min_confidence = value;
    }
    if let Some(value) = overrides.cooccurrence_min_confidence {
        config.cooccurrence_min_confidence = value;
    }
    if overrides.fallback {
        config.fallback_to_brute_force = true;
    }
    config.validate().context("validate configuration")?;
    Ok(config)
}

pub fn run_reconcile(request: &ReconcileRequest) -> Result<ReconcileReport> {
    let config = resolve_config(&request.overrides)?;
    let span = info_span!(
        "reconcile_files",
        file_a = %request.input.file_a.display(),
        file_b = %request.input.file_b.display()
    );
    let _guard = span.enter();
    let start = Instant::now();

    let (a, b) = load_pair(&request.input)?;
    let engine = ReconEngine::new(config).context("create engine")?;
    let result = engine.run(&a.dataset, &b.dataset);
    let summary = result.summarize(&a.dataset, &b.dataset);

    for confirmed in &result.matches {
        if let Some(evidence) = confirmed.evidence.first() {
            trace!(
                index_a = confirmed.index_a,
                index_b = confirmed.index_b,
                score = confirmed.score,
                value = redact_value(&evidence.value),
                "confirmed match"
            );
        }
    }

    let rules = request
        .rules_out
        .as_ref()
        .map(|_| export_rules(&result.mappings, request.rule_threshold, result.strategy));
    if let (Some(path), Some(rules)) = (&request.rules_out, &rules) {
        write_json(path, rules).with_context(|| format!("write rules {}", path.display()))?;
        info!(path = %path.display(), rules = rules.total_rules, "rule set exported");
    }
    if let Some(path) = &request.json_out {
        let report = JsonReport {
            file_a: a.path.display().to_string(),
            file_b: b.path.display().to_string(),
            result: &result,
            summary: &summary,
        };
        write_json(path, &report).with_context(|| format!("write result {}", path.display()))?;
        debug!(path = %path.display(), "result written");
    }

    info!(
        matches = result.matches.len(),
        mappings = result.mappings.len(),
        duration_ms = start.elapsed().as_millis(),
        "reconcile complete"
    );
    Ok(ReconcileReport {
        a,
        b,
        result,
        summary,
        rules,
        json_path: request.json_out.clone(),
        rules_path: request.rules_out.clone(),
    })
}

pub fn run_classify(input: &InputFiles) -> Result<ClassifyReport> {
    let span = info_span!(
        "classify_files",
        file_a = %input.file_a.display(),
        file_b = %input.file_b.display()
    );
    let _guard = span.enter();

    let (a, b) = load_pair(input)?;
    let key_fields = classify(a.dataset.headers().iter(), b.dataset.headers().iter());
    let mut refinements = refine_with_samples(&a.dataset, &key_fields.a);
    refinements.extend(refine_with_samples(&b.dataset, &key_fields.b));
    Ok(ClassifyReport {
        a,
        b,
        key_fields,
        refinements,
    })
}

fn load_pair(input: &InputFiles) -> Result<(LoadedCatalog, LoadedCatalog)> {
    let options = IngestOptions::with_max_rows(input.max_rows);
    let a = load_catalog(&input.file_a, Side::A, options)?;
    let b = load_catalog(&input.file_b, Side::B, options)?;
    Ok((a, b))
}

fn load_catalog(path: &Path, side: Side, options: IngestOptions) -> Result<LoadedCatalog> {
    let start = Instant::now();
    let table = read_csv_table_with_options(path, options)
        .with_context(|| format!("read {}", path.display()))?;
    let truncated = table.truncated;
    if truncated {
        warn!(
            path = %path.display(),
            max_rows = options.max_rows,
            "input truncated"
        );
    }
    let dataset = table
        .into_dataset(side)
        .with_context(|| format!("load dataset {side} from {}", path.display()))?;
    info!(
        side = side.as_str(),
        columns = dataset.headers().len(),
        rows = dataset.len(),
        duration_ms = start.elapsed().as_millis(),
        "catalog loaded"
    );
    Ok(LoadedCatalog {
        path: path.to_path_buf(),
        dataset,
        truncated,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
