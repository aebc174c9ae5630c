use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use recon_map::{Outcome, Recommendation, RefinementReason};
use recon_model::{ConfirmedMatch, Dataset, EvidenceKind, FieldMapping, QualityTier, SemanticType, Side};

use recon_cli::types::{ClassifyReport, LoadedCatalog, ReconcileReport};

/// Matches shown in the match table; the JSON output has all of them.
const MATCH_ROWS: usize = 50;

pub fn print_reconcile(report: &ReconcileReport) {
    print_inputs(&report.a, &report.b);
    let result = &report.result;
    println!(
        "Strategy: {}{}",
        result.strategy.as_str(),
        if result.fell_back {
            " (after key-field fallback)"
        } else {
            ""
        }
    );
    if let Outcome::Inconclusive { reason } = result.outcome {
        println!("Result: inconclusive ({reason})");
    }
    if result.scorer_fallbacks > 0 {
        println!(
            "External scorer failed for {} record pairs; library scoring used",
            result.scorer_fallbacks
        );
    }
    if !result.matches.is_empty() {
        print_match_table(&result.matches, &report.a.dataset, &report.b.dataset);
    }
    if !result.mappings.is_empty() {
        print_mapping_table(&result.mappings);
    }
    print_summary_table(report);
    for recommendation in &report.summary.recommendations {
        println!("{} {}", recommendation_marker(*recommendation), recommendation.message());
    }
    if !report.summary.warnings.is_empty() {
        eprintln!("Warnings:");
        for warning in &report.summary.warnings {
            eprintln!("- {warning}");
        }
    }
    if let (Some(path), Some(rules)) = (&report.rules_path, &report.rules) {
        println!("Rules: {} ({} rules)", path.display(), rules.total_rules);
    }
    if let Some(path) = &report.json_path {
        println!("JSON: {}", path.display());
    }
}

pub fn print_classify(report: &ClassifyReport) {
    print_inputs(&report.a, &report.b);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Type"),
        header_cell("Columns in A"),
        header_cell("Columns in B"),
    ]);
    apply_table_style(&mut table);
    let mut semantics: Vec<SemanticType> = SemanticType::CLASSIFIABLE.to_vec();
    semantics.push(SemanticType::Unknown);
    for semantic in semantics {
        let columns_a = report.key_fields.columns(Side::A, semantic);
        let columns_b = report.key_fields.columns(Side::B, semantic);
        if columns_a.is_empty() && columns_b.is_empty() {
            continue;
        }
        table.add_row(vec![
            semantic_cell(semantic),
            column_list_cell(columns_a),
            column_list_cell(columns_b),
        ]);
    }
    println!("{table}");

    if report.refinements.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Side"),
        header_cell("Column"),
        header_cell("Suggested type"),
        header_cell("Reason"),
        header_cell("Samples"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    for refinement in &report.refinements {
        table.add_row(vec![
            Cell::new(refinement.side),
            Cell::new(&refinement.column),
            semantic_cell(refinement.semantic),
            Cell::new(reason_label(refinement.reason)),
            Cell::new(refinement.samples),
        ]);
    }
    println!("{table}");
}

fn print_inputs(a: &LoadedCatalog, b: &LoadedCatalog) {
    for (side, catalog) in [(Side::A, a), (Side::B, b)] {
        println!(
            "{side}: {} ({} rows, {} columns{})",
            catalog.path.display(),
            catalog.dataset.len(),
            catalog.dataset.headers().len(),
            if catalog.truncated { ", truncated" } else { "" }
        );
    }
}

fn print_match_table(matches: &[ConfirmedMatch], a: &Dataset, b: &Dataset) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row A"),
        header_cell("Row B"),
        header_cell("Score"),
        header_cell("Matched on"),
        header_cell("Value"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for confirmed in matches.iter().take(MATCH_ROWS) {
        let (matched_on, value) = match confirmed.evidence.first() {
            Some(evidence) => (
                format!(
                    "{} = {} ({})",
                    evidence.column_a,
                    evidence.column_b,
                    evidence_label(evidence.kind)
                ),
                evidence.value.clone(),
            ),
            None => ("-".to_string(), String::new()),
        };
        table.add_row(vec![
            row_cell(confirmed.index_a, a),
            row_cell(confirmed.index_b, b),
            score_cell(confirmed.score),
            Cell::new(matched_on),
            dim_cell(value),
        ]);
    }
    println!("{table}");
    if matches.len() > MATCH_ROWS {
        println!("... {} more matches", matches.len() - MATCH_ROWS);
    }
}

fn print_mapping_table(mappings: &[FieldMapping]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column A"),
        header_cell("Column B"),
        header_cell("Confidence"),
        header_cell("Tier"),
        header_cell("Agreeing"),
        header_cell("Compared"),
        header_cell("Examples"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    for mapping in mappings {
        let examples = mapping
            .samples
            .iter()
            .map(|pair| format!("{} = {}", pair.value_a, pair.value_b))
            .collect::<Vec<_>>()
            .join("; ");
        table.add_row(vec![
            Cell::new(&mapping.column_a).add_attribute(Attribute::Bold),
            Cell::new(&mapping.column_b).add_attribute(Attribute::Bold),
            score_cell(mapping.confidence),
            tier_cell(mapping.quality_tier),
            Cell::new(mapping.sample_count),
            Cell::new(mapping.total_comparisons),
            dim_cell(examples),
        ]);
    }
    println!("{table}");
}

fn print_summary_table(report: &ReconcileReport) {
    let summary = &report.summary;
    let quality = &summary.match_quality;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows: Vec<(&str, String)> = vec![
        ("Candidates", report.result.candidate_count.to_string()),
        ("Matches", quality.total.to_string()),
        ("Average match score", format!("{:.3}", quality.average_score)),
        (
            "High / medium / low matches",
            format!("{} / {} / {}", quality.high, quality.medium, quality.low),
        ),
        ("Mappings", summary.total_mappings.to_string()),
        ("Average confidence", format!("{:.3}", summary.average_confidence)),
        (
            "High / medium / id / co-occurrence",
            format!(
                "{} / {} / {} / {}",
                summary.tier_count(QualityTier::High),
                summary.tier_count(QualityTier::Medium),
                summary.tier_count(QualityTier::IdField),
                summary.tier_count(QualityTier::Cooccurrence)
            ),
        ),
        ("Coverage A", format!("{:.0}%", summary.coverage_a * 100.0)),
        ("Coverage B", format!("{:.0}%", summary.coverage_b * 100.0)),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn row_cell(index: usize, dataset: &Dataset) -> Cell {
    let label = dataset
        .records()
        .get(index)
        .and_then(|record| record.iter().map(|(_, value)| value).find(|value| !value.is_empty()))
        .unwrap_or("");
    Cell::new(format!("{} {}", index + 1, label))
}

fn score_cell(score: f64) -> Cell {
    let color = if score > 0.8 {
        Color::Green
    } else if score >= 0.6 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{score:.2}")).fg(color)
}

fn tier_cell(tier: QualityTier) -> Cell {
    let color = match tier {
        QualityTier::High => Color::Green,
        QualityTier::Medium => Color::Yellow,
        QualityTier::Low => Color::Red,
        QualityTier::IdField => Color::Blue,
        QualityTier::Cooccurrence => Color::Magenta,
    };
    Cell::new(tier.as_str()).fg(color)
}

fn semantic_cell(semantic: SemanticType) -> Cell {
    if semantic == SemanticType::Unknown {
        dim_cell(semantic.as_str())
    } else {
        Cell::new(semantic.as_str())
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold)
    }
}

fn column_list_cell(columns: &[String]) -> Cell {
    if columns.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(columns.join(", "))
    }
}

fn evidence_label(kind: EvidenceKind) -> &'static str {
    match kind {
        EvidenceKind::Field(semantic) => semantic.as_str(),
        EvidenceKind::Class(class) => class.as_str(),
    }
}

fn recommendation_marker(recommendation: Recommendation) -> &'static str {
    match recommendation {
        Recommendation::AdoptRuleSet => "[ok]",
        Recommendation::UseHighConfidenceOnly | Recommendation::ReviewManually => "[review]",
        Recommendation::CleanAndRetry
        | Recommendation::GatherMoreData
        | Recommendation::NormalizeNames => "[action]",
    }
}

fn reason_label(reason: RefinementReason) -> &'static str {
    match reason {
        RefinementReason::RarityMarker => "rarity marker value",
        RefinementReason::ShortTokenVocabulary => "short repeated tokens",
        RefinementReason::SerialPattern => "serial-number pattern",
    }
}
