//! Value normalization for catalog reconciliation.
//!
//! Raw cell values are canonicalized per [`SemanticType`] before equality
//! checks. Every function here is idempotent: normalizing an already
//! normalized value returns it unchanged.

use recon_model::SemanticType;

const BOM: char = '\u{feff}';

/// Removes byte-order marks anywhere in the value, then trims whitespace.
pub fn clean_raw(raw: &str) -> String {
    let without_bom: String = raw.chars().filter(|&ch| ch != BOM).collect();
    without_bom.trim().to_string()
}

/// Canonicalizes a raw value for the given semantic type.
///
/// - dates: `Y/M/D` triplets become zero-padded `YYYYMMDD`, otherwise
///   dashes, slashes and spaces are removed
/// - names: full-width `＆` and full-width space are folded, then lower-cased
/// - identifiers: upper-cased with all whitespace removed
/// - everything else: lower-cased
pub fn normalize(raw: &str, semantic: SemanticType) -> String {
    let value = clean_raw(raw);
    if value.is_empty() {
        return value;
    }
    match semantic {
        SemanticType::Date => normalize_date(&value),
        SemanticType::Name => fold_name(&value),
        SemanticType::Identifier => value
            .to_uppercase()
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect(),
        SemanticType::Price
        | SemanticType::Rarity
        | SemanticType::Series
        | SemanticType::Unknown => value.to_lowercase().trim().to_string(),
    }
}

/// Type-agnostic normalization used when learning field mappings.
///
/// Date triplets are padded as in [`normalize`]; any other value gets the
/// name folding rule.
pub fn normalize_for_comparison(raw: &str) -> String {
    let value = clean_raw(raw);
    if let Some(date) = pad_date_triplet(&value) {
        return date;
    }
    fold_name(&value)
}

/// Extracts a number from a price-like value such as `¥1,200` or `300円`.
///
/// Values containing ASCII letters are treated as codes, not numbers, so
/// `PK001` yields `None`.
pub fn extract_numeric(raw: &str) -> Option<f64> {
    let value = clean_raw(raw);
    if value.chars().any(|ch| ch.is_ascii_alphabetic()) {
        return None;
    }
    let digits: String = value
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    if !digits.chars().any(|ch| ch.is_ascii_digit()) {
        return None;
    }
    digits.parse::<f64>().ok()
}

fn normalize_date(value: &str) -> String {
    if let Some(date) = pad_date_triplet(value) {
        return date;
    }
    let stripped: String = value
        .chars()
        .filter(|ch| !matches!(ch, '-' | '/' | ' '))
        .collect();
    stripped.trim().to_string()
}

fn pad_date_triplet(value: &str) -> Option<String> {
    let parts: Vec<&str> = value.split('/').collect();
    let [year, month, day] = parts.as_slice() else {
        return None;
    };
    let all_digits = [year, month, day]
        .iter()
        .all(|part| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit()));
    if !all_digits {
        return None;
    }
    Some(format!("{year:0>4}{month:0>2}{day:0>2}"))
}

fn fold_name(value: &str) -> String {
    value
        .replace('＆', "&")
        .replace('\u{3000}', " ")
        .to_lowercase()
        .trim()
        .to_string()
}
