//! Header-based semantic classification of columns.
//!
//! Column names are matched against static keyword tables. A column can carry
//! several semantic types; columns matching nothing stay unclassified and are
//! reported as [`SemanticType::Unknown`].

use std::collections::{BTreeMap, BTreeSet};

use recon_model::{Dataset, SemanticType, Side};
use serde::Serialize;

/// Keyword table: a column whose lower-cased name contains any keyword is
/// classified with the associated type.
pub static KEYWORDS: &[(SemanticType, &[&str])] = &[
    (
        SemanticType::Name,
        &["name", "名前", "カード名", "商品名", "title", "product", "名称", "品名"],
    ),
    (
        SemanticType::Identifier,
        &[
            "id", "serial", "型番", "code", "number", "jan", "sku", "品番", "シリアル", "番号",
        ],
    ),
    (
        SemanticType::Date,
        &["date", "日付", "発売日", "release", "publish", "launch"],
    ),
    (
        SemanticType::Price,
        &["price", "価格", "値段", "金額", "amount", "cost", "円", "yen"],
    ),
    (
        SemanticType::Rarity,
        &[
            "rarity",
            "レアリティ",
            "希少度",
            "レア",
            "rare",
            "star",
            "grade",
            "rank",
            "tier",
            "等級",
            "グレード",
            "ランク",
        ],
    ),
    (
        SemanticType::Series,
        &["series", "シリーズ", "set", "セット", "edition"],
    ),
];

/// Rarity markers recognized in sampled values.
const RARITY_MARKERS: &[&str] = &[
    "C", "U", "R", "RR", "RRR", "N", "SR", "SSR", "UR", "HR", "AR", "SAR", "PR", "レア", "★", "☆",
    "COMMON", "UNCOMMON", "RARE", "SUPER",
];

/// Maximum number of non-empty values sampled per column during refinement.
pub const SAMPLE_LIMIT: usize = 10;

const SERIAL_RATIO_MIN: f64 = 0.7;
const RARITY_TOKEN_MAX_CHARS: usize = 5;
const RARITY_DISTINCT_MAX: usize = 10;

/// Returns every semantic type whose keywords occur in `column`.
pub fn classify_column(column: &str) -> Vec<SemanticType> {
    let lowered = column.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(semantic, _)| *semantic)
        .collect()
}

/// True when the column name matches identifier keywords.
pub fn is_identifier_column(column: &str) -> bool {
    classify_column(column).contains(&SemanticType::Identifier)
}

/// Columns of one side grouped by semantic type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SideFields {
    by_type: BTreeMap<SemanticType, Vec<String>>,
    unknown: Vec<String>,
}

impl SideFields {
    fn build<'a>(headers: impl Iterator<Item = &'a str>) -> Self {
        let mut fields = Self::default();
        for header in headers {
            let types = classify_column(header);
            if types.is_empty() {
                fields.unknown.push(header.to_string());
                continue;
            }
            for semantic in types {
                fields
                    .by_type
                    .entry(semantic)
                    .or_default()
                    .push(header.to_string());
            }
        }
        fields
    }

    pub fn columns(&self, semantic: SemanticType) -> &[String] {
        if semantic == SemanticType::Unknown {
            return &self.unknown;
        }
        self.by_type
            .get(&semantic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn types(&self) -> impl Iterator<Item = (SemanticType, &[String])> {
        self.by_type
            .iter()
            .map(|(semantic, columns)| (*semantic, columns.as_slice()))
    }
}

/// Classified columns of both datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyFieldIndex {
    pub a: SideFields,
    pub b: SideFields,
}

impl KeyFieldIndex {
    pub fn side(&self, side: Side) -> &SideFields {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn columns(&self, side: Side, semantic: SemanticType) -> &[String] {
        self.side(side).columns(semantic)
    }

    /// First side with no column of the given type.
    pub fn side_missing(&self, semantic: SemanticType) -> Option<Side> {
        [Side::A, Side::B]
            .into_iter()
            .find(|side| self.columns(*side, semantic).is_empty())
    }

    /// Columns of `semantic` that may drive key-field scoring.
    ///
    /// Columns also classified as identifiers (`product_code`, `name_id`) are
    /// left out.
    pub fn key_columns(&self, side: Side, semantic: SemanticType) -> Vec<&str> {
        let identifiers = self.columns(side, SemanticType::Identifier);
        self.columns(side, semantic)
            .iter()
            .filter(|column| !identifiers.contains(*column))
            .map(String::as_str)
            .collect()
    }

    /// First side with no key column of the given type.
    pub fn side_without_key_columns(&self, semantic: SemanticType) -> Option<Side> {
        [Side::A, Side::B]
            .into_iter()
            .find(|side| self.key_columns(*side, semantic).is_empty())
    }
}

/// Classifies both header sets by column name.
pub fn classify<'a, 'b>(
    headers_a: impl IntoIterator<Item = &'a str>,
    headers_b: impl IntoIterator<Item = &'b str>,
) -> KeyFieldIndex {
    KeyFieldIndex {
        a: SideFields::build(headers_a.into_iter()),
        b: SideFields::build(headers_b.into_iter()),
    }
}

/// Why sampled values promoted an unclassified column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementReason {
    /// A sampled value equals a known rarity marker.
    RarityMarker,
    /// Samples are short tokens drawn from a small repeated vocabulary.
    ShortTokenVocabulary,
    /// Most samples mix letters and digits like a serial number.
    SerialPattern,
}

/// A semantic type inferred from values for a column the keyword tables missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Refinement {
    pub side: Side,
    pub column: String,
    pub semantic: SemanticType,
    pub reason: RefinementReason,
    pub samples: usize,
}

/// Examines up to [`SAMPLE_LIMIT`] non-empty values of every unclassified
/// column and proposes a semantic type where the values are distinctive.
///
/// Refinements are advisory: key-field matching only uses header keywords.
pub fn refine_with_samples(dataset: &Dataset, fields: &SideFields) -> Vec<Refinement> {
    let mut refinements = Vec::new();
    for column in fields.columns(SemanticType::Unknown) {
        let Some(position) = dataset.headers().position(column) else {
            continue;
        };
        let samples: Vec<&str> = dataset
            .records()
            .iter()
            .map(|record| record.value_at(position).trim())
            .filter(|value| !value.is_empty())
            .take(SAMPLE_LIMIT)
            .collect();
        if samples.is_empty() {
            continue;
        }
        if let Some((semantic, reason)) = refine_samples(&samples) {
            refinements.push(Refinement {
                side: dataset.side(),
                column: column.clone(),
                semantic,
                reason,
                samples: samples.len(),
            });
        }
    }
    refinements
}

fn refine_samples(samples: &[&str]) -> Option<(SemanticType, RefinementReason)> {
    let has_marker = samples.iter().any(|value| {
        let upper = value.to_uppercase();
        RARITY_MARKERS.contains(&upper.as_str())
    });
    if has_marker {
        return Some((SemanticType::Rarity, RefinementReason::RarityMarker));
    }
    let distinct: BTreeSet<&str> = samples.iter().copied().collect();
    let short_tokens = samples
        .iter()
        .all(|value| value.chars().count() <= RARITY_TOKEN_MAX_CHARS);
    if short_tokens && distinct.len() <= RARITY_DISTINCT_MAX && distinct.len() < samples.len() {
        return Some((SemanticType::Rarity, RefinementReason::ShortTokenVocabulary));
    }
    let serial_like = samples
        .iter()
        .filter(|value| is_serial_like(value))
        .count();
    if serial_like as f64 / samples.len() as f64 > SERIAL_RATIO_MIN {
        return Some((SemanticType::Identifier, RefinementReason::SerialPattern));
    }
    None
}

/// Letters and digits together with at most two other symbols besides `-` and `_`.
fn is_serial_like(value: &str) -> bool {
    if value.chars().count() < 2 {
        return false;
    }
    let has_alpha = value.chars().any(char::is_alphabetic);
    let has_digit = value.chars().any(|ch| ch.is_ascii_digit());
    let special = value
        .chars()
        .filter(|ch| !ch.is_alphanumeric() && *ch != '-' && *ch != '_')
        .count();
    has_alpha && has_digit && special <= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_multilingual_headers() {
        assert_eq!(classify_column("カード名"), vec![SemanticType::Name]);
        assert_eq!(classify_column("型番"), vec![SemanticType::Identifier]);
        assert_eq!(classify_column("Release Date"), vec![SemanticType::Date]);
        assert_eq!(classify_column("販売価格"), vec![SemanticType::Price]);
        assert!(classify_column("memo").is_empty());
    }

    #[test]
    fn column_may_have_several_types() {
        let types = classify_column("product_id");
        assert!(types.contains(&SemanticType::Name));
        assert!(types.contains(&SemanticType::Identifier));
    }

    #[test]
    fn index_groups_columns_per_side() {
        let index = classify(["name", "serial", "memo"], ["カード名", "発売日"]);
        assert_eq!(index.columns(Side::A, SemanticType::Name), ["name"]);
        assert_eq!(index.columns(Side::A, SemanticType::Unknown), ["memo"]);
        assert_eq!(index.columns(Side::B, SemanticType::Date), ["発売日"]);
        assert!(index.columns(Side::B, SemanticType::Identifier).is_empty());
        assert_eq!(index.side_missing(SemanticType::Identifier), Some(Side::B));
        assert_eq!(index.side_missing(SemanticType::Name), None);
    }

    #[test]
    fn identifier_columns_are_not_key_columns() {
        let index = classify(["product_code", "title"], ["product_id", "名前"]);
        assert_eq!(index.columns(Side::A, SemanticType::Name).len(), 2);
        assert_eq!(index.key_columns(Side::A, SemanticType::Name), ["title"]);
        assert_eq!(index.key_columns(Side::B, SemanticType::Name), ["名前"]);

        let codes_only = classify(["product_code"], ["名前"]);
        assert_eq!(
            codes_only.side_without_key_columns(SemanticType::Name),
            Some(Side::A)
        );
        assert_eq!(codes_only.side_missing(SemanticType::Name), None);
    }

    #[test]
    fn refines_rarity_and_serial_samples() {
        assert_eq!(
            refine_samples(&["SR", "C", "U"]),
            Some((SemanticType::Rarity, RefinementReason::RarityMarker))
        );
        assert_eq!(
            refine_samples(&["◆", "◇", "◆", "◇"]),
            Some((SemanticType::Rarity, RefinementReason::ShortTokenVocabulary))
        );
        assert_eq!(
            refine_samples(&["PK001", "PK002", "SV4A-010", "D01001"]),
            Some((SemanticType::Identifier, RefinementReason::SerialPattern))
        );
        assert_eq!(refine_samples(&["Fire Dragon", "Water Turtle"]), None);
    }
}
