//! String similarity measures.
//!
//! Four symmetric measures in `[0, 1]` plus a weighted composite:
//! containment-aware exact match, Levenshtein ratio, token Jaccard and
//! character-bigram Jaccard.

use std::collections::BTreeSet;

use rapidfuzz::distance::levenshtein;
use serde::Serialize;

const EXACT_WEIGHT: f64 = 0.4;
const FUZZY_WEIGHT: f64 = 0.3;
const PARTIAL_WEIGHT: f64 = 0.2;
const JACCARD_WEIGHT: f64 = 0.1;

/// Score returned when one cleaned string contains the other.
const CONTAINMENT_SCORE: f64 = 0.9;

/// All measures for one pair of strings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityScores {
    pub exact: f64,
    pub fuzzy: f64,
    pub partial: f64,
    pub jaccard: f64,
    pub composite: f64,
}

impl SimilarityScores {
    /// Highest of the four base measures.
    pub fn max_base(&self) -> f64 {
        self.exact
            .max(self.fuzzy)
            .max(self.partial)
            .max(self.jaccard)
    }
}

/// Computes every measure for `a` and `b`.
pub fn similarity(a: &str, b: &str) -> SimilarityScores {
    let clean_a = clean_text(a);
    let clean_b = clean_text(b);
    let exact = exact_cleaned(&clean_a, &clean_b);
    let fuzzy = fuzzy_cleaned(a, b, &clean_a, &clean_b);
    let partial = partial_similarity(a, b);
    let jaccard = jaccard_cleaned(&clean_a, &clean_b);
    SimilarityScores {
        exact,
        fuzzy,
        partial,
        jaccard,
        composite: EXACT_WEIGHT * exact
            + FUZZY_WEIGHT * fuzzy
            + PARTIAL_WEIGHT * partial
            + JACCARD_WEIGHT * jaccard,
    }
}

/// Lower-cases, drops punctuation and symbols, and collapses whitespace.
pub fn clean_text(raw: &str) -> String {
    let lowered: String = raw
        .to_lowercase()
        .chars()
        .filter(|ch| is_word_char(*ch) || ch.is_whitespace())
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 1.0 for equal cleaned strings, 0.9 when one contains the other.
pub fn exact_similarity(a: &str, b: &str) -> f64 {
    exact_cleaned(&clean_text(a), &clean_text(b))
}

/// `1 - levenshtein / max_len` over the cleaned strings.
///
/// Inputs that clean to nothing (`"!!"`, `"??"`) score 0.0 unless both raw
/// inputs are empty.
pub fn fuzzy_similarity(a: &str, b: &str) -> f64 {
    fuzzy_cleaned(a, b, &clean_text(a), &clean_text(b))
}

/// Jaccard overlap of script-aware tokens of at least two characters.
pub fn partial_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<String> = tokenize(a).into_iter().collect();
    let tokens_b: BTreeSet<String> = tokenize(b).into_iter().collect();
    set_jaccard(&tokens_a, &tokens_b)
}

/// Jaccard overlap of character bigrams of the cleaned strings.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    jaccard_cleaned(&clean_text(a), &clean_text(b))
}

/// Unit-cost Levenshtein ratio on the strings as given.
///
/// Two empty strings are identical.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein::distance(a.chars(), b.chars());
    (1.0 - distance as f64 / max_len as f64).max(0.0)
}

/// Splits text into runs of a single script.
///
/// Hiragana, katakana, CJK ideographs and ASCII alphanumerics each form
/// their own tokens, so `ピカチュウex` yields `ピカチュウ` and `ex`. ASCII is
/// lower-cased. Tokens shorter than two characters are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_script = None;
    for ch in text.chars() {
        let script = Script::of(ch);
        if script != current_script || script.is_none() {
            push_token(&mut tokens, &mut current);
            current_script = script;
        }
        if script.is_some() {
            current.push(ch.to_ascii_lowercase());
        }
    }
    push_token(&mut tokens, &mut current);
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Hiragana,
    Katakana,
    Ideograph,
    AsciiAlphanumeric,
}

impl Script {
    fn of(ch: char) -> Option<Self> {
        match ch {
            'ぁ'..='ゟ' => Some(Self::Hiragana),
            'ァ'..='ヿ' => Some(Self::Katakana),
            '一'..='龯' => Some(Self::Ideograph),
            _ if ch.is_ascii_alphanumeric() => Some(Self::AsciiAlphanumeric),
            _ => None,
        }
    }
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    if current.chars().count() >= 2 {
        tokens.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn exact_cleaned(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        1.0
    } else if a.contains(b) || b.contains(a) {
        CONTAINMENT_SCORE
    } else {
        0.0
    }
}

fn fuzzy_cleaned(raw_a: &str, raw_b: &str, a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() && !(raw_a.is_empty() && raw_b.is_empty()) {
        return 0.0;
    }
    levenshtein_ratio(a, b)
}

fn jaccard_cleaned(a: &str, b: &str) -> f64 {
    set_jaccard(&bigrams(a), &bigrams(b))
}

fn bigrams(text: &str) -> BTreeSet<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

fn set_jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}
