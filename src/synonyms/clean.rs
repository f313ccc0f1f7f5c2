//! Noise filtering, punctuation normalization and redundancy elimination for
//! candidate synonym lists.

use std::sync::OnceLock;

use regex::Regex;

use crate::synonyms::TermKind;
use crate::tables::{greek, noise};

/// Cleaned synonyms shorter than this are discarded.
pub(crate) const MIN_SYNONYM_LEN: usize = 2;

/// Whole-word, case-insensitive search for `word` inside another phrase.
///
/// `\b` semantics deliberately treat digits as word characters: `ABC` is not
/// a whole-word match inside `ABC1`, so numbered family members survive
/// alongside their root.
pub(crate) fn contains_whole_word(haystack: &str, word: &str) -> bool {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(haystack),
        Err(_) => false,
    }
}

pub(crate) fn collapse_spaces(value: &str) -> String {
    static MULTI_SPACE_RE: OnceLock<Regex> = OnceLock::new();
    let re = MULTI_SPACE_RE.get_or_init(|| Regex::new(r"\s{2,}").expect("valid regex"));
    re.replace_all(value, " ").trim().to_string()
}

fn contains_noise_marker(candidate: &str) -> bool {
    // GO cross-references legitimately contain a colon.
    if candidate.starts_with("GO:") {
        return false;
    }
    let upper = candidate.to_uppercase();
    noise::SYNONYM_NOISE
        .iter()
        .any(|marker| upper.contains(&marker.to_uppercase()))
}

fn has_digit(candidate: &str) -> bool {
    candidate.chars().any(|c| c.is_ascii_digit())
}

/// Brackets whose content is purely explanatory are stripped; brackets that
/// carry digits or roman numerals (isoform numbers) keep their content.
fn strip_bracketed_annotations(value: &str) -> String {
    static NUMERIC_BRACKET_RE: OnceLock<Regex> = OnceLock::new();
    static BRACKET_RE: OnceLock<Regex> = OnceLock::new();
    let numeric = NUMERIC_BRACKET_RE.get_or_init(|| {
        let numerals: String = greek::ROMAN_NUMERALS.iter().collect();
        Regex::new(&format!(r"\(.*[{numerals}\d]+.*\)")).expect("valid regex")
    });
    let brackets =
        BRACKET_RE.get_or_init(|| Regex::new(r"[(\[]+.*?[)\]]+").expect("valid regex"));

    if numeric.is_match(value) {
        value.to_string()
    } else {
        brackets.replace_all(value, "").to_string()
    }
}

fn normalize_punctuation(candidate: &str) -> String {
    let mut term = candidate.to_string();
    // marker words some ontologies append to synonyms
    for marker in ["EXACT", "susceptibility to", "working designation"] {
        term = term.replace(marker, " ");
    }
    for ch in ['_', ',', '?', '"', '“', '”'] {
        term = term.replace(ch, " ");
    }
    term = greek::normalize_hyphens(&term);
    term = strip_bracketed_annotations(&term);
    term = term.replace(['(', ')'], " ");
    term = term.replace('\n', " ");
    collapse_spaces(&term)
}

/// Candidates matching `^[A-Z]\d+$` (plate/well style codes) are heavy noise
/// for tissues, but valid for genes (e.g. p53), so only tissues drop them.
fn is_tissue_code(candidate: &str) -> bool {
    static CODE_RE: OnceLock<Regex> = OnceLock::new();
    let re = CODE_RE.get_or_init(|| Regex::new(r"^[A-Z]\d+$").expect("valid regex"));
    re.is_match(candidate)
}

/// Initial cleaning pass: drops noise, normalizes punctuation, enforces the
/// minimum length, and re-inserts the original term at the front.
pub(crate) fn remove_noise_and_punctuation(
    candidates: &[String],
    original: &str,
    kind: TermKind,
) -> Vec<String> {
    let mut unique: Vec<&String> = candidates.iter().collect();
    unique.sort();
    unique.dedup();

    let mut filtered: Vec<String> = Vec::new();
    for candidate in unique {
        // self-references are already covered by the original term itself
        if contains_whole_word(candidate, original) {
            continue;
        }
        if contains_noise_marker(candidate) {
            continue;
        }
        // a period with no digits is curator prose, not a searchable name
        if candidate.contains('.') && !has_digit(candidate) {
            continue;
        }

        let term = normalize_punctuation(candidate);
        if term.len() < MIN_SYNONYM_LEN {
            continue;
        }
        if kind == TermKind::Tissue && is_tissue_code(&term) {
            continue;
        }
        filtered.push(term);
    }

    filtered.insert(0, original.to_string());
    let mut seen = std::collections::HashSet::new();
    filtered.retain(|s| seen.insert(s.clone()));
    filtered
}

/// Removes synonyms that contain a shorter synonym as a whole-word substring:
/// querying for the shorter form already returns every hit of the longer one.
///
/// Phrases are considered shortest-first (by word count) so ties always keep
/// the shortest surviving form.
pub(crate) fn remove_redundant(synonyms: Vec<String>) -> Vec<String> {
    let mut by_word_count: Vec<String> = synonyms.clone();
    by_word_count.sort_by_key(|s| s.split_whitespace().count());

    let mut redundant: Vec<String> = Vec::new();
    for term in &by_word_count {
        if redundant.contains(term) {
            continue;
        }
        for other in &synonyms {
            if other == term {
                continue;
            }
            if contains_whole_word(other, term) && !redundant.contains(other) {
                redundant.push(other.clone());
            }
        }
    }

    synonyms
        .into_iter()
        .filter(|s| !redundant.contains(s))
        .collect()
}
