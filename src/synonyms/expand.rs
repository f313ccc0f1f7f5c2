//! Orthographic variant expansion: "type" phrase reordering, trailing
//! "chain" stripping, Greek character equivalents, and letter/number spacing
//! variants.
//!
//! The search engine equates hyphens with spaces and ignores capitalization,
//! but treats a present space and an absent space as different tokens, and
//! does not equate the several Unicode code points used for the same Greek
//! letter. Expansion makes those equivalences explicit.

use std::sync::OnceLock;

use regex::Regex;

use crate::synonyms::clean::collapse_spaces;
use crate::tables::greek;

/// Identifier shapes that look like a name+number but are fixed-format codes:
/// splitting them would destroy the identifier.
fn is_fixed_format_code(syn: &str) -> bool {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r"^[Cc]\d+orf\d+",
            r"^UNQ\d+/PRO\d+",
            r"^KIAA\d+",
            r"^[A-Za-z]\d{1,3}$",
            r"^(CI|RR|AIM|FBS|IOP)\d+$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    });
    patterns.iter().any(|re| re.is_match(syn))
}

/// Generates both orderings for synonyms containing a "type N" phrase, e.g.
/// "collagen type II" additionally yields "type II collagen".
pub(crate) fn expand_types(synonyms: Vec<String>) -> Vec<String> {
    static TYPE_PHRASE_RE: OnceLock<Regex> = OnceLock::new();
    let re = TYPE_PHRASE_RE.get_or_init(|| {
        let greek_alt = greek::all_greek_forms()
            .iter()
            .map(|f| regex::escape(f))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"(?i)\b(type\s*(?:\d+[a-z]?|[IXV]+|{greek_alt})(?:\s*\d+)*)\b"
        ))
        .expect("valid regex")
    });

    let mut additional: Vec<String> = Vec::new();
    for syn in &synonyms {
        if !syn.to_lowercase().contains("type") {
            continue;
        }
        if let Some(m) = re.find(syn) {
            let phrase = m.as_str().trim();
            let rest = collapse_spaces(&format!(
                "{} {}",
                &syn[..m.start()],
                &syn[m.end()..]
            ));
            if rest.is_empty() {
                continue;
            }
            additional.push(collapse_spaces(&format!("{rest} {phrase}")));
            additional.push(collapse_spaces(&format!("{phrase} {rest}")));
        }
    }

    dedup_preserving_order(synonyms, additional)
}

/// Strips a trailing "chain"/"chains" word; the stripped form replaces the
/// original since the engine matches the shorter phrase in both.
pub(crate) fn strip_trailing_chain(synonyms: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for syn in synonyms {
        let trimmed = syn.trim();
        let stripped = trimmed
            .strip_suffix("chains")
            .or_else(|| trimmed.strip_suffix("chain"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| trimmed.to_string());
        if !out.contains(&stripped) {
            out.push(stripped);
        }
    }
    out
}

/// Expands every Greek letter word or character into all its equivalent
/// forms. Bare `letter + digits` synonyms (e.g. "gamma 2") are dropped as
/// noise rather than expanded.
pub(crate) fn expand_greek_letters(synonyms: Vec<String>) -> Vec<String> {
    let mut additional: Vec<String> = Vec::new();
    let mut to_remove: Vec<String> = Vec::new();

    for syn in &synonyms {
        for (word, chars) in greek::GREEK_EQUIVALENTS {
            let bare = Regex::new(&format!(r"(?i)^{word}\s?\d+$")).expect("valid regex");
            if bare.is_match(syn) {
                to_remove.push(syn.clone());
                continue;
            }

            let word_re =
                Regex::new(&format!(r"(?i)\b{word}\b")).expect("valid regex");
            if word_re.is_match(syn) {
                for character in *chars {
                    additional.push(word_re.replace_all(syn, *character).to_string());
                }
            }

            for character in *chars {
                let bare_char = Regex::new(&format!(
                    r"(?i)^{}\s?\d+$",
                    regex::escape(character)
                ))
                .expect("valid regex");
                if bare_char.is_match(syn) {
                    continue;
                }
                if syn.contains(character) {
                    for other in *chars {
                        additional.push(syn.replace(character, other));
                    }
                    additional.push(syn.replace(character, word));
                }
            }
        }
    }

    let kept: Vec<String> = synonyms
        .into_iter()
        .filter(|s| !to_remove.contains(s))
        .collect();
    dedup_preserving_order(kept, additional)
}

fn letter_digit_boundaries(syn: &str) -> Vec<usize> {
    let chars: Vec<char> = syn.chars().collect();
    let mut boundaries = Vec::new();
    let mut byte_pos = 0;
    for i in 0..chars.len() {
        if i > 0 {
            let prev = chars[i - 1];
            if chars[i].is_ascii_digit() && !prev.is_ascii_digit() && !prev.is_whitespace() {
                boundaries.push(byte_pos);
            }
        }
        byte_pos += chars[i].len_utf8();
    }
    boundaries
}

/// Adds spaced variants for numbers glued to letters ("ADAMTS5" also yields
/// "ADAMTS 5"), progressively for each number position, skipping fixed-format
/// codes and phrases longer than two words.
pub(crate) fn add_space_before_numbers(synonyms: Vec<String>) -> Vec<String> {
    let mut additional: Vec<String> = Vec::new();

    for syn in &synonyms {
        let normalized = greek::normalize_hyphens(syn);
        if is_fixed_format_code(&normalized) || normalized.split(' ').count() > 2 {
            continue;
        }

        let boundaries = letter_digit_boundaries(&normalized);
        for count in 1..=boundaries.len() {
            let mut variant = String::with_capacity(normalized.len() + count);
            let mut last = 0;
            for &b in boundaries.iter().take(count) {
                variant.push_str(&normalized[last..b]);
                variant.push(' ');
                last = b;
            }
            variant.push_str(&normalized[last..]);
            additional.push(collapse_spaces(&variant));
        }
    }

    dedup_preserving_order(synonyms, additional)
}

/// Adds unspaced variants for numbers preceded by a space or hyphen
/// ("ADAMTS-5" and "ADAMTS 5" also yield "ADAMTS5").
pub(crate) fn remove_space_before_numbers(synonyms: Vec<String>) -> Vec<String> {
    static SPACED_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    let re =
        SPACED_NUMBER_RE.get_or_init(|| Regex::new(r"\s+(\d)").expect("valid regex"));

    let mut additional: Vec<String> = Vec::new();
    for syn in &synonyms {
        let normalized = greek::normalize_hyphens(syn);
        let joined = re.replace_all(&normalized, "$1").to_string();
        if joined != normalized {
            additional.push(joined);
        }
        if normalized != *syn {
            additional.push(collapse_spaces(&normalized));
        }
    }

    dedup_preserving_order(synonyms, additional)
}

fn dedup_preserving_order(mut base: Vec<String>, additional: Vec<String>) -> Vec<String> {
    for item in additional {
        if !base.contains(&item) {
            base.push(item);
        }
    }
    base
}
