//! Character-equivalence tables.
//!
//! Europe PMC is capitalization-insensitive, but several visually similar
//! Unicode code points (Greek vs mathematical vs micro-sign variants) are used
//! interchangeably across sources and are NOT equated by the engine, so every
//! known form of a letter has to be expanded explicitly.

/// Greek letter word forms and every character form observed in the wild for
/// each of them.
pub(crate) const GREEK_EQUIVALENTS: &[(&str, &[&str])] = &[
    ("alpha", &["α", "𝛂", "𝛼"]),
    ("beta", &["β", "ϐ", "𝛽", "ᵝ"]),
    ("gamma", &["γ", "𝛄", "ℽ", "𝛾"]),
    ("delta", &["δ", "𝛿", "ẟ"]),
    ("epsilon", &["ε", "ɛ", "ϵ"]),
    ("zeta", &["ζ", "𝛇"]),
    ("eta", &["η"]),
    ("theta", &["Θ", "ϑ", "Ѳ"]),
    ("iota", &["Ι", "Ɩ"]),
    ("kappa", &["Κ", "ϰ"]),
    ("lambda", &["Λ"]),
    // lowercase mu and the micro sign look the same in many fonts
    ("mu", &["Μ", "µ", "𝜇", "𝝁"]),
    ("nu", &["Ν", "𝜈"]),
    ("xi", &["ξ"]),
    ("omicron", &["Ο"]),
    ("pi", &["Π", "ϖ", "𝜋"]),
    ("rho", &["Ρ"]),
    ("sigma", &["Σ", "ς", "𝜎"]),
    ("tau", &["Τ"]),
    ("upsilon", &["Υ", "ϒ"]),
    ("phi", &["φ", "ϕ", "Ф"]),
    ("chi", &["χ"]),
    ("psi", &["ψ", "𝛹"]),
    ("omega", &["Ω", "ѡ"]),
];

/// Roman numeral letters accepted where a number is expected.
pub(crate) const ROMAN_NUMERALS: &[char] = &['I', 'X', 'V'];

/// Hyphen and dash variants the search engine treats as a space.
pub(crate) const HYPHENS: &[char] = &['-', '–', '—', '‑'];

/// Every Greek word and character form, flattened. Used when scanning for
/// "type <greek>" phrases.
pub(crate) fn all_greek_forms() -> Vec<&'static str> {
    let mut forms = Vec::new();
    for (word, chars) in GREEK_EQUIVALENTS {
        forms.push(*word);
        forms.extend(chars.iter().copied());
    }
    forms
}

/// Replace every hyphen/dash variant with a plain space.
pub(crate) fn normalize_hyphens(value: &str) -> String {
    value
        .chars()
        .map(|c| if HYPHENS.contains(&c) { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_hyphens_covers_dash_variants() {
        assert_eq!(normalize_hyphens("ADAMTS-5"), "ADAMTS 5");
        assert_eq!(normalize_hyphens("ADAMTS–5"), "ADAMTS 5");
        assert_eq!(normalize_hyphens("ADAMTS—5"), "ADAMTS 5");
    }

    #[test]
    fn all_greek_forms_contains_words_and_characters() {
        let forms = all_greek_forms();
        assert!(forms.contains(&"alpha"));
        assert!(forms.contains(&"α"));
        assert!(forms.contains(&"µ"));
    }
}
