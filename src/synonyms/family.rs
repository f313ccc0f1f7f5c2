//! Family-root derivation for systematically numbered gene names.
//!
//! "ADAMTS5" belongs to the ADAMTS family; publications often reference
//! members only through a shared list ("ADAMTS4 and 5"), which no literal
//! synonym query can match. The root and the per-synonym suffix remainders
//! feed the broader root query and the indirect-list matcher.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// A family stem plus the suffix remainders observed across one gene's
/// synonyms (e.g. root "ABC" with remainders {"1", "2"}).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FamilyRoot {
    pub root: String,
    pub remainders: Vec<String>,
}

fn excluded_name_res() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // ORF, UNQ and KIAA style identifiers are catalog numbers, not families
        [r"^[Cc]\d+orf\d+", r"^UNQ\d+/PRO\d+", r"^KIAA\d+"]
            .iter()
            .map(|p| Regex::new(p).expect("valid regex"))
            .collect()
    })
}

/// True when a gene name ends with a number (optionally followed by a
/// letter and further digits), suggesting membership of a numbered family.
pub(crate) fn is_systematic_family_name(gene: &str) -> bool {
    static SUFFIX_RE: OnceLock<Regex> = OnceLock::new();
    let re = SUFFIX_RE.get_or_init(|| Regex::new(r"\d+[A-Za-z]?\d*$").expect("valid regex"));

    if excluded_name_res().iter().any(|p| p.is_match(gene)) {
        return false;
    }
    re.is_match(gene)
}

/// Strips a trailing numeric (optionally typed) suffix from a synonym and
/// returns the family stem, or `None` when the name has no such suffix.
pub(crate) fn root_of(synonym: &str) -> Option<String> {
    static ROOT_RE: OnceLock<Regex> = OnceLock::new();
    let re = ROOT_RE.get_or_init(|| {
        Regex::new(r"(?i)^(.+?)[\s,‑–—-]*(?:type\s*)?\d+[a-z]?[\s\d,‑–—-]*$")
            .expect("valid regex")
    });

    if excluded_name_res().iter().any(|p| p.is_match(synonym)) {
        return None;
    }
    if synonym.to_lowercase().starts_with("type") {
        return None;
    }

    re.captures(synonym)
        .map(|caps| caps[1].trim_matches([',', '-', ' ']).to_string())
        .filter(|root| !root.is_empty())
}

/// Root phrases occurring more than once among a wildcard gene's synonyms.
pub(crate) fn recurrent_roots(synonyms: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for syn in synonyms {
        if let Some(root) = root_of(syn) {
            let count = counts.entry(root.clone()).or_insert(0);
            if *count == 0 {
                order.push(root);
            }
            *count += 1;
        }
    }
    order.retain(|root| counts[root] > 1);
    order
}

/// Maps each root to the suffix remainders left after removing the root from
/// every synonym that contains it ("ABC1" minus root "ABC" leaves "1").
pub(crate) fn roots_and_remainders(roots: &[String], synonyms: &[String]) -> Vec<FamilyRoot> {
    let mut families: Vec<FamilyRoot> = Vec::new();
    for root in roots {
        let mut remainders: Vec<String> = Vec::new();
        for syn in synonyms {
            if syn.contains(root.as_str()) {
                let remainder = syn.replace(root.as_str(), "").trim().to_string();
                if !remainder.is_empty() && !remainders.contains(&remainder) {
                    remainders.push(remainder);
                }
            }
        }
        if !remainders.is_empty() {
            families.push(FamilyRoot {
                root: root.clone(),
                remainders,
            });
        }
    }
    families
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numbered_names_look_systematic() {
        assert!(is_systematic_family_name("ADAMTS5"));
        assert!(is_systematic_family_name("COL4A1"));
        assert!(!is_systematic_family_name("BRCA"));
    }

    #[test]
    fn catalog_identifiers_are_not_families() {
        assert!(!is_systematic_family_name("C11orf22"));
        assert!(!is_systematic_family_name("UNQ473/PRO836"));
        assert!(!is_systematic_family_name("KIAA0366"));
    }

    #[test]
    fn root_strips_trailing_number() {
        assert_eq!(root_of("ADAMTS5").as_deref(), Some("ADAMTS"));
        assert_eq!(root_of("ABC1").as_deref(), Some("ABC"));
        assert_eq!(root_of("aggrecanase-2").as_deref(), Some("aggrecanase"));
    }

    #[test]
    fn root_rejects_type_prefixed_and_catalog_names() {
        assert_eq!(root_of("type 2 collagen"), None);
        assert_eq!(root_of("C11orf22"), None);
        assert_eq!(root_of("BRCA"), None);
    }

    #[test]
    fn recurrent_roots_require_more_than_one_member() {
        let roots = recurrent_roots(&strings(&["ABC1", "ABC2", "XYZ7"]));
        assert_eq!(roots, strings(&["ABC"]));
    }

    #[test]
    fn remainders_are_the_non_root_parts() {
        let families = roots_and_remainders(
            &strings(&["ABC"]),
            &strings(&["ABC1", "ABC2", "unrelated"]),
        );
        assert_eq!(
            families,
            vec![FamilyRoot {
                root: "ABC".into(),
                remainders: strings(&["1", "2"]),
            }]
        );
    }

    #[test]
    fn roots_with_no_remainders_are_dropped() {
        let families = roots_and_remainders(&strings(&["ABC"]), &strings(&["ABC"]));
        assert!(families.is_empty());
    }
}
