//! Recovers documents that reference a family member only through a shared
//! numbered list, e.g. "ADAMTS4 and 5" names ADAMTS5 without the literal
//! token ever appearing.

use regex::Regex;
use tracing::info;

use crate::synonyms::family::FamilyRoot;

/// Hyphen/dash variants and whitespace, as they may separate list tokens.
const SEPARATOR_CLASS: &str = r"[\s\-–—‑]";

fn list_pattern(root: &str, remainder: &str) -> Option<Regex> {
    let root = regex::escape(root);
    let remainder = regex::escape(remainder);
    let sep = SEPARATOR_CLASS;
    // root, optional apostrophe, digits with optional trailing letter,
    // optionally more comma-separated digit tokens, then a conjunction and
    // the target remainder
    let pattern = format!(
        "{root}'?{sep}*\\d+[a-z]?\\d*(?:{sep}*,{sep}*\\d+[a-z]?\\d*)*{sep}*(?:and|or|,)\\s{sep}*{remainder}"
    );
    Regex::new(&pattern).ok()
}

/// True when the document's title or abstract names the target gene
/// indirectly via a numbered list for one of its family roots.
pub(crate) fn references_gene_in_list(
    doc_id: &str,
    title: Option<&str>,
    abstract_text: Option<&str>,
    families: &[FamilyRoot],
) -> bool {
    let text = format!(
        "{}. {}",
        title.unwrap_or_default(),
        abstract_text.unwrap_or_default()
    )
    .to_lowercase();

    for family in families {
        let root = family.root.to_lowercase();
        if !text.contains(&root) {
            continue;
        }
        for remainder in &family.remainders {
            let remainder = remainder.to_lowercase();
            if !text.contains(&remainder) {
                continue;
            }
            if let Some(re) = list_pattern(&root, &remainder) {
                if re.is_match(&text) {
                    info!(
                        doc_id,
                        synonym = %format!("{}{}", family.root, remainder),
                        "Document contains the synonym indirectly in a list"
                    );
                    return true;
                }
            }
        }
    }
    false
}
