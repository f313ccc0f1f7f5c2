//! Boolean query segments and their size estimation.
//!
//! Each user term contributes one segment: an OR of field-qualified synonym
//! phrases. Segments are ANDed together into final queries by the packer.

use tracing::error;

use crate::utils::query::form_encoded_len;

pub(crate) mod packer;

/// Engine request ceiling (~8000 encoded characters) minus a safety margin
/// for the base URL and fixed parameters.
pub(crate) const MAX_ENCODED_QUERY_LEN: usize = 7500;

/// The settings segment cannot be split, so it carries its own hard cap.
pub(crate) const MAX_OTHERS_LEN: usize = 4500;

/// Estimated overhead per segment for surrounding brackets, spaces and the
/// joining ampersand.
const SEGMENT_JOIN_OVERHEAD: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Genes,
    Diseases,
    Tissues,
    Keyword(usize),
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentKind::Genes => write!(f, "genes"),
            SegmentKind::Diseases => write!(f, "diseases"),
            SegmentKind::Tissues => write!(f, "tissues"),
            SegmentKind::Keyword(n) => write!(f, "keyword {n}"),
        }
    }
}

/// One splittable query segment: a named synonym list plus how its terms are
/// field-qualified.
#[derive(Debug, Clone)]
pub(crate) struct QuerySegment {
    pub kind: SegmentKind,
    pub synonyms: Vec<String>,
    /// Family-root wildcard terms skip the keyword field.
    pub search_in_keywords: bool,
}

impl QuerySegment {
    pub(crate) fn new(kind: SegmentKind, synonyms: Vec<String>) -> Self {
        Self {
            kind,
            synonyms,
            search_in_keywords: true,
        }
    }

    pub(crate) fn without_keyword_field(kind: SegmentKind, synonyms: Vec<String>) -> Self {
        Self {
            kind,
            synonyms,
            search_in_keywords: false,
        }
    }

    pub(crate) fn expression(&self) -> String {
        join_or(&self.synonyms, self.search_in_keywords)
    }

    pub(crate) fn encoded_len(&self) -> usize {
        estimate_encoded_len(&self.expression())
    }
}

/// Field-qualifies one synonym for title/keyword/abstract matching.
pub(crate) fn field_qualified(synonym: &str, search_in_keywords: bool) -> String {
    if search_in_keywords {
        format!("TITLE:\"{synonym}\" OR KW:\"{synonym}\" OR ABSTRACT:\"{synonym}\"")
    } else {
        format!("TITLE:\"{synonym}\" OR ABSTRACT:\"{synonym}\"")
    }
}

/// Joins synonyms into one parenthesized OR expression.
pub(crate) fn join_or(synonyms: &[String], search_in_keywords: bool) -> String {
    let parts: Vec<String> = synonyms
        .iter()
        .map(|syn| field_qualified(syn, search_in_keywords))
        .collect();
    format!("({})", parts.join(" OR "))
}

/// Estimated encoded length of a segment expression, including join
/// overhead. Empty expressions cost nothing.
pub(crate) fn estimate_encoded_len(expression: &str) -> usize {
    if expression.is_empty() || expression == "()" {
        return 0;
    }
    form_encoded_len(expression) + SEGMENT_JOIN_OVERHEAD
}

/// Renders the non-splittable settings segment from field/value pairs.
///
/// A settings string over its cap cannot be split into multiple queries, so
/// it is dropped entirely (with an error log) rather than truncated.
pub(crate) fn others_expression(fields: &[(String, String)]) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let joined = fields
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join(" & ");
    if joined.len() > MAX_OTHERS_LEN {
        error!(
            len = joined.len(),
            "The string of settings was too long to produce a query; no \
             settings will be included. Remove some settings to include them"
        );
        return None;
    }
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn field_qualification_covers_title_keywords_and_abstract() {
        assert_eq!(
            field_qualified("ADAMTS 5", true),
            "TITLE:\"ADAMTS 5\" OR KW:\"ADAMTS 5\" OR ABSTRACT:\"ADAMTS 5\""
        );
        assert_eq!(
            field_qualified("ADAMTS*", false),
            "TITLE:\"ADAMTS*\" OR ABSTRACT:\"ADAMTS*\""
        );
    }

    #[test]
    fn join_or_wraps_the_whole_expression() {
        let expr = join_or(&strings(&["a1", "b2"]), true);
        assert!(expr.starts_with("(TITLE:\"a1\""));
        assert!(expr.contains("\" OR TITLE:\"b2\""));
        assert!(expr.ends_with("ABSTRACT:\"b2\")"));
    }

    #[test]
    fn empty_expression_estimates_zero() {
        assert_eq!(estimate_encoded_len(""), 0);
        assert_eq!(estimate_encoded_len("()"), 0);
        assert!(estimate_encoded_len("(TITLE:\"x\")") > 0);
    }

    #[test]
    fn others_expression_joins_fields() {
        let fields = vec![
            ("PUB_YEAR".to_string(), "2020".to_string()),
            ("OPEN_ACCESS".to_string(), "y".to_string()),
        ];
        assert_eq!(
            others_expression(&fields).as_deref(),
            Some("PUB_YEAR:2020 & OPEN_ACCESS:y")
        );
    }

    #[test]
    fn oversized_others_expression_is_dropped() {
        let fields = vec![("LONG".to_string(), "x".repeat(MAX_OTHERS_LEN))];
        assert_eq!(others_expression(&fields), None);
    }
}
