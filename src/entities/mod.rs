//! Entity-level search workflows driven by the CLI.

use serde::Serialize;

use crate::transform::document::DocumentRecord;

pub(crate) mod search;

/// One gene to search: identifier, identifier type, organism and optional
/// per-row keywords.
#[derive(Debug, Clone)]
pub(crate) struct GeneRow {
    /// Unique key used for report naming.
    pub key: String,
    pub gene_id: String,
    pub id_type: String,
    pub tax_id: String,
    pub keywords: Option<String>,
}

/// Result-count estimate, capped at the reporting ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResultTally {
    Exact(usize),
    Over(usize),
}

impl std::fmt::Display for ResultTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultTally::Exact(n) => write!(f, "{n}"),
            ResultTally::Over(ceiling) => write!(f, "over {ceiling}"),
        }
    }
}

impl Serialize for ResultTally {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything report generation needs for one searched entity.
#[derive(Debug, Serialize)]
pub(crate) struct SearchResultSet {
    pub key: String,
    pub gene_name: String,
    /// Human-readable list of the non-gene terms this search combined.
    pub search_terms: String,
    /// Executed query strings, for audit display.
    pub queries: Vec<String>,
    /// Synonyms actually searched for this entity (gene synonyms, family
    /// roots and keyword synonyms).
    pub synonyms_searched: Vec<String>,
    pub tally: ResultTally,
    pub documents: Vec<DocumentRecord>,
}

#[cfg(test)]
mod tests {
    use super::ResultTally;

    #[test]
    fn tally_renders_capped_counts() {
        assert_eq!(ResultTally::Exact(12).to_string(), "12");
        assert_eq!(ResultTally::Over(1000).to_string(), "over 1000");
    }

    #[test]
    fn tally_serializes_as_display_string() {
        let json = serde_json::to_string(&ResultTally::Over(1000)).unwrap();
        assert_eq!(json, "\"over 1000\"");
    }
}
