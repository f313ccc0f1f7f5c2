use std::fmt::Write;

use crate::entities::SearchResultSet;

/// Renders a summary table plus a per-entity result listing.
pub(crate) fn render(results: &[SearchResultSet]) -> String {
    let mut out = String::new();

    out.push_str("| Key | Gene | Search terms | Results |\n");
    out.push_str("|---|---|---|---|\n");
    for set in results {
        let terms = if set.search_terms.is_empty() {
            "-"
        } else {
            set.search_terms.as_str()
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            set.key, set.gene_name, terms, set.tally
        );
    }

    for set in results {
        let _ = write!(out, "\n## {}\n\n", set.key);
        if !set.queries.is_empty() {
            out.push_str("Queries:\n");
            for query in &set.queries {
                let _ = writeln!(out, "- `{query}`");
            }
            out.push('\n');
        }
        if set.documents.is_empty() {
            out.push_str("No documents found.\n");
            continue;
        }
        for doc in &set.documents {
            let title = doc.title.as_deref().unwrap_or("unavailable");
            let year = doc.year.as_deref().unwrap_or("unavailable");
            let _ = writeln!(out, "- {title} ({year}) <{}>", doc.url);
        }
    }

    out
}
