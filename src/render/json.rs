use crate::entities::SearchResultSet;
use crate::error::LitScoutError;

pub(crate) fn render(results: &[SearchResultSet]) -> Result<String, LitScoutError> {
    Ok(serde_json::to_string_pretty(results)?)
}

#[cfg(test)]
mod tests {
    use super::render;
    use crate::entities::{ResultTally, SearchResultSet};

    #[test]
    fn render_includes_tally_and_documents() {
        let results = vec![SearchResultSet {
            key: "ADAMTS5".to_string(),
            gene_name: "ADAMTS5".to_string(),
            search_terms: "osteoarthritis, cartilage".to_string(),
            queries: vec!["1: (TITLE:\"ADAMTS5\")".to_string()],
            synonyms_searched: vec!["ADAMTS5".to_string(), "ADAMTS 5".to_string()],
            tally: ResultTally::Exact(0),
            documents: Vec::new(),
        }];

        let json = render(&results).unwrap();
        assert!(json.contains("\"tally\": \"0\""));
        assert!(json.contains("\"ADAMTS 5\""));
        assert!(json.contains("osteoarthritis"));
    }
}
