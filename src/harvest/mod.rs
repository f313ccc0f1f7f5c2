//! Query execution against the search service: concurrent fan-out,
//! per-entity deduplication, family-root pagination and preprint
//! supersession.

use std::collections::HashSet;

use futures::StreamExt;
use futures::stream;
use tracing::{info, warn};

use crate::error::LitScoutError;
use crate::sources::europepmc::{EuropePmcClient, MAX_PAGE_SIZE};
use crate::synonyms::family::FamilyRoot;
use crate::transform::document::{DocumentRecord, from_europe_pmc};

pub(crate) mod listmatch;

/// Root-query hit counts above this warn about parse latency.
const LARGE_ROOT_HIT_COUNT: u64 = 5000;

#[derive(Debug)]
pub(crate) struct PrimaryHarvest {
    pub documents: Vec<DocumentRecord>,
    pub audit_queries: Vec<String>,
}

/// Executes the final queries concurrently (one page each) and assembles a
/// deduplicated document list plus the echoed query strings for audit.
pub(crate) async fn run_primary_queries(
    client: &EuropePmcClient,
    queries: &[String],
    jobs: usize,
) -> Result<PrimaryHarvest, LitScoutError> {
    let mut responses = stream::iter(queries.iter().cloned().enumerate())
        .map(|(index, query)| {
            let client = client.clone();
            async move {
                let response = client.search(&query, None).await;
                (index, query, response)
            }
        })
        .buffer_unordered(jobs.max(1));

    let mut pages = Vec::with_capacity(queries.len());
    while let Some((index, query, response)) = responses.next().await {
        pages.push((index, query, response?));
    }
    drop(responses);
    pages.sort_by_key(|(index, _, _)| *index);

    let mut audit_queries = Vec::with_capacity(pages.len());
    let mut documents: Vec<DocumentRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (index, query, page) in pages {
        let echoed = page.echoed_query().unwrap_or(query.as_str());
        info!(
            hits = page.hit_count.unwrap_or(0),
            query = echoed,
            "Results found for query"
        );
        audit_queries.push(format!("{}: {echoed}", index + 1));
        for raw in page.results() {
            if let Some(doc) = from_europe_pmc(raw) {
                if seen.insert(doc.id.clone()) {
                    documents.push(doc);
                }
            }
        }
    }

    Ok(PrimaryHarvest {
        documents,
        audit_queries,
    })
}

/// Runs the over-broad family-root queries, paginating by cursor, and keeps
/// only documents the indirect-list matcher confirms.
///
/// Documents already found by the primary queries are skipped. Querying
/// stops once the reported hit count is covered, the cursor is exhausted, or
/// the accepted total passes the reporting ceiling.
pub(crate) async fn run_family_root_queries(
    client: &EuropePmcClient,
    root_queries: &[String],
    families: &[FamilyRoot],
    known_ids: &HashSet<String>,
    gene_name: &str,
    primary_count: usize,
    jobs: usize,
) -> Result<Vec<DocumentRecord>, LitScoutError> {
    let mut streams = stream::iter(root_queries.iter().cloned())
        .map(|query| {
            let client = client.clone();
            async move {
                harvest_root_query(&client, &query, families, known_ids, gene_name, primary_count)
                    .await
            }
        })
        .buffer_unordered(jobs.max(1));

    let mut accepted: Vec<DocumentRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    while let Some(result) = streams.next().await {
        for doc in result? {
            if seen.insert(doc.id.clone()) {
                accepted.push(doc);
            }
        }
    }
    Ok(accepted)
}

async fn harvest_root_query(
    client: &EuropePmcClient,
    query: &str,
    families: &[FamilyRoot],
    known_ids: &HashSet<String>,
    gene_name: &str,
    primary_count: usize,
) -> Result<Vec<DocumentRecord>, LitScoutError> {
    let mut accepted: Vec<DocumentRecord> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages: usize = 0;
    let mut result_count = primary_count;

    loop {
        pages += 1;
        info!(query, page = pages, "Querying the search service with root query");
        let response = client.search(query, cursor.as_deref()).await?;
        let hit_count = response.hit_count.unwrap_or(0);

        if pages == 1 && hit_count > LARGE_ROOT_HIT_COUNT {
            warn!(
                gene = gene_name,
                hits = hit_count,
                "Large hit count for a synonym-root query; parsing this many \
                 documents may take several minutes"
            );
        }

        for raw in response.results() {
            let Some(doc) = from_europe_pmc(raw) else {
                continue;
            };
            if known_ids.contains(&doc.id) {
                continue;
            }
            if listmatch::references_gene_in_list(
                &doc.id,
                doc.title.as_deref(),
                doc.abstract_text.as_deref(),
                families,
            ) {
                accepted.push(doc);
                result_count += 1;
            }
        }

        if hit_count as usize <= pages * MAX_PAGE_SIZE {
            break;
        }
        if result_count > MAX_PAGE_SIZE {
            break;
        }
        match response.next_cursor_mark {
            Some(mark) => cursor = Some(mark),
            None => break,
        }
    }

    Ok(accepted)
}

/// Drops every preprint whose published version is present in the same
/// result set, and clears the supersession pointers afterwards.
pub(crate) fn eliminate_superseded_preprints(
    documents: Vec<DocumentRecord>,
) -> Vec<DocumentRecord> {
    let ids: HashSet<String> = documents.iter().map(|d| d.id.clone()).collect();
    documents
        .into_iter()
        .filter(|doc| match &doc.preprint_of {
            Some(published) => !ids.contains(published),
            None => true,
        })
        .map(|mut doc| {
            doc.preprint_of = None;
            doc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn doc(id: &str, preprint_of: Option<&str>) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            source: "MED".to_string(),
            title: None,
            year: None,
            authors: None,
            publication_types: Vec::new(),
            abstract_text: None,
            keywords: Vec::new(),
            url: format!("https://europepmc.org/abstract/MED/{id}"),
            preprint_of: preprint_of.map(str::to_string),
        }
    }

    #[test]
    fn superseded_preprint_is_dropped() {
        let kept = eliminate_superseded_preprints(vec![
            doc("PPR1", Some("100")),
            doc("100", None),
            doc("200", None),
        ]);
        let ids: Vec<&str> = kept.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["100", "200"]);
    }

    #[test]
    fn orphan_preprint_is_retained_with_pointer_cleared() {
        let kept = eliminate_superseded_preprints(vec![doc("PPR1", Some("999")), doc("100", None)]);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.preprint_of.is_none()));
    }

    #[tokio::test]
    async fn primary_queries_deduplicate_across_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "q-one"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hitCount": 2,
                "request": {"queryString": "q-one"},
                "resultList": {"result": [
                    {"id": "1", "source": "MED"},
                    {"id": "2", "source": "MED"}
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "q-two"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hitCount": 2,
                "request": {"queryString": "q-two"},
                "resultList": {"result": [
                    {"id": "2", "source": "MED"},
                    {"id": "3", "source": "MED"}
                ]}
            })))
            .mount(&server)
            .await;

        let client = EuropePmcClient::new_for_test(server.uri()).unwrap();
        let harvest = run_primary_queries(
            &client,
            &["q-one".to_string(), "q-two".to_string()],
            4,
        )
        .await
        .unwrap();

        let ids: Vec<&str> = harvest.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(
            harvest.audit_queries,
            vec!["1: q-one".to_string(), "2: q-two".to_string()]
        );
    }

    #[tokio::test]
    async fn root_queries_filter_through_the_list_matcher() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hitCount": 3,
                "resultList": {"result": [
                    {"id": "10", "source": "MED", "title": "ABC1, 2 and 3 in disease"},
                    {"id": "11", "source": "MED", "title": "ABC1 alone"},
                    {"id": "12", "source": "MED", "title": "ABC1 and 2 again"}
                ]}
            })))
            .mount(&server)
            .await;

        let families = vec![FamilyRoot {
            root: "ABC".to_string(),
            remainders: vec!["2".to_string()],
        }];
        let known: HashSet<String> = ["12".to_string()].into();

        let client = EuropePmcClient::new_for_test(server.uri()).unwrap();
        let accepted = run_family_root_queries(
            &client,
            &["root-q".to_string()],
            &families,
            &known,
            "ABC2",
            0,
            2,
        )
        .await
        .unwrap();

        let ids: Vec<&str> = accepted.iter().map(|d| d.id.as_str()).collect();
        // 10 matches the list pattern, 11 has no list, 12 was already known
        assert_eq!(ids, vec!["10"]);
    }

    #[tokio::test]
    async fn root_queries_follow_the_cursor_until_hits_are_covered() {
        let server = MockServer::start().await;
        let results: Vec<serde_json::Value> = (0..MAX_PAGE_SIZE)
            .map(|i| serde_json::json!({"id": format!("a{i}"), "source": "MED", "title": "no list"}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("cursorMark", "page-two"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hitCount": 1001,
                "resultList": {"result": [
                    {"id": "final", "source": "MED", "title": "XYZ1 and 2 listed"}
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hitCount": 1001,
                "nextCursorMark": "page-two",
                "resultList": {"result": results}
            })))
            .mount(&server)
            .await;

        let families = vec![FamilyRoot {
            root: "XYZ".to_string(),
            remainders: vec!["2".to_string()],
        }];

        let client = EuropePmcClient::new_for_test(server.uri()).unwrap();
        let accepted = run_family_root_queries(
            &client,
            &["root-q".to_string()],
            &families,
            &HashSet::new(),
            "XYZ2",
            0,
            1,
        )
        .await
        .unwrap();

        let ids: Vec<&str> = accepted.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["final"]);
    }
}
