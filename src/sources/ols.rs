use std::borrow::Cow;
use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::LitScoutError;

pub(crate) const OLS_BASE: &str = "https://www.ebi.ac.uk/ols/api";
const OLS_API: &str = "ols";
pub(crate) const OLS_BASE_ENV: &str = "LITSCOUT_OLS_BASE";

/// Node identifiers under this OBO namespace are structural roots with no
/// usable synonyms.
const EXCLUDED_IRI_FRAGMENT: &str = "/obo/BFO_0";

/// Human branch of the Ontology of Genes and Genomes.
pub(crate) const OGG_HUMAN_ROOT: &str = "http://purl.obolibrary.org/obo/OGG_2000009606";

const TERM_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Default)]
pub(crate) struct OlsSearchSettings {
    pub ontology: Option<&'static str>,
    pub exact: bool,
    pub rows: Option<usize>,
    pub all_children_of: Option<&'static str>,
}

#[derive(Clone)]
pub struct OlsClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl OlsClient {
    pub fn new() -> Result<Self, LitScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(OLS_BASE, OLS_BASE_ENV),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Result<Self, LitScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> Result<T, LitScoutError> {
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, OLS_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(LitScoutError::Api {
                api: OLS_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| LitScoutError::ApiJson {
            api: OLS_API.to_string(),
            source,
        })
    }

    /// Searches for ontology nodes matching the term and returns their IRIs,
    /// deduplicated, with structural root nodes excluded.
    ///
    /// Non-exact searches quote the whole phrase so multi-word terms match as
    /// one unit.
    pub(crate) async fn search_node_iris(
        &self,
        term: &str,
        settings: &OlsSearchSettings,
    ) -> Result<Vec<String>, LitScoutError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(LitScoutError::InvalidArgument(
                "Ontology search term is required".into(),
            ));
        }

        let q = if settings.exact {
            term.to_string()
        } else {
            format!("\"{term}\"")
        };

        let url = self.endpoint("search");
        let mut req = self.client.get(&url).query(&[("q", q.as_str())]);
        if settings.exact {
            req = req.query(&[("exact", "on")]);
        }
        if let Some(ontology) = settings.ontology {
            req = req.query(&[("ontology", ontology)]);
        }
        if let Some(rows) = settings.rows {
            req = req.query(&[("rows", rows.to_string().as_str())]);
        }
        if let Some(ancestor) = settings.all_children_of {
            req = req.query(&[("allChildrenOf", ancestor)]);
        }

        let parsed: OlsSearchResponse = self.get_json(req).await?;
        let mut iris: Vec<String> = parsed
            .response
            .map(|r| r.docs)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|doc| doc.iri)
            .filter(|iri| !iri.contains(EXCLUDED_IRI_FRAGMENT))
            .collect();
        iris.sort();
        iris.dedup();
        Ok(iris)
    }

    /// Fetches the term page for one node IRI.
    pub(crate) async fn terms_for_iri(&self, iri: &str) -> Result<OlsTermsPage, LitScoutError> {
        let url = self.endpoint("terms");
        let size = TERM_PAGE_SIZE.to_string();
        let req = self
            .client
            .get(&url)
            .query(&[("iri", iri), ("size", size.as_str())]);
        self.get_json(req).await
    }

    /// Follows an embedded pagination link verbatim.
    pub(crate) async fn terms_page_at(&self, url: &str) -> Result<OlsTermsPage, LitScoutError> {
        self.get_json(self.client.get(url)).await
    }

    /// Hierarchical descendants of an anatomy node, by OBO identifier.
    pub(crate) async fn uberon_descendants(
        &self,
        obo_id: &str,
    ) -> Result<OlsTermsPage, LitScoutError> {
        let url = self.endpoint("ontologies/uberon/hierarchicalDescendants");
        let size = TERM_PAGE_SIZE.to_string();
        let req = self
            .client
            .get(&url)
            .query(&[("id", obo_id), ("size", size.as_str())]);
        self.get_json(req).await
    }
}

#[derive(Debug, Deserialize)]
struct OlsSearchResponse {
    response: Option<OlsSearchDocs>,
}

#[derive(Debug, Deserialize)]
struct OlsSearchDocs {
    #[serde(default)]
    docs: Vec<OlsSearchDoc>,
}

#[derive(Debug, Deserialize)]
struct OlsSearchDoc {
    iri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OlsTermsPage {
    #[serde(rename = "_embedded")]
    pub embedded: Option<OlsEmbedded>,
    #[serde(rename = "_links")]
    pub links: Option<OlsLinks>,
    pub page: Option<OlsPageInfo>,
}

impl OlsTermsPage {
    pub(crate) fn terms(&self) -> &[OlsTerm] {
        self.embedded
            .as_ref()
            .map(|e| e.terms.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn next_url(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_ref())
            .map(|link| link.href.as_str())
    }

    pub(crate) fn total_elements(&self) -> Option<u64> {
        self.page.as_ref().and_then(|p| p.total_elements)
    }

    pub(crate) fn page_number(&self) -> Option<u64> {
        self.page.as_ref().and_then(|p| p.number)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OlsEmbedded {
    #[serde(default)]
    pub terms: Vec<OlsTerm>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OlsLinks {
    pub next: Option<OlsLink>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OlsLink {
    pub href: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OlsPageInfo {
    #[serde(rename = "totalElements")]
    pub total_elements: Option<u64>,
    pub number: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OlsTerm {
    pub synonyms: Option<Vec<String>>,
    pub label: Option<String>,
    pub obo_id: Option<String>,
    #[serde(default)]
    pub annotation: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_node_iris_quotes_non_exact_terms() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "\"motor neuron disease\""))
            .and(query_param("ontology", "mondo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"docs": [
                    {"iri": "http://purl.obolibrary.org/obo/MONDO_0005098"},
                    {"iri": "http://purl.obolibrary.org/obo/BFO_0000004"},
                    {"iri": "http://purl.obolibrary.org/obo/MONDO_0005098"}
                ]}
            })))
            .mount(&server)
            .await;

        let client = OlsClient::new_for_test(server.uri()).unwrap();
        let settings = OlsSearchSettings {
            ontology: Some("mondo"),
            ..Default::default()
        };
        let iris = client
            .search_node_iris("motor neuron disease", &settings)
            .await
            .unwrap();
        // deduplicated, BFO root node excluded
        assert_eq!(iris, vec!["http://purl.obolibrary.org/obo/MONDO_0005098"]);
    }

    #[tokio::test]
    async fn search_node_iris_exact_mode_sets_flag_and_skips_quoting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "cartilage"))
            .and(query_param("exact", "on"))
            .and(query_param("ontology", "uberon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"docs": []}
            })))
            .mount(&server)
            .await;

        let client = OlsClient::new_for_test(server.uri()).unwrap();
        let settings = OlsSearchSettings {
            ontology: Some("uberon"),
            exact: true,
            ..Default::default()
        };
        let iris = client.search_node_iris("cartilage", &settings).await.unwrap();
        assert!(iris.is_empty());
    }

    #[tokio::test]
    async fn terms_pagination_exposes_next_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/terms"))
            .and(query_param("iri", "http://example.org/node"))
            .and(query_param("size", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_embedded": {"terms": [{"label": "aggrecanase 2", "synonyms": ["ADAMTS5"]}]},
                "_links": {"next": {"href": format!("{}/terms?iri=x&page=1", server.uri())}},
                "page": {"totalElements": 2, "number": 0}
            })))
            .mount(&server)
            .await;

        let client = OlsClient::new_for_test(server.uri()).unwrap();
        let page = client
            .terms_for_iri("http://example.org/node")
            .await
            .unwrap();
        assert_eq!(page.terms().len(), 1);
        assert_eq!(page.total_elements(), Some(2));
        assert!(page.next_url().unwrap().contains("page=1"));
    }

    #[tokio::test]
    async fn uberon_descendants_queries_by_obo_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ontologies/uberon/hierarchicalDescendants"))
            .and(query_param("id", "UBERON:0002418"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_embedded": {"terms": [{"label": "articular cartilage"}]},
                "page": {"totalElements": 1, "number": 0}
            })))
            .mount(&server)
            .await;

        let client = OlsClient::new_for_test(server.uri()).unwrap();
        let page = client.uberon_descendants("UBERON:0002418").await.unwrap();
        assert_eq!(page.terms()[0].label.as_deref(), Some("articular cartilage"));
    }
}
