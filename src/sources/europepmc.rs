use std::borrow::Cow;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::LitScoutError;

pub(crate) const EUROPE_PMC_BASE: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest";
const EUROPE_PMC_API: &str = "europepmc";
pub(crate) const EUROPE_PMC_BASE_ENV: &str = "LITSCOUT_EPMC_BASE";

/// Engine page-size ceiling; also the reporting ceiling for result counts.
pub(crate) const MAX_PAGE_SIZE: usize = 1000;

#[derive(Clone)]
pub struct EuropePmcClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl EuropePmcClient {
    pub fn new() -> Result<Self, LitScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(EUROPE_PMC_BASE, EUROPE_PMC_BASE_ENV),
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
        let bytes = crate::sources::read_limited_body(resp, EUROPE_PMC_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(LitScoutError::Api {
                api: EUROPE_PMC_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| LitScoutError::ApiJson {
            api: EUROPE_PMC_API.to_string(),
            source,
        })
    }

    /// Runs one boolean query and returns a single page of core-format
    /// results. `cursor` continues a prior page (`None` starts from `*`).
    pub async fn search(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<EuropePmcSearchResponse, LitScoutError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LitScoutError::InvalidArgument(
                "Query is required for Europe PMC search".into(),
            ));
        }

        let url = self.endpoint("search");
        let page_size = MAX_PAGE_SIZE.to_string();
        let mut req = self.client.get(&url).query(&[
            ("query", query),
            ("resultType", "core"),
            ("pageSize", page_size.as_str()),
            ("format", "json"),
        ]);
        if let Some(mark) = cursor {
            req = req.query(&[("cursorMark", mark)]);
        }
        self.get_json(req).await
    }
}

#[derive(Debug, Deserialize)]
pub struct EuropePmcSearchResponse {
    #[serde(rename = "hitCount")]
    pub hit_count: Option<u64>,
    #[serde(rename = "nextCursorMark")]
    pub next_cursor_mark: Option<String>,
    pub request: Option<EuropePmcRequestEcho>,
    #[serde(rename = "resultList")]
    pub result_list: Option<EuropePmcResultList>,
}

impl EuropePmcSearchResponse {
    pub fn results(&self) -> &[EuropePmcResult] {
        self.result_list
            .as_ref()
            .map(|l| l.result.as_slice())
            .unwrap_or_default()
    }

    /// The query string the engine reports having executed, for audit output.
    pub fn echoed_query(&self) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|r| r.query_string.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct EuropePmcRequestEcho {
    #[serde(rename = "queryString")]
    pub query_string: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EuropePmcResultList {
    #[serde(default)]
    pub result: Vec<EuropePmcResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EuropePmcResult {
    pub id: Option<String>,
    pub source: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "pubYear")]
    pub pub_year: Option<String>,
    #[serde(rename = "authorString")]
    pub author_string: Option<String>,
    #[serde(rename = "pubTypeList")]
    pub pub_type_list: Option<EuropePmcPubTypeList>,
    #[serde(rename = "abstractText")]
    pub abstract_text: Option<String>,
    #[serde(rename = "keywordList")]
    pub keyword_list: Option<EuropePmcKeywordList>,
    #[serde(rename = "commentCorrectionList")]
    pub comment_correction_list: Option<EuropePmcCommentCorrectionList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EuropePmcPubTypeList {
    #[serde(default, rename = "pubType")]
    pub pub_type: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EuropePmcKeywordList {
    #[serde(default)]
    pub keyword: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EuropePmcCommentCorrectionList {
    #[serde(default, rename = "commentCorrection")]
    pub comment_correction: Vec<EuropePmcCommentCorrection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EuropePmcCommentCorrection {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_sets_expected_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "(TITLE:\"ADAMTS5\")"))
            .and(query_param("resultType", "core"))
            .and(query_param("pageSize", "1000"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hitCount": 1,
                "request": {"queryString": "(TITLE:\"ADAMTS5\")"},
                "resultList": {"result": [{"id": "12345", "source": "MED", "title": "A title"}]}
            })))
            .mount(&server)
            .await;

        let client = EuropePmcClient::new_for_test(server.uri()).unwrap();
        let resp = client.search("(TITLE:\"ADAMTS5\")", None).await.unwrap();
        assert_eq!(resp.hit_count, Some(1));
        assert_eq!(resp.results().len(), 1);
        assert_eq!(resp.echoed_query(), Some("(TITLE:\"ADAMTS5\")"));
    }

    #[tokio::test]
    async fn search_passes_cursor_mark() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("cursorMark", "AoIIP4AAACs0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hitCount": 0,
                "resultList": {"result": []}
            })))
            .mount(&server)
            .await;

        let client = EuropePmcClient::new_for_test(server.uri()).unwrap();
        let resp = client.search("(TITLE:\"x\")", Some("AoIIP4AAACs0")).await.unwrap();
        assert!(resp.results().is_empty());
        assert!(resp.next_cursor_mark.is_none());
    }

    #[tokio::test]
    async fn search_rejects_empty_query() {
        let client = EuropePmcClient::new_for_test("http://127.0.0.1:9".into()).unwrap();
        let err = client.search("  ", None).await.unwrap_err();
        assert!(matches!(err, LitScoutError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn search_surfaces_http_failures_as_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad query"))
            .mount(&server)
            .await;

        let client = EuropePmcClient::new_for_test(server.uri()).unwrap();
        let err = client.search("(TITLE:\"x\")", None).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("europepmc"));
        assert!(msg.contains("400"));
    }

    #[tokio::test]
    async fn comment_corrections_deserialize() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hitCount": 1,
                "resultList": {"result": [{
                    "id": "PPR123",
                    "source": "PPR",
                    "title": "Preprint title",
                    "commentCorrectionList": {"commentCorrection": [
                        {"id": "9999", "type": "Preprint of"}
                    ]}
                }]}
            })))
            .mount(&server)
            .await;

        let client = EuropePmcClient::new_for_test(server.uri()).unwrap();
        let resp = client.search("(TITLE:\"x\")", None).await.unwrap();
        let corrections = resp.results()[0]
            .comment_correction_list
            .as_ref()
            .unwrap();
        assert_eq!(
            corrections.comment_correction[0].kind.as_deref(),
            Some("Preprint of")
        );
    }
}
