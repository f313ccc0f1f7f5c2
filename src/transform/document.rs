use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::sources::europepmc::EuropePmcResult;

const ABSTRACT_URL_BASE: &str = "https://europepmc.org/abstract";

/// Comment/correction relation marking a preprint superseded by a published
/// version.
const PREPRINT_OF: &str = "Preprint of";

/// One literature search hit, reduced to the fields reports need.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DocumentRecord {
    pub id: String,
    pub source: String,
    pub title: Option<String>,
    pub year: Option<String>,
    pub authors: Option<String>,
    pub publication_types: Vec<String>,
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub url: String,
    /// Identifier of the published version this preprint precedes, dropped
    /// once redundant-preprint elimination has run.
    #[serde(skip)]
    pub preprint_of: Option<String>,
}

fn decode_html_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
}

fn strip_inline_html_tags(value: &str) -> String {
    static HTML_TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = HTML_TAG_RE.get_or_init(|| Regex::new(r"(?is)<[^>]+>").expect("valid regex"));
    re.replace_all(value, "").to_string()
}

fn clean_text(value: &str) -> Option<String> {
    let cleaned = strip_inline_html_tags(&decode_html_entities(value))
        .trim()
        .to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Builds a [`DocumentRecord`] from one raw search hit, or `None` when the
/// hit lacks an identifier.
pub(crate) fn from_europe_pmc(result: &EuropePmcResult) -> Option<DocumentRecord> {
    let id = result.id.as_deref()?.trim().to_string();
    if id.is_empty() {
        return None;
    }
    let source = result
        .source
        .as_deref()
        .unwrap_or("MED")
        .trim()
        .to_string();
    let url = format!("{ABSTRACT_URL_BASE}/{source}/{id}");

    // only preprint records carry a supersession pointer
    let preprint_of = if id.starts_with("PPR") {
        result
            .comment_correction_list
            .as_ref()
            .map(|l| l.comment_correction.as_slice())
            .unwrap_or_default()
            .iter()
            .find(|c| c.kind.as_deref() == Some(PREPRINT_OF))
            .and_then(|c| c.id.clone())
    } else {
        None
    };

    Some(DocumentRecord {
        id,
        source,
        title: result.title.as_deref().and_then(clean_text),
        year: result.pub_year.clone(),
        authors: result.author_string.clone(),
        publication_types: result
            .pub_type_list
            .as_ref()
            .map(|l| l.pub_type.clone())
            .unwrap_or_default(),
        abstract_text: result.abstract_text.as_deref().and_then(clean_text),
        keywords: result
            .keyword_list
            .as_ref()
            .map(|l| l.keyword.clone())
            .unwrap_or_default(),
        url,
        preprint_of,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: serde_json::Value) -> EuropePmcResult {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn record_carries_canonical_url() {
        let record = from_europe_pmc(&raw(serde_json::json!({
            "id": "34567",
            "source": "MED",
            "title": "A <i>title</i> with &amp; entities",
            "pubYear": "2021",
            "authorString": "Smith J, Jones K.",
        })))
        .unwrap();

        assert_eq!(record.url, "https://europepmc.org/abstract/MED/34567");
        assert_eq!(record.title.as_deref(), Some("A title with & entities"));
        assert_eq!(record.year.as_deref(), Some("2021"));
        assert!(record.preprint_of.is_none());
    }

    #[test]
    fn missing_id_yields_no_record() {
        assert!(from_europe_pmc(&raw(serde_json::json!({"title": "no id"}))).is_none());
    }

    #[test]
    fn preprint_pointer_is_read_only_for_ppr_ids() {
        let preprint = from_europe_pmc(&raw(serde_json::json!({
            "id": "PPR333",
            "source": "PPR",
            "commentCorrectionList": {"commentCorrection": [
                {"id": "111", "type": "Erratum for"},
                {"id": "222", "type": "Preprint of"}
            ]}
        })))
        .unwrap();
        assert_eq!(preprint.preprint_of.as_deref(), Some("222"));

        let published = from_europe_pmc(&raw(serde_json::json!({
            "id": "444",
            "source": "MED",
            "commentCorrectionList": {"commentCorrection": [
                {"id": "555", "type": "Preprint of"}
            ]}
        })))
        .unwrap();
        assert!(published.preprint_of.is_none());
    }

    #[test]
    fn keywords_and_pub_types_flatten() {
        let record = from_europe_pmc(&raw(serde_json::json!({
            "id": "1",
            "source": "MED",
            "pubTypeList": {"pubType": ["review", "research-article"]},
            "keywordList": {"keyword": ["Osteoarthritis", "Aggrecanase"]}
        })))
        .unwrap();
        assert_eq!(record.publication_types, vec!["review", "research-article"]);
        assert_eq!(record.keywords, vec!["Osteoarthritis", "Aggrecanase"]);
    }
}
