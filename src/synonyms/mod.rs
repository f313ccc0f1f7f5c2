//! Synonym resolution: ontology lookups, identifier mapping, and the
//! cleaning/expansion pipeline that turns raw candidate names into a
//! searchable synonym set.

use std::sync::OnceLock;

use futures::StreamExt;
use futures::stream;
use regex::Regex;
use tracing::{info, warn};

use crate::error::LitScoutError;
use crate::sources::ols::{OGG_HUMAN_ROOT, OlsClient, OlsSearchSettings, OlsTerm, OlsTermsPage};
use crate::sources::uniprot::UniProtClient;
use crate::tables::{anatomy, noise};

pub(crate) mod clean;
pub(crate) mod expand;
pub(crate) mod family;

/// Cleaned gene synonym counts above this suggest ontology noise.
const NOISY_GENE_SYNONYM_COUNT: usize = 30;

/// Keywords expanding beyond this many synonyms fall back to the keyword
/// alone.
const NOISY_KEYWORD_SYNONYM_COUNT: usize = 100;

/// Ontology result pages holding more than this many nodes slow the run down
/// noticeably.
const LARGE_PAGE_ELEMENT_COUNT: u64 = 50;

/// OLS annotation keys that can carry alternate names.
const RELEVANT_ANNOTATION_KEYS: &[&str] = &[
    "has_related_synonym",
    "alternative term",
    "comment",
    "description",
    "symbol from nomenclature authority",
    "hasExactSynonym",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TermKind {
    Gene,
    Disease,
    Tissue,
    Keyword,
}

/// A cleaned, deduplicated set of search synonyms for one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SynonymSet {
    original: String,
    synonyms: Vec<String>,
}

impl SynonymSet {
    pub(crate) fn new(original: impl Into<String>, synonyms: Vec<String>) -> Self {
        Self {
            original: original.into(),
            synonyms,
        }
    }

    pub(crate) fn original(&self) -> &str {
        &self.original
    }

    pub(crate) fn synonyms(&self) -> &[String] {
        &self.synonyms
    }

    pub(crate) fn len(&self) -> usize {
        self.synonyms.len()
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.synonyms
    }
}

/// Runs the full cleaning and expansion pipeline over raw candidates.
///
/// Idempotent: feeding the output back in produces the same set.
pub(crate) fn clean_synonym_list(
    candidates: &[String],
    original: &str,
    kind: TermKind,
) -> SynonymSet {
    let filtered = clean::remove_noise_and_punctuation(candidates, original, kind);
    let non_redundant = clean::remove_redundant(filtered);
    let typed = expand::expand_types(non_redundant);
    let chained = expand::strip_trailing_chain(typed);
    let greeked = expand::expand_greek_letters(chained);
    let spaced = expand::add_space_before_numbers(greeked);
    let unspaced = expand::remove_space_before_numbers(spaced);

    let mut collapsed: Vec<String> = Vec::new();
    for syn in unspaced {
        let flat = clean::collapse_spaces(&syn);
        if !flat.is_empty() && !collapsed.contains(&flat) {
            collapsed.push(flat);
        }
    }

    SynonymSet::new(original, clean::remove_redundant(collapsed))
}

/// Gene-specific final pass: common-abbreviation noise, stop-word edges and
/// short fragments are removed, and the original identifier is re-inserted.
pub(crate) fn final_gene_clean(gene: &str, candidates: &[String]) -> SynonymSet {
    static CODE_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    static VL_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    let code_number = CODE_NUMBER_RE.get_or_init(|| {
        Regex::new(r"(?i)^([A-Za-z]|CI|CD|CT|CRP|PP|LAG|PER|period|TC|UP) \d+\s?\d*$")
            .expect("valid regex")
    });
    let vl_number = VL_NUMBER_RE
        .get_or_init(|| Regex::new(r"^[vVlL]\d+\s?\d*$").expect("valid regex"));

    let cleaned = clean_synonym_list(candidates, gene, TermKind::Gene);

    let mut filtered: Vec<String> = vec![gene.to_string()];
    for syn in cleaned.synonyms() {
        if syn == gene {
            continue;
        }
        if syn.len() <= 2 {
            continue;
        }
        if code_number.is_match(syn) || vl_number.is_match(syn) {
            continue;
        }
        if noise::is_common_gene_noise(syn) {
            continue;
        }
        let lower = crate::tables::greek::normalize_hyphens(&syn.to_lowercase());
        let words: Vec<&str> = lower.split_whitespace().collect();
        let first = words.first().copied().unwrap_or_default();
        let last = words.last().copied().unwrap_or_default();
        if noise::is_stop_word(first) || noise::is_stop_word(last) {
            continue;
        }
        filtered.push(syn.clone());
    }

    SynonymSet::new(gene, filtered)
}

fn ols_settings_for(kind: TermKind, wildcard: bool, human_only: bool) -> OlsSearchSettings {
    match kind {
        TermKind::Gene => OlsSearchSettings {
            ontology: Some("ogg"),
            exact: !wildcard,
            rows: Some(2000),
            all_children_of: human_only.then_some(OGG_HUMAN_ROOT),
        },
        TermKind::Disease => OlsSearchSettings {
            ontology: Some("mondo"),
            ..Default::default()
        },
        TermKind::Tissue => OlsSearchSettings {
            ontology: Some("uberon"),
            exact: true,
            ..Default::default()
        },
        TermKind::Keyword => OlsSearchSettings {
            exact: true,
            ..Default::default()
        },
    }
}

/// Pulls candidate synonym strings out of one ontology term record.
fn extract_candidates(term: &OlsTerm) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    if let Some(synonyms) = &term.synonyms {
        out.extend(synonyms.iter().cloned());
    }
    if let Some(label) = &term.label {
        if !label.is_empty() {
            out.push(label.clone());
        }
    }

    for key in RELEVANT_ANNOTATION_KEYS {
        let Some(value) = term.annotation.get(*key) else {
            continue;
        };
        let entries: Vec<&str> = match value {
            serde_json::Value::Array(items) => {
                items.iter().filter_map(|v| v.as_str()).collect()
            }
            serde_json::Value::String(s) => vec![s.as_str()],
            _ => Vec::new(),
        };
        for entry in entries {
            if let Some(rest) = entry.strip_prefix("Other designations:") {
                for designation in rest.split('|') {
                    let designation = designation.trim();
                    if !designation.is_empty() {
                        out.push(designation.to_string());
                    }
                }
            } else {
                out.push(entry.to_string());
            }
        }
    }

    out
}

/// Extracts candidates from a page and every page linked after it. Returns
/// the OBO identifiers seen on the first page (used for descendant lookups).
async fn harvest_term_pages(
    ols: &OlsClient,
    term: &str,
    first: OlsTermsPage,
    candidates: &mut Vec<String>,
) -> Result<Vec<String>, LitScoutError> {
    let mut obo_ids: Vec<String> = Vec::new();
    let mut page = first;
    loop {
        if page.page_number() == Some(0) {
            if let Some(total) = page.total_elements() {
                if total > LARGE_PAGE_ELEMENT_COUNT {
                    warn!(
                        term,
                        total,
                        "Many elements in one synonym search result; this may \
                         cause a longer than usual running time"
                    );
                }
            }
        }

        let terms = page.terms();
        if terms.is_empty() {
            match page.total_elements() {
                Some(0) | None => info!(term, "No synonyms found on page"),
                Some(_) => warn!(
                    term,
                    "Unexpected values in ontology response; no synonyms obtained \
                     from this page"
                ),
            }
        }
        for t in terms {
            candidates.extend(extract_candidates(t));
            if let Some(obo_id) = &t.obo_id {
                if !obo_ids.contains(obo_id) {
                    obo_ids.push(obo_id.clone());
                }
            }
        }

        let next = page.next_url().map(str::to_string);
        match next {
            Some(url) => page = ols.terms_page_at(&url).await?,
            None => break,
        }
    }
    Ok(obo_ids)
}

/// Fetches every matched node's term record (concurrently when more than one
/// node matched) and, for anatomy terms, their hierarchical descendants.
async fn collect_candidates_for_iris(
    ols: &OlsClient,
    term: &str,
    iris: &[String],
    jobs: usize,
    with_descendants: bool,
) -> Result<Vec<String>, LitScoutError> {
    let mut candidates: Vec<String> = Vec::new();
    let mut obo_ids: Vec<String> = Vec::new();

    let mut pages = stream::iter(iris.iter().cloned())
        .map(|iri| async move { ols.terms_for_iri(&iri).await })
        .buffer_unordered(jobs.max(1));

    let mut first_pages: Vec<OlsTermsPage> = Vec::new();
    while let Some(page) = pages.next().await {
        first_pages.push(page?);
    }
    drop(pages);

    for page in first_pages {
        let ids = harvest_term_pages(ols, term, page, &mut candidates).await?;
        for id in ids {
            if !obo_ids.contains(&id) {
                obo_ids.push(id);
            }
        }
    }

    if with_descendants {
        for obo_id in obo_ids {
            let page = ols.uberon_descendants(&obo_id).await?;
            harvest_term_pages(ols, term, page, &mut candidates).await?;
        }
    }

    Ok(candidates)
}

/// Resolves and cleans synonyms for a disease, tissue or keyword term.
pub(crate) async fn resolve_term_synonyms(
    ols: &OlsClient,
    term: &str,
    kind: TermKind,
    jobs: usize,
) -> Result<SynonymSet, LitScoutError> {
    info!(term, "Collecting synonyms");
    let settings = ols_settings_for(kind, false, false);
    let iris = ols.search_node_iris(term, &settings).await?;
    info!(term, nodes = iris.len(), "Found ontology nodes");

    let mut candidates =
        collect_candidates_for_iris(ols, term, &iris, jobs, kind == TermKind::Tissue).await?;

    if kind == TermKind::Tissue {
        // generic anatomy names also search as their qualified region phrases
        let pre_cleaned =
            clean::remove_noise_and_punctuation(&candidates, term, TermKind::Tissue);
        for syn in &pre_cleaned {
            if let Some(qualifiers) = anatomy::qualifiers_for(syn) {
                candidates.extend(qualifiers.iter().map(|q| q.to_string()));
            }
        }
    }

    let set = clean_synonym_list(&candidates, term, kind);
    info!(term, count = set.len(), "Done cleaning synonyms");
    Ok(set)
}

/// Per-keyword synonym lists for a comma-separated keyword string.
///
/// Expansion is optional; a keyword that balloons past the noise threshold is
/// searched verbatim instead.
pub(crate) async fn resolve_keyword_lists(
    ols: &OlsClient,
    keywords: &str,
    expand: bool,
    jobs: usize,
) -> Result<Vec<(String, Vec<String>)>, LitScoutError> {
    let mut kwds: Vec<String> = Vec::new();
    for kwd in keywords.split(',') {
        let kwd = kwd.trim().to_string();
        if !kwd.is_empty() && !kwds.contains(&kwd) {
            kwds.push(kwd);
        }
    }

    let mut lists: Vec<(String, Vec<String>)> = Vec::new();
    for kwd in kwds {
        if !expand {
            lists.push((kwd.clone(), vec![kwd]));
            continue;
        }
        let set = resolve_term_synonyms(ols, &kwd, TermKind::Keyword, jobs).await?;
        if set.len() > NOISY_KEYWORD_SYNONYM_COUNT {
            warn!(
                keyword = kwd.as_str(),
                count = set.len(),
                "Noise suspected: too many synonyms for keyword; only the \
                 supplied keyword will be searched"
            );
            lists.push((kwd.clone(), vec![kwd]));
        } else {
            lists.push((kwd, set.into_vec()));
        }
    }
    Ok(lists)
}

/// Cleaned gene synonyms plus the family roots derived from them.
#[derive(Debug, Clone)]
pub(crate) struct GeneSynonymResolution {
    pub synonyms: SynonymSet,
    pub family_roots: Vec<String>,
}

/// Resolves gene synonyms: identifier mapping first, then ontology lookups
/// for each mapped name, then cleaning and family-root derivation.
///
/// A mapping-service failure or empty mapping degrades to the supplied
/// identifier rather than failing the gene's search.
pub(crate) async fn resolve_gene_synonyms(
    ols: &OlsClient,
    uniprot: &UniProtClient,
    gene_id: &str,
    id_type: &str,
    tax_id: &str,
    jobs: usize,
) -> Result<GeneSynonymResolution, LitScoutError> {
    let wildcard = gene_id.contains('*');
    if wildcard {
        warn!(
            gene = gene_id,
            "Identifier is a wildcard: searching may take longer than usual"
        );
    }

    let mut mapped_names = match uniprot.gene_names(id_type, gene_id, tax_id).await {
        Ok(names) => names,
        Err(err) => {
            warn!(
                gene = gene_id,
                error = %err,
                "Unable to collect gene names from the identifier-mapping \
                 service; continuing with the supplied identifier"
            );
            Vec::new()
        }
    };
    let mapping_found = !mapped_names.is_empty();
    if !mapped_names.contains(&gene_id.to_string()) {
        mapped_names.insert(0, gene_id.to_string());
    }

    let human_only = tax_id == "9606";
    let mut all_iris: Vec<String> = Vec::new();
    let mut family_roots: Vec<String> = Vec::new();
    for name in &mapped_names {
        let settings = ols_settings_for(TermKind::Gene, wildcard || name.contains('*'), human_only);
        let iris = ols.search_node_iris(name, &settings).await?;
        if iris.is_empty() && !mapping_found {
            warn!(
                name = name.as_str(),
                "No synonyms found in the identifier mapping or the gene \
                 ontology; check this entry for mistakes"
            );
        }
        for iri in iris {
            if !all_iris.contains(&iri) {
                all_iris.push(iri);
            }
        }

        if family::is_systematic_family_name(name) {
            if let Some(root) = family::root_of(name) {
                if !family_roots.contains(&root) {
                    family_roots.push(root);
                }
            }
        }
    }

    let candidates = collect_candidates_for_iris(ols, gene_id, &all_iris, jobs, false).await?;
    let mut cleaned = clean_synonym_list(&candidates, gene_id, TermKind::Gene).into_vec();
    if cleaned.len() > NOISY_GENE_SYNONYM_COUNT {
        warn!(
            gene = gene_id,
            count = cleaned.len(),
            "Many synonyms found; check the associated search results for noise"
        );
    }

    if wildcard {
        info!(gene = gene_id, "Adding synonym roots for the wildcard identifier");
        let roots = family::recurrent_roots(&cleaned);
        cleaned.extend(roots);
    }

    let synonyms = final_gene_clean(gene_id, &cleaned);

    let family_roots = if family_roots.is_empty() {
        family_roots
    } else {
        info!(
            gene = gene_id,
            "One or more synonyms look like members of a systematically named \
             gene family"
        );
        let mut cleaned_roots =
            clean_synonym_list(&family_roots, gene_id, TermKind::Gene).into_vec();
        cleaned_roots.retain(|r| r != gene_id);
        cleaned_roots
    };

    Ok(GeneSynonymResolution {
        synonyms,
        family_roots,
    })
}
