//! The per-entity search pipeline and the run-level fan-out across rows.
//!
//! Disease, tissue and keyword synonyms are resolved once per run; each gene
//! row then resolves its own synonyms, packs queries, harvests results and
//! returns an independent outcome. A failing row never halts its siblings —
//! the caller receives every row's `Result` and decides what to report.

use std::collections::HashSet;

use futures::StreamExt;
use futures::stream;
use tracing::info;

use crate::entities::{GeneRow, ResultTally, SearchResultSet};
use crate::error::LitScoutError;
use crate::harvest;
use crate::query::packer::pack;
use crate::query::{QuerySegment, SegmentKind, others_expression};
use crate::sources::europepmc::{EuropePmcClient, MAX_PAGE_SIZE};
use crate::sources::ols::OlsClient;
use crate::sources::uniprot::UniProtClient;
use crate::synonyms::{self, TermKind, family};

#[derive(Debug, Clone, Default)]
pub(crate) struct SearchOptions {
    pub disease: Option<String>,
    pub tissue: Option<String>,
    /// Comma-separated keywords applied to every row; per-row keywords are
    /// used only when this is absent.
    pub keywords: Option<String>,
    pub expand_keywords: bool,
    pub other_fields: Vec<(String, String)>,
    pub jobs: usize,
}

pub(crate) struct SearchContext {
    ols: OlsClient,
    uniprot: UniProtClient,
    epmc: EuropePmcClient,
    options: SearchOptions,
    disease_synonyms: Vec<String>,
    tissue_synonyms: Vec<String>,
    keyword_lists: Vec<(String, Vec<String>)>,
    others: Option<String>,
}

impl SearchContext {
    /// Builds the clients and resolves the run-constant terms (disease,
    /// tissue, global keywords, settings) before any per-row work starts.
    pub(crate) async fn initialize(options: SearchOptions) -> Result<Self, LitScoutError> {
        let ols = OlsClient::new()?;
        let uniprot = UniProtClient::new()?;
        let epmc = EuropePmcClient::new()?;
        Self::with_clients(ols, uniprot, epmc, options).await
    }

    async fn with_clients(
        ols: OlsClient,
        uniprot: UniProtClient,
        epmc: EuropePmcClient,
        options: SearchOptions,
    ) -> Result<Self, LitScoutError> {
        let jobs = options.jobs.max(1);

        let others = others_expression(&options.other_fields);

        let disease_synonyms = match &options.disease {
            Some(disease) => {
                synonyms::resolve_term_synonyms(&ols, disease, TermKind::Disease, jobs)
                    .await?
                    .into_vec()
            }
            None => Vec::new(),
        };
        let tissue_synonyms = match &options.tissue {
            Some(tissue) => {
                synonyms::resolve_term_synonyms(&ols, tissue, TermKind::Tissue, jobs)
                    .await?
                    .into_vec()
            }
            None => Vec::new(),
        };
        let keyword_lists = match &options.keywords {
            Some(keywords) => {
                synonyms::resolve_keyword_lists(&ols, keywords, options.expand_keywords, jobs)
                    .await?
            }
            None => Vec::new(),
        };

        Ok(Self {
            ols,
            uniprot,
            epmc,
            options,
            disease_synonyms,
            tissue_synonyms,
            keyword_lists,
            others,
        })
    }

    /// Runs every row with bounded concurrency and returns each row's
    /// outcome in input order.
    pub(crate) async fn run_all(
        &self,
        rows: Vec<GeneRow>,
    ) -> Vec<(GeneRow, Result<SearchResultSet, LitScoutError>)> {
        let jobs = self.options.jobs.max(1);
        let mut tasks = stream::iter(rows.into_iter().enumerate())
            .map(|(index, row)| async move {
                let outcome = self.search_row(&row).await;
                (index, row, outcome)
            })
            .buffer_unordered(jobs);

        let mut outcomes = Vec::new();
        while let Some(entry) = tasks.next().await {
            outcomes.push(entry);
        }
        drop(tasks);
        outcomes.sort_by_key(|(index, _, _)| *index);
        outcomes
            .into_iter()
            .map(|(_, row, outcome)| (row, outcome))
            .collect()
    }

    async fn keyword_lists_for_row(
        &self,
        row: &GeneRow,
    ) -> Result<Vec<(String, Vec<String>)>, LitScoutError> {
        if self.options.keywords.is_some() {
            return Ok(self.keyword_lists.clone());
        }
        match &row.keywords {
            Some(keywords) => {
                synonyms::resolve_keyword_lists(
                    &self.ols,
                    keywords,
                    self.options.expand_keywords,
                    self.options.jobs.max(1),
                )
                .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Joins the non-gene search terms into the display string reports show
    /// next to each entity.
    fn search_terms_description(&self, keywords: &[(String, Vec<String>)]) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(disease) = &self.options.disease {
            parts.push(disease.clone());
        }
        if let Some(tissue) = &self.options.tissue {
            parts.push(tissue.clone());
        }
        for (name, value) in &self.options.other_fields {
            parts.push(format!("{name} {value}"));
        }
        for (keyword, _) in keywords {
            parts.push(keyword.clone());
        }
        parts
            .into_iter()
            .map(|p| crate::synonyms::clean::collapse_spaces(&p.replace('\'', "")))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn build_segments(
        &self,
        gene_synonyms: Vec<String>,
        keywords: &[(String, Vec<String>)],
    ) -> Vec<QuerySegment> {
        let mut segments =
            vec![QuerySegment::new(SegmentKind::Genes, gene_synonyms)];
        if !self.disease_synonyms.is_empty() {
            segments.push(QuerySegment::new(
                SegmentKind::Diseases,
                self.disease_synonyms.clone(),
            ));
        }
        if !self.tissue_synonyms.is_empty() {
            segments.push(QuerySegment::new(
                SegmentKind::Tissues,
                self.tissue_synonyms.clone(),
            ));
        }
        for (n, (_, list)) in keywords.iter().enumerate() {
            segments.push(QuerySegment::new(SegmentKind::Keyword(n + 1), list.clone()));
        }
        segments
    }

    async fn search_row(&self, row: &GeneRow) -> Result<SearchResultSet, LitScoutError> {
        let jobs = self.options.jobs.max(1);
        info!(gene = row.gene_id.as_str(), "Creating query part for gene");

        let resolution = synonyms::resolve_gene_synonyms(
            &self.ols,
            &self.uniprot,
            &row.gene_id,
            &row.id_type,
            &row.tax_id,
            jobs,
        )
        .await?;

        let keyword_lists = self.keyword_lists_for_row(row).await?;
        let search_terms = self.search_terms_description(&keyword_lists);

        let gene_synonyms = resolution.synonyms.synonyms().to_vec();
        let segments = self.build_segments(gene_synonyms.clone(), &keyword_lists);
        let queries = pack(&segments, self.others.as_deref());

        // family roots get their own over-broad wildcard queries whose hits
        // must pass the indirect-list matcher
        let families = family::roots_and_remainders(&resolution.family_roots, &gene_synonyms);
        let root_queries = if families.is_empty() {
            Vec::new()
        } else {
            let root_terms: Vec<String> =
                families.iter().map(|f| format!("{}*", f.root)).collect();
            let mut root_segments = vec![QuerySegment::without_keyword_field(
                SegmentKind::Genes,
                root_terms,
            )];
            root_segments.extend(
                self.build_segments(Vec::new(), &keyword_lists)
                    .into_iter()
                    .filter(|seg| !seg.synonyms.is_empty()),
            );
            pack(&root_segments, self.others.as_deref())
        };

        info!(
            gene = row.gene_id.as_str(),
            count = queries.len(),
            "Running queries against the search service"
        );
        let primary = harvest::run_primary_queries(&self.epmc, &queries, jobs).await?;
        let mut documents = primary.documents;
        let primary_count = documents.len();

        let mut raw_count = primary_count;
        if !root_queries.is_empty() && primary_count < MAX_PAGE_SIZE {
            let known: HashSet<String> = documents.iter().map(|d| d.id.clone()).collect();
            let extra = harvest::run_family_root_queries(
                &self.epmc,
                &root_queries,
                &families,
                &known,
                &row.gene_id,
                primary_count,
                jobs,
            )
            .await?;
            raw_count += extra.len();
            documents.extend(extra);
        }

        let documents = harvest::eliminate_superseded_preprints(documents);
        let tally = if raw_count >= MAX_PAGE_SIZE {
            ResultTally::Over(MAX_PAGE_SIZE)
        } else {
            ResultTally::Exact(documents.len())
        };

        let mut synonyms_searched = gene_synonyms;
        synonyms_searched.extend(resolution.family_roots.iter().cloned());
        for (_, list) in &keyword_lists {
            for syn in list {
                if !synonyms_searched.contains(syn) {
                    synonyms_searched.push(syn.clone());
                }
            }
        }

        Ok(SearchResultSet {
            key: row.key.clone(),
            gene_name: resolution.synonyms.original().to_string(),
            search_terms,
            queries: primary.audit_queries,
            synonyms_searched,
            tally,
            documents,
        })
    }
}
