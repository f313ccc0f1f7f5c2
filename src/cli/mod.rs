use std::sync::OnceLock;

use clap::{Parser, Subcommand};
use regex::Regex;
use tracing::{error, warn};

use crate::entities::GeneRow;
use crate::entities::search::{SearchContext, SearchOptions};
use crate::error::LitScoutError;

#[derive(Parser, Debug)]
#[command(
    name = "litscout",
    version,
    about = "Synonym-expanded co-occurrence search of Europe PMC"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for co-occurrence of genes with a disease, tissue or keywords
    Search {
        /// Gene identifier to search (repeatable)
        #[arg(long = "gene", required = true)]
        genes: Vec<String>,

        /// Identifier type understood by the identifier-mapping service
        #[arg(long, default_value = "gene_exact")]
        id_type: String,

        /// Taxonomy identifier of the organism
        #[arg(long, default_value = "9606")]
        taxon: String,

        /// Disease term to co-search, expanded via the disease ontology
        #[arg(long)]
        disease: Option<String>,

        /// Tissue/organ term to co-search, expanded via the anatomy ontology
        #[arg(long)]
        tissue: Option<String>,

        /// Comma-separated keywords applied to every gene
        #[arg(long)]
        keywords: Option<String>,

        /// Expand keywords into their ontology synonyms
        #[arg(long)]
        expand: bool,

        /// Extra engine field filter as NAME:VALUE (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Worker count for parallel fan-outs (default: available cores)
        #[arg(long)]
        jobs: Option<usize>,

        /// Emit JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), LitScoutError> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(LitScoutError::InvalidArgument(format!(
            "Field filters must be NAME:VALUE, got '{raw}'"
        ))),
    }
}

/// Clone-based gene names and chromosome map locations are not searchable
/// identifiers; they are rejected before any network activity.
fn is_unsearchable_identifier(gene_id: &str) -> bool {
    static CLONE_NAME_RE: OnceLock<Regex> = OnceLock::new();
    static MAP_LOCATION_RE: OnceLock<Regex> = OnceLock::new();
    let clone_name = CLONE_NAME_RE
        .get_or_init(|| Regex::new(r"^[A-Z]{2,}\d{6}\.\d").expect("valid regex"));
    let map_location = MAP_LOCATION_RE
        .get_or_init(|| Regex::new(r"^\d{1,2}[pq]\d+\.?\d*").expect("valid regex"));
    clone_name.is_match(gene_id) || map_location.is_match(gene_id)
}

fn build_rows(
    genes: &[String],
    id_type: &str,
    taxon: &str,
    keywords: Option<&str>,
) -> Result<Vec<GeneRow>, LitScoutError> {
    if !taxon.chars().all(|c| c.is_ascii_digit()) || taxon.is_empty() {
        return Err(LitScoutError::InvalidArgument(format!(
            "Taxonomy identifier must be numeric, got '{taxon}'"
        )));
    }

    let mut cleaned: Vec<String> = Vec::new();
    let mut removed: Vec<String> = Vec::new();
    for gene in genes {
        let gene = gene.trim();
        if gene.is_empty() {
            continue;
        }
        if is_unsearchable_identifier(gene) {
            removed.push(gene.to_string());
            continue;
        }
        if !cleaned.contains(&gene.to_string()) {
            cleaned.push(gene.to_string());
        }
    }
    if !removed.is_empty() {
        warn!(
            genes = %removed.join(", "),
            "These identifiers will not be searched: they look like \
             clone-based gene names or gene map locations"
        );
    }
    if cleaned.is_empty() {
        return Err(LitScoutError::InvalidArgument(
            "No searchable gene identifiers remain after cleaning".into(),
        ));
    }

    let rows = cleaned
        .into_iter()
        .map(|gene_id| GeneRow {
            key: gene_id.clone(),
            gene_id,
            id_type: id_type.to_string(),
            tax_id: taxon.to_string(),
            keywords: keywords.map(str::to_string),
        })
        .collect();
    Ok(rows)
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

pub async fn run(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Commands::Search {
            genes,
            id_type,
            taxon,
            disease,
            tissue,
            keywords,
            expand,
            fields,
            jobs,
            json,
        } => {
            let other_fields = fields
                .iter()
                .map(|f| parse_field(f))
                .collect::<Result<Vec<_>, _>>()?;
            let rows = build_rows(&genes, &id_type, &taxon, keywords.as_deref())?;

            let options = SearchOptions {
                disease,
                tissue,
                keywords,
                expand_keywords: expand,
                other_fields,
                jobs: jobs.unwrap_or_else(default_jobs),
            };

            let context = SearchContext::initialize(options).await?;
            let outcomes = context.run_all(rows).await;

            let mut results = Vec::new();
            let mut failures = Vec::new();
            for (row, outcome) in outcomes {
                match outcome {
                    Ok(result_set) => results.push(result_set),
                    Err(err) => {
                        error!(
                            gene = row.gene_id.as_str(),
                            error = %err,
                            "Search failed for this gene; continuing with the rest"
                        );
                        failures.push((row.key, err));
                    }
                }
            }

            if results.is_empty() {
                if let Some((key, err)) = failures.into_iter().next() {
                    return Err(anyhow::Error::new(err)
                        .context(format!("every search failed; first failure was '{key}'")));
                }
                return Ok(String::from("No results."));
            }

            if json {
                Ok(crate::render::json::render(&results)?)
            } else {
                Ok(crate::render::markdown::render(&results))
            }
        }
    }
}
