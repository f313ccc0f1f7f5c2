use std::borrow::Cow;

use crate::error::LitScoutError;

pub(crate) const UNIPROT_BASE: &str = "https://rest.uniprot.org";
const UNIPROT_API: &str = "uniprot";
pub(crate) const UNIPROT_BASE_ENV: &str = "LITSCOUT_UNIPROT_BASE";

#[derive(Clone)]
pub struct UniProtClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl UniProtClient {
    pub fn new() -> Result<Self, LitScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(UNIPROT_BASE, UNIPROT_BASE_ENV),
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

    /// Looks up the reviewed canonical gene names for an identifier.
    ///
    /// The response is a TSV whose header row is `Gene Names` and whose body
    /// rows hold whitespace-separated names. An empty body is not an error:
    /// it simply means the mapping service knows no names for the identifier.
    pub async fn gene_names(
        &self,
        id_type: &str,
        gene_id: &str,
        tax_id: &str,
    ) -> Result<Vec<String>, LitScoutError> {
        let gene_id = gene_id.trim();
        if gene_id.is_empty() {
            return Err(LitScoutError::InvalidArgument(
                "Gene identifier is required for UniProt lookup".into(),
            ));
        }

        let query = format!("{id_type}:{gene_id} organism_id:{tax_id} reviewed:true");
        let url = self.endpoint("uniprotkb/search");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("query", query.as_str()),
                ("fields", "gene_names"),
                ("format", "tsv"),
            ])
            .send()
            .await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, UNIPROT_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(LitScoutError::Api {
                api: UNIPROT_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        Ok(parse_gene_names_tsv(&String::from_utf8_lossy(&bytes)))
    }
}

fn parse_gene_names_tsv(body: &str) -> Vec<String> {
    let mut names: Vec<String> = body
        .lines()
        .filter(|line| line.trim() != "Gene Names")
        .flat_map(|line| line.split_whitespace())
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    names
}
