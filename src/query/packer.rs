//! Packs query segments into one or more final queries under the engine's
//! encoded-length ceiling.
//!
//! When the segments fit, one query joins them all. Otherwise the largest
//! segments are split into fixed-budget chunks of synonyms and the cartesian
//! product of the chunks is emitted, so that any document matching one
//! synonym from each segment is still captured by at least one query.

use itertools::Itertools;
use tracing::{info, warn};

use crate::query::{MAX_ENCODED_QUERY_LEN, QuerySegment, estimate_encoded_len, join_or};
use crate::utils::query::form_encoded_len;

/// Reserved headroom that must remain for the query itself after accounting
/// for the segments kept whole.
const KEEP_POOL_RESERVE: usize = 500;

/// Safety slack when deciding whether everything fits in a single query.
const SINGLE_QUERY_SLACK: usize = 20;

/// Estimated encoded cost of adding one synonym to a chunk: the synonym
/// appears three times (title, keyword, abstract) plus field names, quotes
/// and OR joiners.
fn synonym_cost(synonym: &str) -> usize {
    form_encoded_len(synonym) * 3 + 62
}

/// Greedily packs a segment's synonyms into OR-expression chunks whose
/// encoded length stays within `budget`. A synonym that cannot fit in an
/// empty chunk is excluded with a warning.
fn chunk_synonyms(segment: &QuerySegment, budget: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for synonym in &segment.synonyms {
        let cost = synonym_cost(synonym);
        if cost > budget {
            warn!(
                segment = %segment.kind,
                synonym = synonym.as_str(),
                "Synonym is too long and will be excluded from the queries"
            );
            continue;
        }
        if !current.is_empty() {
            let current_len = form_encoded_len(&join_or(&current, segment.search_in_keywords));
            if current_len + cost > budget {
                chunks.push(join_or(&current, segment.search_in_keywords));
                current.clear();
            }
        }
        current.push(synonym.clone());
    }
    if !current.is_empty() {
        chunks.push(join_or(&current, segment.search_in_keywords));
    }
    chunks
}

/// Builds the final query list for the given segments and settings string.
///
/// Every returned query estimates at or under the encoded ceiling, and the
/// union of the queries covers the full cross-segment synonym combination
/// space (minus individually over-length synonyms).
pub(crate) fn pack(segments: &[QuerySegment], others: Option<&str>) -> Vec<String> {
    let others_len = others.map(estimate_encoded_len).unwrap_or(0);
    let budget = MAX_ENCODED_QUERY_LEN.saturating_sub(others_len);

    let populated: Vec<&QuerySegment> = segments
        .iter()
        .filter(|seg| !seg.synonyms.is_empty())
        .collect();
    if populated.is_empty() {
        return others
            .filter(|o| !o.is_empty())
            .map(|o| vec![o.to_string()])
            .unwrap_or_default();
    }

    let total: usize = populated.iter().map(|seg| seg.encoded_len()).sum();
    if total + SINGLE_QUERY_SLACK <= budget {
        let mut parts: Vec<String> = populated.iter().map(|seg| seg.expression()).collect();
        if let Some(other) = others.filter(|o| !o.is_empty()) {
            parts.push(other.to_string());
        }
        return vec![parts.join(" & ")];
    }

    info!("Query would be too long; creating multiple shorter queries");

    // Drain the largest segments out of the fits-whole pool until what
    // remains leaves real headroom for the split chunks.
    let mut keep: Vec<&QuerySegment> = populated.clone();
    let mut split: Vec<&QuerySegment> = Vec::new();
    while !keep.is_empty()
        && keep.iter().map(|seg| seg.encoded_len()).sum::<usize>()
            > budget.saturating_sub(KEEP_POOL_RESERVE)
    {
        let (largest_idx, _) = keep
            .iter()
            .enumerate()
            .max_by_key(|(_, seg)| seg.encoded_len())
            .expect("keep is non-empty");
        split.push(keep.remove(largest_idx));
    }

    let keep_total: usize = keep.iter().map(|seg| seg.encoded_len()).sum();
    let est_total = keep_total + keep.len() * 10;
    let chunk_budget = budget
        .saturating_sub(est_total)
        .checked_div(split.len())
        .unwrap_or(0)
        .saturating_sub(100);

    let mut chunk_lists: Vec<Vec<String>> = Vec::new();
    for segment in &split {
        let chunks = chunk_synonyms(segment, chunk_budget);
        if chunks.is_empty() {
            warn!(
                segment = %segment.kind,
                "Every synonym in this segment exceeded the chunk budget; the \
                 segment is excluded from the queries"
            );
            continue;
        }
        chunk_lists.push(chunks);
    }

    let mut consistent_parts: Vec<String> = keep
        .iter()
        .map(|seg| seg.expression())
        .filter(|expr| !expr.is_empty() && expr != "()")
        .collect();
    if let Some(other) = others.filter(|o| !o.is_empty()) {
        consistent_parts.push(other.to_string());
    }
    let consistent = consistent_parts.join(" & ");

    if chunk_lists.is_empty() {
        return if consistent.is_empty() {
            Vec::new()
        } else {
            vec![consistent]
        };
    }

    let mut queries: Vec<String> = Vec::new();
    for combo in chunk_lists.iter().multi_cartesian_product() {
        let mut parts: Vec<String> = combo.iter().map(|chunk| (*chunk).clone()).collect();
        if !consistent.is_empty() {
            parts.push(consistent.clone());
        }
        queries.push(parts.join(" & "));
    }

    info!(count = queries.len(), "Built final queries");
    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SegmentKind;

    fn segment(kind: SegmentKind, count: usize, stem: &str) -> QuerySegment {
        let synonyms = (0..count).map(|i| format!("{stem} {i}")).collect();
        QuerySegment::new(kind, synonyms)
    }

    fn covered_synonyms(queries: &[String], segment: &QuerySegment) -> Vec<String> {
        segment
            .synonyms
            .iter()
            .filter(|syn| {
                queries
                    .iter()
                    .any(|q| q.contains(&format!("TITLE:\"{syn}\"")))
            })
            .cloned()
            .collect()
    }

    #[test]
    fn small_segments_pack_into_a_single_query() {
        let genes = segment(SegmentKind::Genes, 3, "gene");
        let diseases = segment(SegmentKind::Diseases, 3, "disease");
        let tissues = segment(SegmentKind::Tissues, 3, "tissue");

        let queries = pack(&[genes, diseases, tissues], None);
        assert_eq!(queries.len(), 1);
        let q = &queries[0];
        assert_eq!(q.matches(" & ").count(), 2);
        assert!(q.contains("TITLE:\"gene 0\""));
        assert!(q.contains("TITLE:\"disease 2\""));
        assert!(q.contains("TITLE:\"tissue 1\""));
    }

    #[test]
    fn others_segment_is_appended_last() {
        let genes = segment(SegmentKind::Genes, 2, "gene");
        let queries = pack(&[genes], Some("PUB_YEAR:2020"));
        assert_eq!(queries.len(), 1);
        assert!(queries[0].ends_with(" & PUB_YEAR:2020"));
    }

    #[test]
    fn oversized_segment_is_split_with_full_coverage() {
        // ~90 encoded chars per synonym expression; 200 synonyms far exceed
        // the ceiling
        let genes = segment(SegmentKind::Genes, 200, "synonym-number");
        let queries = pack(std::slice::from_ref(&genes), None);

        assert!(queries.len() >= 2, "expected a split, got {}", queries.len());
        for q in &queries {
            assert!(estimate_encoded_len(q) <= MAX_ENCODED_QUERY_LEN);
        }
        assert_eq!(covered_synonyms(&queries, &genes).len(), genes.synonyms.len());
    }

    #[test]
    fn split_emits_cartesian_product_across_split_segments() {
        let genes = segment(SegmentKind::Genes, 150, "gene-synonym-long-name");
        let diseases = segment(SegmentKind::Diseases, 150, "disease-synonym-long-name");
        let segments = vec![genes.clone(), diseases.clone()];

        let queries = pack(&segments, None);
        assert!(queries.len() >= 4);
        for q in &queries {
            assert!(estimate_encoded_len(q) <= MAX_ENCODED_QUERY_LEN);
        }
        // every synonym of both segments appears in at least one query
        assert_eq!(covered_synonyms(&queries, &genes).len(), genes.synonyms.len());
        assert_eq!(
            covered_synonyms(&queries, &diseases).len(),
            diseases.synonyms.len()
        );
        // and each query constrains both segments
        for q in &queries {
            assert!(q.contains("gene-synonym-long-name"));
            assert!(q.contains("disease-synonym-long-name"));
        }
    }

    #[test]
    fn kept_segments_appear_in_every_split_query() {
        let genes = segment(SegmentKind::Genes, 200, "gene-synonym-long-name");
        let tissues = segment(SegmentKind::Tissues, 2, "tissue");
        let queries = pack(&[genes, tissues], Some("PUB_YEAR:2021"));

        assert!(queries.len() >= 2);
        for q in &queries {
            assert!(q.contains("TITLE:\"tissue 0\""));
            assert!(q.contains("PUB_YEAR:2021"));
            assert!(estimate_encoded_len(q) <= MAX_ENCODED_QUERY_LEN);
        }
    }

    #[test]
    fn single_over_length_synonym_is_dropped_not_fatal() {
        let huge = "x".repeat(MAX_ENCODED_QUERY_LEN);
        let mut genes = segment(SegmentKind::Genes, 120, "regular-synonym-name");
        genes.synonyms.push(huge.clone());

        let queries = pack(std::slice::from_ref(&genes), None);
        assert!(!queries.is_empty());
        for q in &queries {
            assert!(!q.contains(&huge));
            assert!(estimate_encoded_len(q) <= MAX_ENCODED_QUERY_LEN);
        }
        // all other synonyms still covered
        let covered = covered_synonyms(&queries, &genes);
        assert_eq!(covered.len(), genes.synonyms.len() - 1);
    }

    #[test]
    fn empty_segments_contribute_nothing() {
        let genes = QuerySegment::new(SegmentKind::Genes, vec!["braf".into()]);
        let empty = QuerySegment::new(SegmentKind::Diseases, Vec::new());
        let queries = pack(&[genes, empty], None);
        assert_eq!(queries.len(), 1);
        assert!(!queries[0].contains(" & "));
    }
}
