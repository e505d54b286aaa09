use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::model::Citation;

use super::claims::Claim;

/// Source-type value that disables the source filter.
pub const ALL_SOURCE_TYPES: &str = "all";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CitationSort {
    #[default]
    IdAsc,
    SourceType,
    SnippetLengthDesc,
}

#[derive(Debug, Clone)]
pub struct CitationQuery {
    pub sort_by: CitationSort,
    pub source_type: String,
    pub search: String,
    pub allow_ids: Option<HashSet<i64>>,
}

impl Default for CitationQuery {
    fn default() -> Self {
        Self {
            sort_by: CitationSort::IdAsc,
            source_type: ALL_SOURCE_TYPES.to_string(),
            search: String::new(),
            allow_ids: None,
        }
    }
}

pub fn sort_and_filter_citations(citations: &[Citation], query: &CitationQuery) -> Vec<Citation> {
    let normalized_search = query.search.trim().to_lowercase();

    let mut selected = citations
        .iter()
        .filter(|citation| matches_query(citation, query, &normalized_search))
        .cloned()
        .collect::<Vec<Citation>>();

    selected.sort_by(|left, right| compare_citations(left, right, query.sort_by));
    selected
}

fn matches_query(citation: &Citation, query: &CitationQuery, normalized_search: &str) -> bool {
    if query.source_type != ALL_SOURCE_TYPES && citation.source_type != query.source_type {
        return false;
    }

    if let Some(allow_ids) = &query.allow_ids {
        if !allow_ids.contains(&citation.id) {
            return false;
        }
    }

    if normalized_search.is_empty() {
        return true;
    }

    let corpus = format!(
        "{} {} {}",
        citation.source_type, citation.source_id, citation.snippet
    )
    .to_lowercase();
    corpus.contains(normalized_search)
}

fn compare_citations(left: &Citation, right: &Citation, sort_by: CitationSort) -> Ordering {
    match sort_by {
        CitationSort::IdAsc => left.id.cmp(&right.id),
        CitationSort::SourceType => left
            .source_type
            .cmp(&right.source_type)
            .then(left.id.cmp(&right.id)),
        CitationSort::SnippetLengthDesc => right
            .snippet
            .chars()
            .count()
            .cmp(&left.snippet.chars().count())
            .then(left.id.cmp(&right.id)),
    }
}

pub fn cited_source_type_coverage(citations: &[Citation]) -> BTreeMap<String, usize> {
    let mut coverage = BTreeMap::new();
    for citation in citations {
        *coverage.entry(citation.source_type.clone()).or_insert(0) += 1;
    }
    coverage
}

/// Indexes of every claim citing `citation_id`, in claim order.
pub fn claim_refs_for_citation(claims: &[Claim], citation_id: i64) -> Vec<u64> {
    claims
        .iter()
        .filter(|claim| claim.citation_ids.contains(&citation_id))
        .map(|claim| claim.index)
        .collect()
}

/// Citations backing `claim`, in the claim's citation order. Ids the response
/// does not carry are skipped.
pub fn claim_citations<'a>(claim: &Claim, citations: &'a [Citation]) -> Vec<&'a Citation> {
    claim
        .citation_ids
        .iter()
        .filter_map(|id| {
            citations
                .iter()
                .find(|citation| citation.id == *id)
        })
        .collect()
}
