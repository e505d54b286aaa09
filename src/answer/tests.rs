use std::collections::HashSet;

use super::*;
use crate::model::Citation;

fn citation(id: i64, source_type: &str, source_id: &str, snippet: &str) -> Citation {
    Citation {
        id,
        url: format!("u{id}"),
        source_type: source_type.to_string(),
        source_id: source_id.to_string(),
        snippet: snippet.to_string(),
    }
}

#[test]
fn parse_claims_reads_numbered_lines_with_citations() {
    let claims = parse_claims_from_markdown("1. A. [1]\n2. B. [2, 3]");

    assert_eq!(
        claims,
        vec![
            Claim {
                index: 1,
                text: "A.".to_string(),
                citation_ids: vec![1],
            },
            Claim {
                index: 2,
                text: "B.".to_string(),
                citation_ids: vec![2, 3],
            },
        ]
    );
}

#[test]
fn parse_claims_skips_headings_and_prose_without_renumbering() {
    let markdown = [
        "### Odpověď podložená Redmine zdroji (LLM)",
        "",
        "Intro paragraph without citations.",
        "  4. OAuth callback timeout affects Safari login flow. [1, 2]  ",
        "- bullet [3]",
        "7. Rollback is documented in incident runbook. [3]",
    ]
    .join("\n");

    let claims = parse_claims_from_markdown(&markdown);
    assert_eq!(claims.len(), 2);
    assert_eq!(claims[0].index, 4);
    assert_eq!(
        claims[0].text,
        "OAuth callback timeout affects Safari login flow."
    );
    assert_eq!(claims[0].citation_ids, vec![1, 2]);
    assert_eq!(claims[1].index, 7);
    assert_eq!(claims[1].citation_ids, vec![3]);
}

#[test]
fn parse_claims_keeps_duplicate_ids_in_appearance_order() {
    let claims = parse_claims_from_markdown("1. Repeated evidence. [3,1, 3]");
    assert_eq!(claims[0].citation_ids, vec![3, 1, 3]);
}

#[test]
fn parse_claims_keeps_numbers_beyond_32_bits() {
    let claims = parse_claims_from_markdown("5000000000. Large ids survive. [4294967296, 2]");
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].index, 5_000_000_000);
    assert_eq!(claims[0].citation_ids, vec![4_294_967_296, 2]);
}

#[test]
fn parse_claims_rejects_trailing_content_and_empty_brackets() {
    assert!(parse_claims_from_markdown("1. Text. [1] trailing").is_empty());
    assert!(parse_claims_from_markdown("1. Text. []").is_empty());
    assert!(parse_claims_from_markdown("1. Text. [a, b]").is_empty());
    assert!(parse_claims_from_markdown("1.Text. [1]").is_empty());
    assert!(parse_claims_from_markdown("1. Text.[1]").is_empty());
}

#[test]
fn parse_claims_drops_zero_ids_and_whole_claim_when_none_remain() {
    let claims = parse_claims_from_markdown("1. Mixed. [0, 2]\n2. Only zero. [0]");
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].citation_ids, vec![2]);
}

#[test]
fn parse_claims_handles_crlf_and_empty_input() {
    let claims = parse_claims_from_markdown("1. Windows line. [5]\r\n2. Next. [6]\r\n");
    assert_eq!(claims.len(), 2);
    assert_eq!(claims[1].citation_ids, vec![6]);
    assert!(parse_claims_from_markdown("").is_empty());
}

#[test]
fn every_parsed_claim_has_positive_citations() {
    let markdown = "1. a [1]\n2. b [0]\n3. c [2, 0, 4]\n4.  [9]\nnoise";
    for claim in parse_claims_from_markdown(markdown) {
        assert!(!claim.citation_ids.is_empty());
        assert!(claim.citation_ids.iter().all(|id| *id > 0));
        assert!(!claim.text.is_empty());
    }
}

#[test]
fn retrieval_diagnostics_parses_annotation_line() {
    let diagnostics =
        parse_retrieval_diagnostics("_Retrieval mode: hybrid; lexical=10, vector=7, fused=5_");
    assert_eq!(
        diagnostics,
        RetrievalDiagnostics {
            mode: Some("hybrid".to_string()),
            lexical: Some(10),
            vector: Some(7),
            fused: Some(5),
        }
    );
}

#[test]
fn retrieval_diagnostics_is_all_none_without_marker() {
    assert_eq!(
        parse_retrieval_diagnostics("1. Claim. [1]"),
        RetrievalDiagnostics::default()
    );
}

#[test]
fn retrieval_diagnostics_rejects_partial_counters() {
    let diagnostics = parse_retrieval_diagnostics("_Retrieval mode: hybrid; lexical=10, vector=7_");
    assert_eq!(diagnostics, RetrievalDiagnostics::default());
}

#[test]
fn retrieval_diagnostics_only_considers_first_marker_line() {
    let markdown = "retrieval mode: pending\n_Retrieval mode: lexical_only; lexical=3, vector=0, fused=3_";
    assert_eq!(
        parse_retrieval_diagnostics(markdown),
        RetrievalDiagnostics::default()
    );
}

#[test]
fn retrieval_diagnostics_accepts_case_and_spacing_variants() {
    let diagnostics =
        parse_retrieval_diagnostics("intro\nRETRIEVAL MODE:vector_only;lexical=0,vector=12,  fused=4");
    assert_eq!(diagnostics.mode.as_deref(), Some("vector_only"));
    assert_eq!(diagnostics.lexical, Some(0));
    assert_eq!(diagnostics.vector, Some(12));
    assert_eq!(diagnostics.fused, Some(4));
}

#[test]
fn synthesis_mode_prefers_llm_marker() {
    let markdown =
        "_Retrieval mode: hybrid; lexical=14, vector=9, fused=5_\n### Odpověď podložená Redmine zdroji (LLM)";
    assert_eq!(detect_synthesis_mode(markdown), SynthesisMode::Llm);
}

#[test]
fn synthesis_mode_detects_fallback_and_deterministic() {
    assert_eq!(
        detect_synthesis_mode("Byl použit BEZPEČNOSTNÍ FALLBACK.\nOdpověď podložená Redmine zdroji"),
        SynthesisMode::Fallback
    );
    assert_eq!(
        detect_synthesis_mode("LLM runtime unavailable"),
        SynthesisMode::Fallback
    );
    assert_eq!(
        detect_synthesis_mode("### Odpověď podložená Redmine zdroji"),
        SynthesisMode::Deterministic
    );
    assert_eq!(detect_synthesis_mode("plain text"), SynthesisMode::Unknown);
    assert_eq!(SynthesisMode::Deterministic.as_str(), "deterministic");
}

#[test]
fn sort_and_filter_applies_search_before_sort() {
    let citations = vec![
        citation(2, "wiki", "w1", "rollback plan"),
        citation(1, "issue", "i1", "oauth callback"),
    ];

    let result = sort_and_filter_citations(
        &citations,
        &CitationQuery {
            sort_by: CitationSort::SourceType,
            search: "  OAuth ".to_string(),
            ..CitationQuery::default()
        },
    );

    assert_eq!(result, vec![citation(1, "issue", "i1", "oauth callback")]);
}

#[test]
fn sort_and_filter_by_source_type_keeps_only_matching() {
    let citations = vec![
        citation(1, "issue", "i1", "oauth callback"),
        citation(2, "wiki", "w1", "rollback plan"),
    ];

    let query = CitationQuery {
        source_type: "wiki".to_string(),
        ..CitationQuery::default()
    };
    let once = sort_and_filter_citations(&citations, &query);
    assert_eq!(once, vec![citation(2, "wiki", "w1", "rollback plan")]);

    let twice = sort_and_filter_citations(&once, &query);
    assert_eq!(once, twice);
}

#[test]
fn sort_and_filter_respects_allow_ids_and_tie_breaks() {
    let citations = vec![
        citation(5, "wiki", "w5", "abc"),
        citation(3, "issue", "i3", "abcdef"),
        citation(4, "issue", "i4", "xyz"),
        citation(1, "wiki", "w1", "abc"),
    ];

    let by_length = sort_and_filter_citations(
        &citations,
        &CitationQuery {
            sort_by: CitationSort::SnippetLengthDesc,
            ..CitationQuery::default()
        },
    );
    let ids = by_length.iter().map(|item| item.id).collect::<Vec<i64>>();
    assert_eq!(ids, vec![3, 1, 4, 5]);

    let by_source = sort_and_filter_citations(
        &citations,
        &CitationQuery {
            sort_by: CitationSort::SourceType,
            allow_ids: Some(HashSet::from([1, 4, 5])),
            ..CitationQuery::default()
        },
    );
    let ids = by_source.iter().map(|item| item.id).collect::<Vec<i64>>();
    assert_eq!(ids, vec![4, 1, 5]);

    let by_id = sort_and_filter_citations(&citations, &CitationQuery::default());
    let ids = by_id.iter().map(|item| item.id).collect::<Vec<i64>>();
    assert_eq!(ids, vec![1, 3, 4, 5]);
    assert_eq!(citations[0].id, 5);
}

#[test]
fn coverage_and_claim_navigation() {
    let citations = vec![
        citation(1, "issue", "i1", "a"),
        citation(2, "wiki", "w1", "b"),
        citation(3, "issue", "i2", "c"),
    ];
    let coverage = cited_source_type_coverage(&citations);
    assert_eq!(coverage.get("issue"), Some(&2));
    assert_eq!(coverage.get("wiki"), Some(&1));

    let claims = parse_claims_from_markdown("1. First. [2]\n2. Second. [3, 9, 1]");
    assert_eq!(claim_refs_for_citation(&claims, 1), vec![2]);
    assert!(claim_refs_for_citation(&claims, 7).is_empty());

    let evidence = claim_citations(&claims[1], &citations);
    let ids = evidence.iter().map(|item| item.id).collect::<Vec<i64>>();
    assert_eq!(ids, vec![3, 1]);
}

#[test]
fn claim_refs_list_every_citing_claim() {
    let claims = parse_claims_from_markdown("1. First. [1, 2]\n2. Second. [2]\n3. Third. [3]");
    assert_eq!(claim_refs_for_citation(&claims, 2), vec![1, 2]);
    assert_eq!(claim_refs_for_citation(&claims, 3), vec![3]);
    assert!(claim_refs_for_citation(&claims, 4).is_empty());
}

#[test]
fn insufficient_evidence_markers_are_case_insensitive() {
    assert!(reports_insufficient_evidence("Nemám dostatek důkazů pro odpověď."));
    assert!(reports_insufficient_evidence("There is NOT ENOUGH EVIDENCE in the sources."));
    assert!(!reports_insufficient_evidence("1. Login fixed. [1]"));
}
