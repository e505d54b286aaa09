use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::answer::{
    CitationQuery, CitationSort, Claim, RetrievalDiagnostics, SynthesisMode, claim_citations,
    claim_refs_for_citation, cited_source_type_coverage, detect_synthesis_mode,
    parse_claims_from_markdown, parse_retrieval_diagnostics, reports_insufficient_evidence,
    sort_and_filter_citations,
};
use crate::cli::{AskArgs, AskCommand, AskHistoryArgs, AskRunArgs, CitationSortArg, ConnectionArgs};
use crate::client::ApiClient;
use crate::format::format_percent;
use crate::model::{AskFilters, AskRequest, AskResponse, Citation};
use crate::store::ViewStateStore;
use crate::util::{day_end, day_start, now_utc_string, parse_csv_ids, parse_leading_int};
use crate::view_state::{ASK_HISTORY, AskHistoryItem, push_history};

use super::{open_store, write_json};

const DEFAULT_TOP_K: u32 = 5;

impl From<CitationSortArg> for CitationSort {
    fn from(value: CitationSortArg) -> Self {
        match value {
            CitationSortArg::IdAsc => Self::IdAsc,
            CitationSortArg::SourceType => Self::SourceType,
            CitationSortArg::SnippetLengthDesc => Self::SnippetLengthDesc,
        }
    }
}

pub fn run(connection: &ConnectionArgs, args: AskArgs) -> Result<()> {
    let store = open_store(connection)?;

    match args.command {
        AskCommand::Run(args) => ask(connection, &store, args),
        AskCommand::History(args) => history(&store, args),
    }
}

/// Backend request for a set of form inputs. Dates are whole days: the
/// lower bound starts at midnight and the upper bound ends at 23:59:59 UTC.
fn build_ask_request(form: &AskHistoryItem) -> AskRequest {
    let top_k = parse_leading_int(&form.top_k)
        .filter(|value| *value > 0)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(DEFAULT_TOP_K);

    AskRequest {
        query: form.query.clone(),
        filters: AskFilters {
            project_ids: parse_csv_ids(&form.project_ids),
            tracker_ids: parse_csv_ids(&form.tracker_ids),
            status_ids: parse_csv_ids(&form.status_ids),
            from_date: day_start(&form.from_date),
            to_date: day_end(&form.to_date),
        },
        top_k,
    }
}

fn form_from_args(args: &AskRunArgs, history: &[AskHistoryItem]) -> Result<AskHistoryItem> {
    if let Some(replay) = args.replay {
        let Some(item) = history.get(replay) else {
            bail!(
                "ask history has {} entries; cannot replay entry {replay}",
                history.len()
            );
        };
        return Ok(AskHistoryItem {
            at: now_utc_string(),
            ..item.clone()
        });
    }

    let query = args.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        bail!("a question is required; pass --query or --replay");
    }

    Ok(AskHistoryItem {
        query: query.to_string(),
        project_ids: args.project_ids.clone(),
        tracker_ids: args.tracker_ids.clone(),
        status_ids: args.status_ids.clone(),
        top_k: args.top_k.clone(),
        from_date: args.from_date.clone(),
        to_date: args.to_date.clone(),
        at: now_utc_string(),
    })
}

#[derive(Debug, Serialize)]
struct CitationView {
    #[serde(flatten)]
    citation: Citation,
    claim_refs: Vec<u64>,
}

#[derive(Debug, Serialize)]
struct AskReport {
    request: AskRequest,
    answer_markdown: String,
    confidence: f64,
    used_chunk_ids: Vec<i64>,
    synthesis_mode: SynthesisMode,
    insufficient_evidence: bool,
    retrieval: RetrievalDiagnostics,
    claims: Vec<Claim>,
    /// Share of claims backed by at least one citation.
    claim_citation_coverage: f64,
    citations_total: usize,
    citations: Vec<CitationView>,
    source_type_coverage: BTreeMap<String, usize>,
    /// Every citation in response order, for claim evidence lookups.
    #[serde(skip)]
    evidence: Vec<Citation>,
}

fn build_report(
    request: AskRequest,
    response: AskResponse,
    query: &CitationQuery,
) -> AskReport {
    let claims = parse_claims_from_markdown(&response.answer_markdown);
    let claim_citation_coverage = if claims.is_empty() {
        0.0
    } else {
        let backed = claims
            .iter()
            .filter(|claim| !claim.citation_ids.is_empty())
            .count();
        backed as f64 / claims.len() as f64
    };
    let citations = sort_and_filter_citations(&response.citations, query)
        .into_iter()
        .map(|citation| CitationView {
            claim_refs: claim_refs_for_citation(&claims, citation.id),
            citation,
        })
        .collect();

    AskReport {
        request,
        synthesis_mode: detect_synthesis_mode(&response.answer_markdown),
        insufficient_evidence: reports_insufficient_evidence(&response.answer_markdown),
        retrieval: parse_retrieval_diagnostics(&response.answer_markdown),
        claim_citation_coverage,
        citations_total: response.citations.len(),
        source_type_coverage: cited_source_type_coverage(&response.citations),
        citations,
        claims,
        answer_markdown: response.answer_markdown,
        confidence: response.confidence,
        used_chunk_ids: response.used_chunk_ids,
        evidence: response.citations,
    }
}

fn citation_query(args: &AskRunArgs) -> CitationQuery {
    CitationQuery {
        sort_by: args.sort.into(),
        source_type: args.source_type.clone(),
        search: args.search.clone(),
        allow_ids: None,
    }
}

fn ask(connection: &ConnectionArgs, store: &ViewStateStore, args: AskRunArgs) -> Result<()> {
    let history = ASK_HISTORY.load(store);
    let form = form_from_args(&args, &history)?;
    let request = build_ask_request(&form);

    ASK_HISTORY.save(store, &push_history(&history, form))?;

    info!(
        top_k = request.top_k,
        projects = request.filters.project_ids.len(),
        "submitting question"
    );
    let client = ApiClient::new(connection)?;
    let response = client.run_ask(&request).context("failed to run ask")?;

    let mut query = citation_query(&args);
    if let Some(claim_index) = args.claim {
        let claims = parse_claims_from_markdown(&response.answer_markdown);
        let Some(claim) = claims.iter().find(|claim| claim.index == claim_index) else {
            bail!("answer has no claim {claim_index}");
        };
        query.allow_ids = Some(claim.citation_ids.iter().copied().collect::<HashSet<i64>>());
    }

    let report = build_report(request, response, &query);
    info!(
        mode = report.synthesis_mode.as_str(),
        claims = report.claims.len(),
        citations = report.citations_total,
        shown = report.citations.len(),
        "answer received"
    );
    if report.insufficient_evidence {
        warn!("answer reports insufficient evidence; widen filters or sync more sources");
    }

    if args.json {
        return write_json(&report);
    }
    write_report(&report, args.debug)
}

fn write_report(report: &AskReport, debug: bool) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "{}", report.answer_markdown.trim_end())?;
    writeln!(output)?;
    writeln!(
        output,
        "Synthesis: {}  confidence={}",
        report.synthesis_mode.as_str(),
        format_percent(report.confidence)
    )?;

    writeln!(
        output,
        "Claims: {} (citation coverage {})",
        report.claims.len(),
        format_percent(report.claim_citation_coverage)
    )?;
    for claim in &report.claims {
        let ids = claim
            .citation_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        writeln!(output, "  {}. {} [{}]", claim.index, claim.text, ids)?;
        for citation in claim_citations(claim, &report.evidence) {
            writeln!(
                output,
                "     <- {} {} {}",
                citation.source_type, citation.source_id, citation.url
            )?;
        }
    }

    writeln!(
        output,
        "Citations: {} of {}",
        report.citations.len(),
        report.citations_total
    )?;
    for view in &report.citations {
        let refs = if view.claim_refs.is_empty() {
            "-".to_string()
        } else {
            view.claim_refs
                .iter()
                .map(|index| format!("#{index}"))
                .collect::<Vec<String>>()
                .join(" ")
        };
        writeln!(
            output,
            "  [{}]\t{}\t{}\tclaims {}\t{}",
            view.citation.id, view.citation.source_type, view.citation.source_id, refs,
            view.citation.url
        )?;
        writeln!(output, "\t{}", view.citation.snippet)?;
    }

    let coverage = report
        .source_type_coverage
        .iter()
        .map(|(source_type, count)| format!("{source_type}={count}"))
        .collect::<Vec<String>>()
        .join(" ");
    writeln!(
        output,
        "Source types: {}",
        if coverage.is_empty() { "-" } else { coverage.as_str() }
    )?;

    if debug {
        let retrieval = &report.retrieval;
        writeln!(output, "Debug:")?;
        writeln!(
            output,
            "  retrieval mode={} lexical={} vector={} fused={}",
            retrieval.mode.as_deref().unwrap_or("-"),
            optional_count(retrieval.lexical),
            optional_count(retrieval.vector),
            optional_count(retrieval.fused),
        )?;
        writeln!(
            output,
            "  used_chunk_ids={:?} top_k={}",
            report.used_chunk_ids, report.request.top_k
        )?;
        writeln!(
            output,
            "  filters projects={:?} trackers={:?} statuses={:?} from={} to={}",
            report.request.filters.project_ids,
            report.request.filters.tracker_ids,
            report.request.filters.status_ids,
            report.request.filters.from_date.as_deref().unwrap_or("-"),
            report.request.filters.to_date.as_deref().unwrap_or("-"),
        )?;
    }

    output.flush()?;
    Ok(())
}

fn optional_count(value: Option<u64>) -> String {
    value.map(|count| count.to_string()).unwrap_or_else(|| "-".to_string())
}

fn history(store: &ViewStateStore, args: AskHistoryArgs) -> Result<()> {
    if args.clear {
        ASK_HISTORY.clear(store)?;
        info!(key = ASK_HISTORY.key(), "ask history cleared");
        return Ok(());
    }

    let history = ASK_HISTORY.load(store);
    if args.json {
        return write_json(&history);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "History: {}", history.len())?;
    for (index, item) in history.iter().enumerate() {
        writeln!(
            output,
            "{index}.\t{}\tprojects={} top_k={}\t{}",
            item.at, item.project_ids, item.top_k, item.query
        )?;
    }
    output.flush()?;
    Ok(())
}
