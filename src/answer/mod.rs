mod citations;
mod claims;
mod diagnostics;
mod synthesis;
#[cfg(test)]
mod tests;

pub use citations::{
    CitationQuery, CitationSort, claim_citations, claim_refs_for_citation,
    cited_source_type_coverage, sort_and_filter_citations,
};
pub use claims::{Claim, parse_claims_from_markdown};
pub use diagnostics::{RetrievalDiagnostics, parse_retrieval_diagnostics};
pub use synthesis::{SynthesisMode, detect_synthesis_mode, reports_insufficient_evidence};
