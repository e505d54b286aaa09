use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const DIAGNOSTICS_MARKER: &str = "retrieval mode:";

pub(super) const RETRIEVAL_DIAGNOSTICS_PATTERN: &str = r"(?i)Retrieval mode:\s*([a-z_]+);\s*lexical=([0-9]+),\s*vector=([0-9]+),\s*fused=([0-9]+)";

static RETRIEVAL_DIAGNOSTICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(RETRIEVAL_DIAGNOSTICS_PATTERN).expect("valid retrieval diagnostics regex")
});

/// Candidate counts reported by the retrieval stage. Either every field is
/// set or none is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalDiagnostics {
    pub mode: Option<String>,
    pub lexical: Option<u64>,
    pub vector: Option<u64>,
    pub fused: Option<u64>,
}

pub fn parse_retrieval_diagnostics(markdown: &str) -> RetrievalDiagnostics {
    markdown
        .split('\n')
        .find(|line| line.to_lowercase().contains(DIAGNOSTICS_MARKER))
        .and_then(parse_diagnostics_line)
        .unwrap_or_default()
}

fn parse_diagnostics_line(line: &str) -> Option<RetrievalDiagnostics> {
    let captures = RETRIEVAL_DIAGNOSTICS.captures(line)?;
    let counter = |group: usize| -> Option<u64> { captures.get(group)?.as_str().parse().ok() };

    Some(RetrievalDiagnostics {
        mode: Some(captures.get(1)?.as_str().to_string()),
        lexical: Some(counter(2)?),
        vector: Some(counter(3)?),
        fused: Some(counter(4)?),
    })
}
